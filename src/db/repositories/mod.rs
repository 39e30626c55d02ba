pub mod reading_sessions;
pub mod vocabulary;

pub use vocabulary::{CreateOutcome, DefinitionWrite};
