//! The per-user saved-word collection.

pub mod store;
pub mod view;

pub use store::{VocabularyPersistence, VocabularyStore};
pub use view::VocabularyList;
