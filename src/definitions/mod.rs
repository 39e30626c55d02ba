//! Lazily resolved, permanently cached word definitions.

pub mod cache;
pub mod provider;
pub mod single_flight;

pub use cache::{DefinitionCache, Resolution, DEFINITION_UNAVAILABLE};
pub use provider::{ChatDefinitionProvider, DefinitionProvider};
pub use single_flight::{FlightOutcome, SingleFlight};
