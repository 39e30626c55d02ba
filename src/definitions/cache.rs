use std::sync::Arc;

use anyhow::anyhow;

use crate::db::VocabularyEntry;
use crate::error::{LexiconError, ProviderError, Result};
use crate::vocabulary::VocabularyPersistence;

use super::provider::DefinitionProvider;
use super::single_flight::{FlightOutcome, SingleFlight};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Text shown in place of a definition when the provider could not supply one.
pub const DEFINITION_UNAVAILABLE: &str = "Definition unavailable";

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Already stored; no provider call was made.
    Cached(String),
    /// Obtained from the provider by this resolve (or the flight it joined)
    /// and stored.
    Fetched(String),
    /// The provider failed. Nothing was stored; resolving again retries.
    Unavailable(ProviderError),
}

impl Resolution {
    pub fn text(&self) -> &str {
        match self {
            Resolution::Cached(text) | Resolution::Fetched(text) => text,
            Resolution::Unavailable(_) => DEFINITION_UNAVAILABLE,
        }
    }

    pub fn definition(&self) -> Option<&str> {
        match self {
            Resolution::Cached(text) | Resolution::Fetched(text) => Some(text),
            Resolution::Unavailable(_) => None,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, Resolution::Unavailable(_))
    }
}

/// Cloneable stand-in for `LexiconError` so a flight's result can be shared.
#[derive(Debug, Clone)]
enum FlightError {
    NotFound(String),
    Storage(String),
}

impl From<LexiconError> for FlightError {
    fn from(err: LexiconError) -> Self {
        match err {
            LexiconError::NotFound(what) => FlightError::NotFound(what),
            other => FlightError::Storage(other.to_string()),
        }
    }
}

impl From<FlightError> for LexiconError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::NotFound(what) => LexiconError::NotFound(what),
            FlightError::Storage(message) => LexiconError::Storage(anyhow!(message)),
        }
    }
}

type FlightKey = (String, String);
type FlightResult = std::result::Result<Resolution, FlightError>;

/// Resolves definitions for vocabulary entries, calling the provider at most
/// once successfully per entry.
pub struct DefinitionCache {
    persistence: Arc<dyn VocabularyPersistence>,
    provider: Arc<dyn DefinitionProvider>,
    flights: SingleFlight<FlightKey, FlightResult>,
}

impl DefinitionCache {
    pub fn new(
        persistence: Arc<dyn VocabularyPersistence>,
        provider: Arc<dyn DefinitionProvider>,
    ) -> Self {
        Self {
            persistence,
            provider,
            flights: SingleFlight::new(),
        }
    }

    /// Definition for `entry`. On success `entry.definition` is filled in, so
    /// resolving the same value again never reaches the provider.
    pub async fn resolve(&self, entry: &mut VocabularyEntry) -> Result<Resolution> {
        if let Some(definition) = &entry.definition {
            log_debug!("Definition cache hit for entry {}", entry.id);
            return Ok(Resolution::Cached(definition.clone()));
        }

        let key = (entry.user_id.clone(), entry.id.clone());
        let outcome = self
            .flights
            .run(key, || self.fetch_and_store(entry))
            .await;

        let resolution = match outcome {
            FlightOutcome::Led(result) => result?,
            FlightOutcome::Joined(result) => {
                log_debug!("Joined in-flight definition lookup for entry {}", entry.id);
                result?
            }
            FlightOutcome::Abandoned => {
                log_warn!("Definition lookup for entry {} was abandoned", entry.id);
                Resolution::Unavailable(ProviderError::Interrupted)
            }
        };

        if let Some(definition) = resolution.definition() {
            entry.definition = Some(definition.to_string());
        }
        Ok(resolution)
    }

    /// Explain a word that has not been saved. Nothing is cached.
    pub async fn preview(&self, word: &str, context: &str) -> Resolution {
        match self.provider.explain(word, context).await {
            Ok(text) => Resolution::Fetched(text),
            Err(err) => {
                log_warn!("Definition preview for '{word}' failed: {err}");
                Resolution::Unavailable(err)
            }
        }
    }

    async fn fetch_and_store(&self, entry: &VocabularyEntry) -> FlightResult {
        // Another request may have filled the entry since the caller loaded it.
        if let Some(stored) = self
            .persistence
            .find_definition(&entry.user_id, &entry.id)
            .await?
        {
            return Ok(Resolution::Cached(stored));
        }

        let explanation = match self.provider.explain(&entry.word, &entry.context).await {
            Ok(text) => text,
            Err(err) => {
                log_warn!(
                    "Definition provider failed for '{}' (entry {}): {err}",
                    entry.word,
                    entry.id
                );
                return Ok(Resolution::Unavailable(err));
            }
        };

        let stored = self
            .persistence
            .update_definition_if_null(&entry.user_id, &entry.id, &explanation)
            .await?;
        log_info!("Stored definition for '{}' (entry {})", entry.word, entry.id);
        Ok(Resolution::Fetched(stored))
    }
}
