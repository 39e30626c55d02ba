//! Error types returned across the crate boundary.
//!
//! The database layer works in `anyhow::Result` internally; everything a
//! caller can observe is mapped into one of the typed errors below.

/// Errors raised by vocabulary and definition operations.
#[derive(Debug, thiserror::Error)]
pub enum LexiconError {
    #[error("'{word}' is already saved for session {session_id}")]
    Duplicate {
        user_id: String,
        session_id: String,
        word: String,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl LexiconError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, LexiconError::Duplicate { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LexiconError::NotFound(_))
    }
}

/// Failure of the external definition provider.
///
/// Cloneable so that every caller sharing one in-flight lookup receives the
/// same outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Authentication error")]
    Authentication,

    #[error("Provider returned no explanation")]
    EmptyResponse,

    #[error("Lookup was interrupted before completing")]
    Interrupted,
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

/// A malformed session record seen during aggregation. Never fatal: the
/// record contributes zero words and the issue is reported alongside the stats.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AggregationInputError {
    #[error("session {session_id} has no word count")]
    #[serde(rename_all = "camelCase")]
    MissingWordCount { session_id: String },

    #[error("session {session_id} has negative word count {value}")]
    #[serde(rename_all = "camelCase")]
    NegativeWordCount { session_id: String, value: i64 },
}

pub type Result<T, E = LexiconError> = std::result::Result<T, E>;
