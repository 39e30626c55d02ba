//! Vocabulary data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SessionSummary;

/// A saved word. Unique on `(user_id, session_id, word)`; `definition` is
/// written at most once.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    pub id: String,
    pub user_id: String,
    pub session_id: String,
    pub word: String,
    pub context: String,
    pub definition: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for `VocabularyStore::add`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewVocabularyEntry {
    pub user_id: String,
    pub session_id: String,
    pub word: String,
    pub context: String,
}

/// An entry joined with its parent session at read time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyListing {
    #[serde(flatten)]
    pub entry: VocabularyEntry,
    pub session: Option<SessionSummary>,
}

/// Narrows `VocabularyStore::list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyFilter {
    pub session_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl VocabularyFilter {
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }
}
