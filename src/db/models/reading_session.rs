//! Reading-session data models.
//!
//! Sessions are produced by the text-generation flow and are read-only here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated reading text and its metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReadingSession {
    pub id: String,
    pub user_id: String,
    pub genre: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub level: String,
    pub word_count: u64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// The projection of a session that stats aggregation works from.
///
/// `word_count` is nullable because stored rows are not trusted to be well
/// formed; aggregation treats a missing count as zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub word_count: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub genre: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Parent-session fields shown next to a saved word.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub genre: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
}
