use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, parse_optional_datetime, to_i64},
    models::{
        NewVocabularyEntry, SessionSummary, VocabularyEntry, VocabularyFilter, VocabularyListing,
    },
};

/// Result of the atomic create-if-absent insert.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(VocabularyEntry),
    Duplicate,
    MissingSession,
}

/// Result of the write-once definition update.
#[derive(Debug, PartialEq)]
pub enum DefinitionWrite {
    /// This call stored the definition.
    Stored,
    /// A definition was already present; it is returned unchanged.
    AlreadySet(String),
    EntryMissing,
}

fn row_to_entry(row: &Row) -> Result<VocabularyEntry> {
    let created_at: String = row.get("created_at")?;

    Ok(VocabularyEntry {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        session_id: row.get("session_id")?,
        word: row.get("word")?,
        context: row.get("context")?,
        definition: row.get("definition")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn row_to_listing(row: &Row) -> Result<VocabularyListing> {
    let session_genre: Option<String> = row.get("session_genre")?;
    let session_type: Option<String> = row.get("session_type")?;
    let session_created_at: Option<String> = row.get("session_created_at")?;

    let session = match (session_genre, session_type) {
        (Some(genre), Some(kind)) => {
            parse_optional_datetime(session_created_at, "session_created_at")?
                .map(|created_at| SessionSummary {
                    genre,
                    kind,
                    created_at,
                })
        }
        _ => None,
    };

    Ok(VocabularyListing {
        entry: row_to_entry(row)?,
        session,
    })
}

impl Database {
    /// Check-and-insert in a single DB task. The UNIQUE index makes the
    /// insert itself the uniqueness check; there is no read-then-write window.
    pub async fn create_vocabulary_entry(&self, input: NewVocabularyEntry) -> Result<CreateOutcome> {
        self.execute(move |conn| {
            let session_exists: Option<i64> = conn
                .query_row(
                    "SELECT 1 FROM reading_sessions WHERE id = ?1 AND user_id = ?2",
                    params![input.session_id, input.user_id],
                    |row| row.get(0),
                )
                .optional()?;
            if session_exists.is_none() {
                return Ok(CreateOutcome::MissingSession);
            }

            let entry = VocabularyEntry {
                id: Uuid::new_v4().to_string(),
                user_id: input.user_id,
                session_id: input.session_id,
                word: input.word,
                context: input.context,
                definition: None,
                created_at: Utc::now(),
            };

            let inserted = conn.execute(
                "INSERT INTO vocabulary (id, user_id, session_id, word, context, definition, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6)
                 ON CONFLICT (user_id, session_id, word) DO NOTHING",
                params![
                    entry.id,
                    entry.user_id,
                    entry.session_id,
                    entry.word,
                    entry.context,
                    format_datetime(&entry.created_at),
                ],
            )?;

            if inserted == 0 {
                return Ok(CreateOutcome::Duplicate);
            }
            Ok(CreateOutcome::Created(entry))
        })
        .await
    }

    /// Outer `None` when the entry does not exist for this user.
    pub async fn lookup_definition(
        &self,
        user_id: &str,
        entry_id: &str,
    ) -> Result<Option<Option<String>>> {
        let user_id = user_id.to_string();
        let entry_id = entry_id.to_string();
        self.execute(move |conn| {
            let definition = conn
                .query_row(
                    "SELECT definition FROM vocabulary WHERE id = ?1 AND user_id = ?2",
                    params![entry_id, user_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;
            Ok(definition)
        })
        .await
    }

    /// Write-once: only a NULL definition is ever replaced.
    pub async fn fill_definition(
        &self,
        user_id: &str,
        entry_id: &str,
        definition: &str,
    ) -> Result<DefinitionWrite> {
        let user_id = user_id.to_string();
        let entry_id = entry_id.to_string();
        let definition = definition.to_string();
        self.execute(move |conn| {
            let updated = conn.execute(
                "UPDATE vocabulary
                 SET definition = ?1
                 WHERE id = ?2 AND user_id = ?3 AND definition IS NULL",
                params![definition, entry_id, user_id],
            )?;
            if updated == 1 {
                return Ok(DefinitionWrite::Stored);
            }

            let existing = conn
                .query_row(
                    "SELECT definition FROM vocabulary WHERE id = ?1 AND user_id = ?2",
                    params![entry_id, user_id],
                    |row| row.get::<_, Option<String>>(0),
                )
                .optional()?;

            match existing {
                Some(Some(stored)) => Ok(DefinitionWrite::AlreadySet(stored)),
                Some(None) => Err(anyhow!(
                    "definition for entry {entry_id} was neither written nor present"
                )),
                None => Ok(DefinitionWrite::EntryMissing),
            }
        })
        .await
    }

    /// Returns `false` when nothing was deleted.
    pub async fn delete_vocabulary_entry(&self, entry_id: &str) -> Result<bool> {
        let entry_id = entry_id.to_string();
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM vocabulary WHERE id = ?1", params![entry_id])?;
            Ok(rows_affected > 0)
        })
        .await
    }

    /// Newest first, joined with the parent session for display grouping.
    pub async fn list_vocabulary(
        &self,
        user_id: &str,
        filter: VocabularyFilter,
    ) -> Result<Vec<VocabularyListing>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let limit = match filter.limit {
                Some(limit) => to_i64(limit as u64)?,
                None => -1,
            };
            let offset = to_i64(filter.offset.unwrap_or(0) as u64)?;

            let mut stmt = conn.prepare(
                "SELECT v.id, v.user_id, v.session_id, v.word, v.context, v.definition, v.created_at,
                        s.genre AS session_genre,
                        s.type AS session_type,
                        s.created_at AS session_created_at
                 FROM vocabulary v
                 LEFT JOIN reading_sessions s ON s.id = v.session_id
                 WHERE v.user_id = ?1 AND (?2 IS NULL OR v.session_id = ?2)
                 ORDER BY v.created_at DESC, v.rowid DESC
                 LIMIT ?3 OFFSET ?4",
            )?;

            let mut rows = stmt.query(params![user_id, filter.session_id, limit, offset])?;
            let mut listings = Vec::new();
            while let Some(row) = rows.next()? {
                listings.push(row_to_listing(row)?);
            }

            Ok(listings)
        })
        .await
    }

    pub async fn saved_words_for_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<String>> {
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT word FROM vocabulary
                 WHERE user_id = ?1 AND session_id = ?2
                 ORDER BY created_at ASC, rowid ASC",
            )?;
            let words = stmt
                .query_map(params![user_id, session_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(words)
        })
        .await
    }
}
