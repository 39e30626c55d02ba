use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::{format_datetime, parse_datetime, to_i64, to_u64},
    models::{ReadingSession, SessionRecord},
};

fn row_to_reading_session(row: &Row) -> Result<ReadingSession> {
    let created_at: String = row.get("created_at")?;
    let word_count: Option<i64> = row.get("word_count")?;

    Ok(ReadingSession {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        genre: row.get("genre")?,
        kind: row.get("type")?,
        level: row.get("level")?,
        word_count: to_u64(word_count.unwrap_or(0), "word_count")?,
        content: row.get("content")?,
        created_at: parse_datetime(&created_at, "created_at")?,
    })
}

fn row_to_session_record(row: &Row) -> Result<SessionRecord> {
    let created_at: String = row.get("created_at")?;

    Ok(SessionRecord {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        word_count: row.get("word_count")?,
        created_at: parse_datetime(&created_at, "created_at")?,
        genre: row.get("genre")?,
        kind: row.get("type")?,
    })
}

impl Database {
    pub async fn insert_reading_session(&self, session: &ReadingSession) -> Result<()> {
        let record = session.clone();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO reading_sessions (id, user_id, genre, type, level, word_count, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    record.user_id,
                    record.genre,
                    record.kind,
                    record.level,
                    to_i64(record.word_count)?,
                    record.content,
                    format_datetime(&record.created_at),
                ],
            )?;
            Ok(())
        })
        .await
    }

    /// Scoped to the owner: another user's session id reads as absent.
    pub async fn get_reading_session(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<ReadingSession>> {
        let user_id = user_id.to_string();
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, genre, type, level, word_count, content, created_at
                 FROM reading_sessions
                 WHERE id = ?1 AND user_id = ?2",
            )?;

            let session = stmt
                .query_row(params![session_id, user_id], |row| {
                    Ok(row_to_reading_session(row))
                })
                .optional()?
                .transpose()?;

            Ok(session)
        })
        .await
    }

    /// Sessions created in `[from, to)`, newest first.
    pub async fn list_session_records(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>> {
        let user_id = user_id.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, word_count, created_at, genre, type
                 FROM reading_sessions
                 WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
                 ORDER BY created_at DESC",
            )?;

            let mut rows = stmt.query(params![
                user_id,
                format_datetime(&from),
                format_datetime(&to),
            ])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_session_record(row)?);
            }

            Ok(sessions)
        })
        .await
    }
}
