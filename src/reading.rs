//! One reading session as the reader sees it: tokenized text plus the words
//! already saved from it.

use std::collections::HashSet;

use crate::db::{Database, NewVocabularyEntry, ReadingSession, VocabularyEntry};
use crate::error::{LexiconError, Result};
use crate::text::{extract_context, normalize_word, tokenize, Token};
use crate::vocabulary::VocabularyStore;

pub struct ReadingView {
    session: ReadingSession,
    tokens: Vec<Token>,
    saved: HashSet<String>,
    context_radius: usize,
}

impl ReadingView {
    pub fn new(
        session: ReadingSession,
        saved_words: impl IntoIterator<Item = String>,
        context_radius: usize,
    ) -> Self {
        let tokens = tokenize(&session.content);
        Self {
            session,
            tokens,
            saved: saved_words.into_iter().collect(),
            context_radius,
        }
    }

    /// Load a session owned by `user_id` along with its saved words.
    pub async fn load(
        db: &Database,
        store: &VocabularyStore,
        user_id: &str,
        session_id: &str,
        context_radius: usize,
    ) -> Result<Self> {
        let session = db
            .get_reading_session(user_id, session_id)
            .await?
            .ok_or_else(|| LexiconError::NotFound(format!("reading session {session_id}")))?;
        let saved = store.saved_words(user_id, session_id).await?;
        Ok(Self::new(session, saved, context_radius))
    }

    pub fn session(&self) -> &ReadingSession {
        &self.session
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The token at `index`, if it has a word in it.
    pub fn select(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index).filter(|token| token.is_selectable())
    }

    pub fn is_saved(&self, word: &str) -> bool {
        self.saved.contains(normalize_word(word))
    }

    /// Surrounding text for `word`, taken from its first occurrence.
    pub fn context_for(&self, word: &str) -> String {
        extract_context(&self.tokens, normalize_word(word), self.context_radius)
    }

    pub fn add_request(&self, index: usize) -> Option<NewVocabularyEntry> {
        let token = self.select(index)?;
        Some(NewVocabularyEntry {
            user_id: self.session.user_id.clone(),
            session_id: self.session.id.clone(),
            word: token.normalized.clone(),
            context: self.context_for(&token.normalized),
        })
    }

    /// Save the word at `index` and mark it saved in this view.
    pub async fn save(&mut self, store: &VocabularyStore, index: usize) -> Result<VocabularyEntry> {
        let request = self.add_request(index).ok_or_else(|| {
            LexiconError::InvalidInput(format!("token {index} has no word to save"))
        })?;
        let entry = store
            .add(
                &request.user_id,
                &request.session_id,
                &request.word,
                &request.context,
            )
            .await?;
        self.saved.insert(entry.word.clone());
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn session() -> ReadingSession {
        ReadingSession {
            id: "s1".into(),
            user_id: "u1".into(),
            genre: "nature".into(),
            kind: "story".into(),
            level: "A2".into(),
            word_count: 9,
            content: "The quick brown fox jumps over the lazy dog.".into(),
            created_at: Utc.with_ymd_and_hms(2026, 10, 16, 6, 0, 0).unwrap(),
        }
    }

    #[test]
    fn add_request_uses_normalized_word_and_context() {
        let view = ReadingView::new(session(), Vec::new(), 2);
        let request = view.add_request(8).unwrap();
        assert_eq!(request.word, "dog");
        assert_eq!(request.context, "the lazy dog.");
        assert_eq!(request.session_id, "s1");
    }

    #[test]
    fn saved_state_ignores_punctuation() {
        let view = ReadingView::new(session(), vec!["dog".to_string()], 5);
        assert!(view.is_saved("dog."));
        assert!(!view.is_saved("fox"));
    }

    #[test]
    fn out_of_range_selection_is_none() {
        let view = ReadingView::new(session(), Vec::new(), 5);
        assert!(view.select(42).is_none());
        assert!(view.add_request(42).is_none());
    }

    #[tokio::test]
    async fn load_and_save_round_trip_through_store() {
        let db = Database::open_in_memory().unwrap();
        db.insert_reading_session(&session()).await.unwrap();
        let store = VocabularyStore::new(Arc::new(db.clone()));

        let mut view = ReadingView::load(&db, &store, "u1", "s1", 2).await.unwrap();
        let entry = view.save(&store, 3).await.unwrap();
        assert_eq!(entry.word, "fox");
        assert_eq!(entry.context, "quick brown fox jumps over");
        assert!(view.is_saved("fox"));

        assert!(view.save(&store, 3).await.unwrap_err().is_duplicate());

        let reloaded = ReadingView::load(&db, &store, "u1", "s1", 2).await.unwrap();
        assert!(reloaded.is_saved("fox"));
    }

    #[tokio::test]
    async fn other_users_session_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        db.insert_reading_session(&session()).await.unwrap();
        let store = VocabularyStore::new(Arc::new(db.clone()));

        let err = ReadingView::load(&db, &store, "u2", "s1", 5).await.err().unwrap();
        assert!(err.is_not_found());
    }
}
