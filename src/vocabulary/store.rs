use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::db::{
    repositories::{CreateOutcome, DefinitionWrite},
    Database, NewVocabularyEntry, VocabularyEntry, VocabularyFilter, VocabularyListing,
};
use crate::error::{LexiconError, Result};
use crate::text::normalize_word;

/// Backing-store capability the vocabulary core is written against.
#[async_trait]
pub trait VocabularyPersistence: Send + Sync {
    /// Atomic check-and-insert keyed on `(user_id, session_id, word)`.
    async fn create_if_absent(&self, input: NewVocabularyEntry) -> Result<VocabularyEntry>;

    /// The stored definition, `None` while it has not been filled.
    async fn find_definition(&self, user_id: &str, entry_id: &str) -> Result<Option<String>>;

    /// Store `definition` unless one is already present. Returns whichever
    /// definition the entry holds afterwards.
    async fn update_definition_if_null(
        &self,
        user_id: &str,
        entry_id: &str,
        definition: &str,
    ) -> Result<String>;

    async fn delete_by_id(&self, entry_id: &str) -> Result<()>;

    async fn list_by_user(
        &self,
        user_id: &str,
        filter: VocabularyFilter,
    ) -> Result<Vec<VocabularyListing>>;

    async fn words_for_session(&self, user_id: &str, session_id: &str) -> Result<Vec<String>>;
}

#[async_trait]
impl VocabularyPersistence for Database {
    async fn create_if_absent(&self, input: NewVocabularyEntry) -> Result<VocabularyEntry> {
        let (user_id, session_id, word) = (
            input.user_id.clone(),
            input.session_id.clone(),
            input.word.clone(),
        );
        match self.create_vocabulary_entry(input).await? {
            CreateOutcome::Created(entry) => Ok(entry),
            CreateOutcome::Duplicate => Err(LexiconError::Duplicate {
                user_id,
                session_id,
                word,
            }),
            CreateOutcome::MissingSession => Err(LexiconError::NotFound(format!(
                "reading session {session_id}"
            ))),
        }
    }

    async fn find_definition(&self, user_id: &str, entry_id: &str) -> Result<Option<String>> {
        self.lookup_definition(user_id, entry_id)
            .await?
            .ok_or_else(|| LexiconError::NotFound(format!("vocabulary entry {entry_id}")))
    }

    async fn update_definition_if_null(
        &self,
        user_id: &str,
        entry_id: &str,
        definition: &str,
    ) -> Result<String> {
        match self.fill_definition(user_id, entry_id, definition).await? {
            DefinitionWrite::Stored => Ok(definition.to_string()),
            DefinitionWrite::AlreadySet(existing) => Ok(existing),
            DefinitionWrite::EntryMissing => Err(LexiconError::NotFound(format!(
                "vocabulary entry {entry_id}"
            ))),
        }
    }

    async fn delete_by_id(&self, entry_id: &str) -> Result<()> {
        if self.delete_vocabulary_entry(entry_id).await? {
            Ok(())
        } else {
            Err(LexiconError::NotFound(format!("vocabulary entry {entry_id}")))
        }
    }

    async fn list_by_user(
        &self,
        user_id: &str,
        filter: VocabularyFilter,
    ) -> Result<Vec<VocabularyListing>> {
        Ok(self.list_vocabulary(user_id, filter).await?)
    }

    async fn words_for_session(&self, user_id: &str, session_id: &str) -> Result<Vec<String>> {
        Ok(self.saved_words_for_session(user_id, session_id).await?)
    }
}

/// Owns the saved-word collection and its no-duplicate rule.
#[derive(Clone)]
pub struct VocabularyStore {
    backend: Arc<dyn VocabularyPersistence>,
}

impl VocabularyStore {
    pub fn new(backend: Arc<dyn VocabularyPersistence>) -> Self {
        Self { backend }
    }

    /// Save `word` for a reading session. The word is normalized first; a
    /// second add of the same normalized word returns `Duplicate` and leaves
    /// the collection untouched.
    pub async fn add(
        &self,
        user_id: &str,
        session_id: &str,
        word: &str,
        context: &str,
    ) -> Result<VocabularyEntry> {
        let normalized = normalize_word(word.trim());
        if normalized.is_empty() {
            return Err(LexiconError::InvalidInput(format!(
                "'{word}' has no characters left after normalization"
            )));
        }

        let entry = self
            .backend
            .create_if_absent(NewVocabularyEntry {
                user_id: user_id.to_string(),
                session_id: session_id.to_string(),
                word: normalized.to_string(),
                context: context.to_string(),
            })
            .await?;

        info!(
            "Saved '{}' for user {} in session {}",
            entry.word, entry.user_id, entry.session_id
        );
        Ok(entry)
    }

    /// Hard delete; there is no undo.
    pub async fn remove(&self, entry_id: &str) -> Result<()> {
        self.backend.delete_by_id(entry_id).await?;
        info!("Removed vocabulary entry {entry_id}");
        Ok(())
    }

    /// Newest-created first.
    pub async fn list(
        &self,
        user_id: &str,
        filter: Option<VocabularyFilter>,
    ) -> Result<Vec<VocabularyListing>> {
        self.backend
            .list_by_user(user_id, filter.unwrap_or_default())
            .await
    }

    pub async fn saved_words(&self, user_id: &str, session_id: &str) -> Result<Vec<String>> {
        self.backend.words_for_session(user_id, session_id).await
    }
}
