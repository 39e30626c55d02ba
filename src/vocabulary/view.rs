//! The caller's local copy of a user's vocabulary.
//!
//! Adds and removes are applied here before the backing store confirms them
//! and are rolled back if it does not.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use crate::db::{SessionSummary, VocabularyEntry, VocabularyListing};
use crate::definitions::{DefinitionCache, Resolution};
use crate::error::{LexiconError, Result};
use crate::text::normalize_word;

use super::VocabularyStore;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

const PENDING_PREFIX: &str = "pending-";

#[derive(Clone)]
pub struct VocabularyList {
    user_id: String,
    store: VocabularyStore,
    items: Arc<RwLock<Vec<VocabularyListing>>>,
}

impl VocabularyList {
    /// Fetch the user's full collection, newest first.
    pub async fn load(store: VocabularyStore, user_id: &str) -> Result<Self> {
        let items = store.list(user_id, None).await?;
        Ok(Self {
            user_id: user_id.to_string(),
            store,
            items: Arc::new(RwLock::new(items)),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn snapshot(&self) -> Vec<VocabularyListing> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Pending entries carry an id that starts with `pending-` until the
    /// store assigns the real one.
    pub fn is_pending(entry: &VocabularyEntry) -> bool {
        entry.id.starts_with(PENDING_PREFIX)
    }

    /// Show the word immediately, then persist it. On any persistence error
    /// the provisional row is removed again and the error is returned.
    pub async fn add(
        &self,
        session_id: &str,
        word: &str,
        context: &str,
        session: Option<SessionSummary>,
    ) -> Result<VocabularyEntry> {
        let provisional_id = format!("{PENDING_PREFIX}{}", Uuid::new_v4());
        let provisional = VocabularyListing {
            entry: VocabularyEntry {
                id: provisional_id.clone(),
                user_id: self.user_id.clone(),
                session_id: session_id.to_string(),
                word: normalize_word(word.trim()).to_string(),
                context: context.to_string(),
                definition: None,
                created_at: Utc::now(),
            },
            session,
        };
        self.write().insert(0, provisional);

        match self
            .store
            .add(&self.user_id, session_id, word, context)
            .await
        {
            Ok(entry) => {
                let mut items = self.write();
                if let Some(item) = items.iter_mut().find(|i| i.entry.id == provisional_id) {
                    item.entry = entry.clone();
                }
                Ok(entry)
            }
            Err(err) => {
                self.write().retain(|i| i.entry.id != provisional_id);
                log_warn!("Rolled back optimistic add of '{word}': {err}");
                Err(err)
            }
        }
    }

    /// Remove locally, then from the store. A failed delete puts the entry
    /// back at its original position.
    pub async fn remove(&self, entry_id: &str) -> Result<()> {
        let removed = {
            let mut items = self.write();
            items
                .iter()
                .position(|i| i.entry.id == entry_id)
                .map(|position| (position, items.remove(position)))
        };

        let Some((position, listing)) = removed else {
            return Err(LexiconError::NotFound(format!("vocabulary entry {entry_id}")));
        };

        if let Err(err) = self.store.remove(entry_id).await {
            let mut items = self.write();
            let position = position.min(items.len());
            items.insert(position, listing);
            log_warn!("Restored entry {entry_id} after failed delete: {err}");
            return Err(err);
        }
        Ok(())
    }

    /// Resolve the definition of a listed entry and keep the local copy in
    /// step, so that later resolves for it are cache hits.
    pub async fn resolve_definition(
        &self,
        cache: &DefinitionCache,
        entry_id: &str,
    ) -> Result<Resolution> {
        let mut entry = self
            .read()
            .iter()
            .find(|i| i.entry.id == entry_id)
            .map(|i| i.entry.clone())
            .ok_or_else(|| LexiconError::NotFound(format!("vocabulary entry {entry_id}")))?;

        let resolution = cache.resolve(&mut entry).await?;
        if let Some(definition) = entry.definition {
            self.apply_definition(entry_id, &definition);
        }
        Ok(resolution)
    }

    /// Record a definition in the local copy. Write-once, like the store.
    pub fn apply_definition(&self, entry_id: &str, definition: &str) {
        let mut items = self.write();
        if let Some(item) = items.iter_mut().find(|i| i.entry.id == entry_id) {
            if item.entry.definition.is_none() {
                item.entry.definition = Some(definition.to_string());
                log_info!("Cached definition locally for entry {entry_id}");
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<VocabularyListing>> {
        self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<VocabularyListing>> {
        self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
