pub mod db;
pub mod definitions;
pub mod error;
pub mod reading;
pub mod settings;
pub mod stats;
pub mod text;
pub mod utils;
pub mod vocabulary;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;

pub use db::{
    Database, NewVocabularyEntry, ReadingSession, SessionRecord, SessionSummary, VocabularyEntry,
    VocabularyFilter, VocabularyListing,
};
pub use definitions::{
    ChatDefinitionProvider, DefinitionCache, DefinitionProvider, Resolution,
    DEFINITION_UNAVAILABLE,
};
pub use error::{AggregationInputError, LexiconError, ProviderError};
pub use reading::ReadingView;
pub use settings::{Settings, SettingsStore};
pub use stats::{DailyActivity, ReadingStats, SessionSource, StatsAggregator};
pub use vocabulary::{VocabularyList, VocabularyPersistence, VocabularyStore};

/// Everything a request handler needs, wired from one [`Settings`].
#[derive(Clone)]
pub struct Lectern {
    db: Database,
    vocabulary: VocabularyStore,
    definitions: Arc<DefinitionCache>,
    sessions: Arc<dyn SessionSource>,
    stats: StatsAggregator,
    context_radius: usize,
}

impl Lectern {
    /// Open the database at `settings.database_path` and build the HTTP
    /// definition provider.
    pub fn open(settings: &Settings) -> anyhow::Result<Self> {
        utils::logging::init();
        let db = Database::new(settings.database_path.clone())?;
        let provider = ChatDefinitionProvider::new(&settings.provider)?;
        info!(
            "Lectern ready (provider model {}, stats window {} days)",
            settings.provider.model, settings.stats.window_days
        );
        Ok(Self::with_parts(db, Arc::new(provider), settings))
    }

    /// Assemble from an existing database and provider.
    pub fn with_parts(
        db: Database,
        provider: Arc<dyn DefinitionProvider>,
        settings: &Settings,
    ) -> Self {
        let persistence: Arc<dyn VocabularyPersistence> = Arc::new(db.clone());
        Self {
            vocabulary: VocabularyStore::new(Arc::clone(&persistence)),
            definitions: Arc::new(DefinitionCache::new(persistence, provider)),
            sessions: Arc::new(db.clone()),
            stats: StatsAggregator::with_offset_minutes(
                settings.stats.window_days,
                settings.stats.utc_offset_minutes,
            ),
            context_radius: settings.context_radius,
            db,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn vocabulary(&self) -> &VocabularyStore {
        &self.vocabulary
    }

    pub fn definitions(&self) -> &DefinitionCache {
        &self.definitions
    }

    pub async fn reading_view(&self, user_id: &str, session_id: &str) -> error::Result<ReadingView> {
        ReadingView::load(
            &self.db,
            &self.vocabulary,
            user_id,
            session_id,
            self.context_radius,
        )
        .await
    }

    pub async fn vocabulary_list(&self, user_id: &str) -> error::Result<VocabularyList> {
        VocabularyList::load(self.vocabulary.clone(), user_id).await
    }

    /// Stats over the configured trailing window ending at `now`.
    pub async fn reading_stats(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> error::Result<ReadingStats> {
        let from = self.stats.window_start(now);
        let sessions = self.sessions.sessions_for_user(user_id, from, now).await?;
        Ok(self.stats.aggregate(&sessions, now))
    }
}
