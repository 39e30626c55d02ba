use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use lectern::{
    Database, DefinitionProvider, Lectern, ProviderError, ReadingSession, Resolution, Settings,
    DEFINITION_UNAVAILABLE,
};

/// Fails the first `failures` calls, then explains every word the same way.
struct CountingProvider {
    calls: AtomicUsize,
    failures: usize,
}

impl CountingProvider {
    fn new(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failures,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DefinitionProvider for CountingProvider {
    async fn explain(&self, word: &str, context: &str) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(ProviderError::Network("connection reset".into()));
        }
        Ok(format!("{word} (as in \"{context}\")"))
    }
}

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn reading_session(id: &str, word_count: u64, created_at: chrono::DateTime<Utc>) -> ReadingSession {
    ReadingSession {
        id: id.into(),
        user_id: "reader".into(),
        genre: "travel".into(),
        kind: "essay".into(),
        level: "B1".into(),
        word_count,
        content: "We walked along the bank, then crossed the old bridge to the bank.".into(),
        created_at,
    }
}

async fn lectern(provider: Arc<CountingProvider>) -> Lectern {
    let db = Database::open_in_memory().unwrap();
    Lectern::with_parts(db, provider, &Settings::default())
}

#[tokio::test]
async fn save_then_resolve_definition_once() {
    let provider = CountingProvider::new(0);
    let app = lectern(provider.clone()).await;
    app.database()
        .insert_reading_session(&reading_session("s1", 14, now()))
        .await
        .unwrap();

    let mut view = app.reading_view("reader", "s1").await.unwrap();
    // Token 12 is the second "bank."; context still comes from the first.
    let entry = view.save(app.vocabulary(), 12).await.unwrap();
    assert_eq!(entry.word, "bank");
    assert_eq!(
        entry.context,
        "We walked along the bank, then crossed the old bridge"
    );

    let list = app.vocabulary_list("reader").await.unwrap();
    let first = list
        .resolve_definition(app.definitions(), &entry.id)
        .await
        .unwrap();
    assert!(matches!(first, Resolution::Fetched(_)));

    let second = list
        .resolve_definition(app.definitions(), &entry.id)
        .await
        .unwrap();
    assert!(matches!(second, Resolution::Cached(_)));
    assert_eq!(provider.calls(), 1);

    let listed = app.vocabulary().list("reader", None).await.unwrap();
    assert_eq!(listed[0].entry.definition.as_deref(), Some(first.text()));
    assert_eq!(listed[0].session.as_ref().unwrap().genre, "travel");
}

#[tokio::test]
async fn failed_lookup_is_retried_on_next_resolve() {
    let provider = CountingProvider::new(1);
    let app = lectern(provider.clone()).await;
    app.database()
        .insert_reading_session(&reading_session("s1", 14, now()))
        .await
        .unwrap();
    let mut entry = app
        .vocabulary()
        .add("reader", "s1", "bridge", "the old bridge")
        .await
        .unwrap();

    let failed = app.definitions().resolve(&mut entry).await.unwrap();
    assert_eq!(failed.text(), DEFINITION_UNAVAILABLE);
    assert!(entry.definition.is_none());

    let retried = app.definitions().resolve(&mut entry).await.unwrap();
    assert!(matches!(retried, Resolution::Fetched(_)));
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn duplicate_save_leaves_store_unchanged() {
    let app = lectern(CountingProvider::new(0)).await;
    app.database()
        .insert_reading_session(&reading_session("s1", 14, now()))
        .await
        .unwrap();

    app.vocabulary().add("reader", "s1", "bank", "").await.unwrap();
    let err = app
        .vocabulary()
        .add("reader", "s1", "bank", "")
        .await
        .unwrap_err();
    assert!(err.is_duplicate());
    assert_eq!(app.vocabulary().list("reader", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn weekly_stats_from_stored_sessions() {
    let app = lectern(CountingProvider::new(0)).await;
    let db = app.database();
    let two_days_ago = now() - Duration::days(2);
    db.insert_reading_session(&reading_session("a", 120, two_days_ago))
        .await
        .unwrap();
    db.insert_reading_session(&reading_session("b", 80, two_days_ago + Duration::hours(3)))
        .await
        .unwrap();
    db.insert_reading_session(&reading_session("c", 60, now() - Duration::hours(1)))
        .await
        .unwrap();
    // Before the window: excluded from totals as well as the series.
    db.insert_reading_session(&reading_session("old", 500, now() - Duration::days(9)))
        .await
        .unwrap();

    let stats = app.reading_stats("reader", now()).await.unwrap();
    assert_eq!(stats.daily.len(), 7);
    assert_eq!(stats.total_words, 260);
    assert_eq!(stats.sessions_count, 3);
    assert_eq!(stats.average_words, 87);
    assert_eq!(stats.daily[4].words_read, 200);
    assert_eq!(stats.daily[6].words_read, 60);
    assert_eq!(stats.current_streak, 1);
    assert!(stats.issues.is_empty());

    let nobody = app.reading_stats("someone-else", now()).await.unwrap();
    assert_eq!(nobody.daily.len(), 7);
    assert!(nobody.daily.iter().all(|day| day.words_read == 0));
}

#[tokio::test]
async fn removing_an_entry_is_final() {
    let app = lectern(CountingProvider::new(0)).await;
    app.database()
        .insert_reading_session(&reading_session("s1", 14, now()))
        .await
        .unwrap();
    let entry = app.vocabulary().add("reader", "s1", "old", "").await.unwrap();

    let list = app.vocabulary_list("reader").await.unwrap();
    list.remove(&entry.id).await.unwrap();
    assert!(list.is_empty());
    assert!(app.vocabulary().remove(&entry.id).await.unwrap_err().is_not_found());
}
