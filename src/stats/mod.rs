//! Reading-history aggregation: summary counters and a dense daily series.

mod types;

pub use types::{DailyActivity, ReadingStats};

use async_trait::async_trait;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

use crate::db::{Database, SessionRecord};
use crate::error::{AggregationInputError, Result};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
/// Longer windows are clamped to this many days.
pub const MAX_WINDOW_DAYS: u32 = 366;

/// Read-only source of a user's reading sessions.
#[async_trait]
pub trait SessionSource: Send + Sync {
    /// Sessions created in `[from, to)`, newest first.
    async fn sessions_for_user(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>>;
}

#[async_trait]
impl SessionSource for Database {
    async fn sessions_for_user(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<SessionRecord>> {
        Ok(self.list_session_records(user_id, from, to).await?)
    }
}

/// Reduces session records to [`ReadingStats`] for a fixed `now` and
/// reference timezone. Filtering by date is the caller's job.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator {
    window_days: u32,
    offset: FixedOffset,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self {
            window_days: DEFAULT_WINDOW_DAYS,
            offset: utc(),
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

impl StatsAggregator {
    pub fn new(window_days: u32, offset: FixedOffset) -> Self {
        if window_days > MAX_WINDOW_DAYS {
            log_warn!("Stats window of {window_days} days clamped to {MAX_WINDOW_DAYS}");
        }
        Self {
            window_days: window_days.min(MAX_WINDOW_DAYS),
            offset,
        }
    }

    /// Offsets outside ±24h fall back to UTC.
    pub fn with_offset_minutes(window_days: u32, utc_offset_minutes: i32) -> Self {
        let offset = utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(utc);
        Self::new(window_days, offset)
    }

    /// Calendar days of the window in the reference timezone, oldest first.
    pub fn window_dates(&self, now: DateTime<Utc>) -> Vec<NaiveDate> {
        let today = now.with_timezone(&self.offset).date_naive();
        (0..self.window_days)
            .rev()
            .filter_map(|back| today.checked_sub_days(Days::new(u64::from(back))))
            .collect()
    }

    /// Local midnight of the oldest window day, as a UTC instant. Fetching
    /// sessions from here makes the totals cover exactly the series' days.
    /// An empty window starts at `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        if self.window_days == 0 {
            return now;
        }
        let today = now.with_timezone(&self.offset).date_naive();
        let oldest = today
            .checked_sub_days(Days::new(u64::from(self.window_days - 1)))
            .unwrap_or(NaiveDate::MIN);
        let midnight = oldest.and_hms_opt(0, 0, 0).unwrap_or_default();
        match self.offset.from_local_datetime(&midnight).single() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&midnight),
        }
    }

    pub fn aggregate(&self, sessions: &[SessionRecord], now: DateTime<Utc>) -> ReadingStats {
        let mut issues = Vec::new();
        let words: Vec<u64> = sessions
            .iter()
            .map(|session| sanitized_word_count(session, &mut issues))
            .collect();

        for issue in &issues {
            log_warn!("Aggregation input issue: {issue}");
        }

        let total_words: u64 = words.iter().sum();
        let sessions_count = sessions.len() as u64;
        let average_words = rounded_average(total_words, sessions_count);

        let daily: Vec<DailyActivity> = self
            .window_dates(now)
            .into_iter()
            .map(|date| DailyActivity {
                date,
                words_read: sessions
                    .iter()
                    .zip(&words)
                    .filter(|(session, _)| {
                        session.created_at.with_timezone(&self.offset).date_naive() == date
                    })
                    .map(|(_, words)| *words)
                    .sum(),
            })
            .collect();

        ReadingStats {
            total_words,
            sessions_count,
            average_words,
            current_streak: current_streak(&daily),
            daily,
            issues,
        }
    }
}

fn sanitized_word_count(
    session: &SessionRecord,
    issues: &mut Vec<AggregationInputError>,
) -> u64 {
    match session.word_count {
        Some(value) if value >= 0 => value as u64,
        Some(value) => {
            issues.push(AggregationInputError::NegativeWordCount {
                session_id: session.id.clone(),
                value,
            });
            0
        }
        None => {
            issues.push(AggregationInputError::MissingWordCount {
                session_id: session.id.clone(),
            });
            0
        }
    }
}

/// `round(total / count)` with halves rounded up; 0 when there are no sessions.
pub fn rounded_average(total: u64, count: u64) -> u64 {
    if count == 0 {
        return 0;
    }
    let doubled = u128::from(total) * 2 + u128::from(count);
    (doubled / (u128::from(count) * 2)) as u64
}

/// Trailing run of days with any reading.
pub fn current_streak(daily: &[DailyActivity]) -> u32 {
    daily
        .iter()
        .rev()
        .take_while(|day| day.words_read > 0)
        .count() as u32
}
