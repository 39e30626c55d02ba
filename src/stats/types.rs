use chrono::NaiveDate;
use serde::Serialize;

use crate::error::AggregationInputError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub words_read: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStats {
    pub total_words: u64,
    pub sessions_count: u64,
    pub average_words: u64,
    /// Consecutive days with reading, ending at the newest day of `daily`.
    pub current_streak: u32,
    /// One entry per window day, oldest first.
    pub daily: Vec<DailyActivity>,
    pub issues: Vec<AggregationInputError>,
}
