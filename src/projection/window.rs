//! Trailing reporting window

use chrono::{Duration, NaiveDate};

/// Days covered by balance, extract and last-releases queries
pub const WINDOW_DAYS: i64 = 30;

/// Inclusive date range `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// `[today - days, today]`
    pub fn trailing(today: NaiveDate, days: i64) -> Self {
        Self {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}
