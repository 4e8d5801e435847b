//! Release search filter
//!
//! Each populated field adds one predicate; unset fields match everything.

use super::{Release, ReleaseStatus, ReleaseType};

/// Composable set of optional predicates over releases
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseFilter {
    /// Case-insensitive substring of the description
    pub description: Option<String>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub user_id: Option<i64>,
    pub release_type: Option<ReleaseType>,
    pub status: Option<ReleaseStatus>,
}

impl ReleaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank descriptions are ignored rather than matching only empty text
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        let trimmed = description.trim();
        self.description = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn with_month(mut self, month: i32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_type(mut self, release_type: ReleaseType) -> Self {
        self.release_type = Some(release_type);
        self
    }

    pub fn with_status(mut self, status: ReleaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// In-memory evaluation of the filter, mirroring the SQL the repository builds
    pub fn matches(&self, release: &Release) -> bool {
        if let Some(ref needle) = self.description {
            if !release
                .description
                .to_lowercase()
                .contains(&needle.to_lowercase())
            {
                return false;
            }
        }

        self.month.map_or(true, |m| release.month == Some(m))
            && self.year.map_or(true, |y| release.year == Some(y))
            && self.user_id.map_or(true, |u| release.user_id == Some(u))
            && self
                .release_type
                .map_or(true, |t| release.release_type == Some(t))
            && self.status.map_or(true, |s| release.status == Some(s))
    }
}
