//! Projection Service
//!
//! Aggregates over a user's releases. Nothing is cached; the window is
//! recomputed from today's date on every call.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::{today, DomainError, Page, PageRequest, Release, ReleaseStatus, ReleaseType};
use crate::error::AppResult;
use crate::repository::{ReleaseRepository, UserRepository};

use super::{Window, WINDOW_DAYS};

/// Read-model queries over releases
#[derive(Clone)]
pub struct ProjectionService {
    releases: Arc<dyn ReleaseRepository>,
    users: Arc<dyn UserRepository>,
}

impl ProjectionService {
    pub fn new(releases: Arc<dyn ReleaseRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { releases, users }
    }

    fn window() -> Window {
        Window::trailing(today(), WINDOW_DAYS)
    }

    async fn ensure_user(&self, user_id: i64) -> AppResult<()> {
        match self.users.find_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(DomainError::UserNotFound(user_id).into()),
        }
    }

    async fn settled_sum(
        &self,
        user_id: i64,
        release_type: ReleaseType,
        window: Window,
    ) -> AppResult<Decimal> {
        let sum = self
            .releases
            .sum_values(
                user_id,
                release_type,
                ReleaseStatus::Settled,
                window.start,
                window.end,
            )
            .await?;
        Ok(sum.unwrap_or(Decimal::ZERO))
    }

    /// Settled income minus settled expense created inside the window.
    /// Can be negative.
    pub async fn get_balance_by_user(&self, user_id: i64) -> AppResult<Decimal> {
        self.ensure_user(user_id).await?;

        let window = Self::window();
        let income = self.settled_sum(user_id, ReleaseType::Income, window).await?;
        let expense = self.settled_sum(user_id, ReleaseType::Expense, window).await?;
        let balance = income - expense;

        tracing::debug!(user_id, %income, %expense, %balance, "Balance computed");

        Ok(balance)
    }

    /// Settled total of one release type inside the window
    pub async fn get_extract_by_release_type(
        &self,
        user_id: i64,
        release_type: ReleaseType,
    ) -> AppResult<Decimal> {
        self.ensure_user(user_id).await?;
        self.settled_sum(user_id, release_type, Self::window()).await
    }

    /// One page of a user's releases. An unknown user yields an empty page.
    pub async fn get_releases_paginated(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> AppResult<Page<Release>> {
        if self.users.find_by_id(user_id).await?.is_none() {
            return Ok(Page::empty());
        }
        Ok(self.releases.find_page(user_id, page).await?)
    }

    /// Releases created inside the window, newest first
    pub async fn last_releases(&self, user_id: i64) -> AppResult<Vec<Release>> {
        let window = Self::window();
        Ok(self
            .releases
            .find_created_between(user_id, window.start, window.end)
            .await?)
    }
}
