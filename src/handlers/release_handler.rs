//! Release Handler
//!
//! Validation and status lifecycle of releases. Every mutation is one
//! repository call, and each repository call is one transaction.

use std::sync::Arc;

use crate::domain::{today, DomainError, Release, ReleaseFilter, ReleaseStatus};
use crate::error::AppResult;
use crate::repository::{ReleaseRepository, UserRepository};

use super::ReleaseCommand;

pub const USER_NOT_FOUND_FOR_ID: &str = "user not found for the given id";
pub const RELEASE_NOT_FOUND: &str = "release not found";

/// Handler for release writes and lookups
#[derive(Clone)]
pub struct ReleaseHandler {
    releases: Arc<dyn ReleaseRepository>,
    users: Arc<dyn UserRepository>,
}

impl ReleaseHandler {
    pub fn new(releases: Arc<dyn ReleaseRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { releases, users }
    }

    /// Check release invariants in their fixed order
    pub fn validate(&self, release: &Release) -> AppResult<()> {
        release.validate()?;
        Ok(())
    }

    /// Persist a new release as PENDING, stamped with today's date
    pub async fn save(&self, mut release: Release) -> AppResult<Release> {
        self.validate(&release)?;
        self.ensure_owner_exists(&release).await?;

        release.id = None;
        release.status = Some(ReleaseStatus::Pending);
        release.created_at = Some(today());

        let saved = self.releases.insert(&release).await?;

        tracing::info!(
            release_id = ?saved.id,
            user_id = ?saved.user_id,
            "Release created"
        );

        Ok(saved)
    }

    /// Rewrite an existing release
    pub async fn update(&self, release: Release) -> AppResult<Release> {
        let id = release.id.ok_or(DomainError::MissingReleaseId)?;
        self.validate(&release)?;
        self.ensure_owner_exists(&release).await?;

        let updated = self
            .releases
            .update(&release)
            .await?
            .ok_or(DomainError::ReleaseNotFound(id))?;

        tracing::info!(release_id = id, status = ?updated.status, "Release updated");

        Ok(updated)
    }

    async fn ensure_owner_exists(&self, release: &Release) -> AppResult<()> {
        let Some(user_id) = release.user_id else {
            return Ok(());
        };

        if self.users.find_by_id(user_id).await?.is_none() {
            tracing::debug!(user_id, "Release owner does not exist");
            return Err(DomainError::validation(USER_NOT_FOUND_FOR_ID).into());
        }

        Ok(())
    }

    pub async fn delete(&self, release: &Release) -> AppResult<()> {
        let id = release.id.ok_or(DomainError::MissingReleaseId)?;

        if !self.releases.delete(id).await? {
            return Err(DomainError::ReleaseNotFound(id).into());
        }

        tracing::info!(release_id = id, "Release deleted");

        Ok(())
    }

    /// Status change is a restricted update
    pub async fn update_status(
        &self,
        mut release: Release,
        status: ReleaseStatus,
    ) -> AppResult<Release> {
        release.status = Some(status);
        self.update(release).await
    }

    pub async fn find(&self, filter: &ReleaseFilter) -> AppResult<Vec<Release>> {
        Ok(self.releases.find(filter).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<Release>> {
        Ok(self.releases.find_by_id(id).await?)
    }

    /// Create a release from a command whose owner must already exist
    pub async fn create(&self, command: ReleaseCommand) -> AppResult<Release> {
        self.save(Self::build_release(command, None)).await
    }

    /// Rewrite the release named by `command.id`.
    ///
    /// The creation date always comes from the stored release, and so does
    /// the status when the command leaves it out.
    pub async fn update_from_command(&self, command: ReleaseCommand) -> AppResult<Release> {
        let id = command
            .id
            .ok_or_else(|| DomainError::validation(RELEASE_NOT_FOUND))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(DomainError::ReleaseNotFound(id))?;

        self.update(Self::build_release(command, Some(&existing))).await
    }

    fn build_release(command: ReleaseCommand, existing: Option<&Release>) -> Release {
        Release {
            id: existing.and_then(|r| r.id),
            description: command.description.unwrap_or_default(),
            month: command.month,
            year: command.year,
            user_id: command.user_id,
            value: command.value,
            release_type: command.release_type,
            status: command.status.or_else(|| existing.and_then(|r| r.status)),
            release_date: command.release_date,
            created_at: existing.and_then(|r| r.created_at),
        }
    }
}
