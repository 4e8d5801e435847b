//! Repository module
//!
//! Storage ports for users and releases, plus their PostgreSQL adapters.
//! Services depend on the traits; `main` injects the concrete adapters.

mod release_repository;
mod user_repository;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::domain::{NewUser, Page, PageRequest, Release, ReleaseFilter, ReleaseStatus, ReleaseType, User};

pub use release_repository::PgReleaseRepository;
pub use user_repository::PgUserRepository;

/// Errors that can occur in a repository
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be mapped back to a domain value
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RepositoryError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepositoryError::Conflict(_))
    }
}

/// Durable storage of release records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseRepository: Send + Sync {
    /// Persist a new release in its own transaction and return it with its id
    async fn insert(&self, release: &Release) -> Result<Release, RepositoryError>;

    /// Overwrite the mutable fields of an existing release.
    /// Returns `None` when no row has the release's id.
    async fn update(&self, release: &Release) -> Result<Option<Release>, RepositoryError>;

    /// Delete by id. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Release>, RepositoryError>;

    async fn find(&self, filter: &ReleaseFilter) -> Result<Vec<Release>, RepositoryError>;

    /// Sum of `value` for one user, type and status, with `created_at` in `[start, end]`.
    /// `None` when no row matches.
    async fn sum_values(
        &self,
        user_id: i64,
        release_type: ReleaseType,
        status: ReleaseStatus,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<Decimal>, RepositoryError>;

    /// Releases of a user with `created_at` in `[start, end]`, newest first
    async fn find_created_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Release>, RepositoryError>;

    /// One page of a user's releases ordered by release date then id, both descending
    async fn find_page(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> Result<Page<Release>, RepositoryError>;
}

/// Credential store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, user: &NewUser) -> Result<User, RepositoryError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;
}
