//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Domain-specific errors
///
/// These errors represent business rule violations and ledger invariant failures.
/// They are independent of the web/infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Field-level validation failure, always user-correctable
    #[error("{0}")]
    Validation(String),

    /// Identity or credential mismatch
    #[error("{0}")]
    Authentication(String),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(i64),

    /// Release not found
    #[error("release not found")]
    ReleaseNotFound(i64),

    /// Update or delete attempted on a release that was never persisted
    #[error("Release has no id: operation requires a persisted release")]
    MissingReleaseId,

    /// Caller is authenticated but not allowed to touch the resource
    #[error("Forbidden: {0}")]
    Forbidden(String),
}

impl DomainError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    /// Check if this is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Authentication(_)
                | Self::UserNotFound(_)
                | Self::ReleaseNotFound(_)
                | Self::Forbidden(_)
        )
    }
}
