//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{IdentityError, TokenError};
use crate::domain::DomainError;
use crate::repository::RepositoryError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    IdentityLookup(#[from] IdentityError),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx), except repository conflicts
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl AppError {
    /// HTTP status and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::UnsupportedGrantType(_) => {
                (StatusCode::BAD_REQUEST, "unsupported_grant_type")
            }

            // 401 Unauthorized
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::Token(TokenError::Expired) => (StatusCode::UNAUTHORIZED, "token_expired"),
            AppError::Token(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AppError::IdentityLookup(_) => (StatusCode::UNAUTHORIZED, "authentication_failed"),

            // 404 Not Found
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                DomainError::Authentication(_) => {
                    (StatusCode::BAD_REQUEST, "authentication_error")
                }
                // Kept as 400 for compatibility with existing clients
                DomainError::ReleaseNotFound(_) => (StatusCode::BAD_REQUEST, "release_not_found"),
                DomainError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
                DomainError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
                DomainError::MissingReleaseId => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "precondition_failed")
                }
            },

            // 409 Conflict
            AppError::Repository(RepositoryError::Conflict(_)) => (StatusCode::CONFLICT, "conflict"),

            // 500 Internal Server Error
            AppError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();

        // Server-side details stay in the logs
        let error = if status.is_server_error() {
            tracing::error!(error = ?self, error_code, "Request failed");
            "Internal server error".to_string()
        } else {
            if matches!(&self, AppError::Domain(e) if e.is_client_error()) {
                tracing::debug!(error = %self, error_code, "Request rejected by domain rules");
            }
            self.to_string()
        };

        let details = match &self {
            AppError::Domain(DomainError::ReleaseNotFound(id)) => Some(id.to_string()),
            AppError::Domain(DomainError::UserNotFound(id)) => Some(id.to_string()),
            _ => None,
        };

        let body = ErrorResponse {
            error,
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
