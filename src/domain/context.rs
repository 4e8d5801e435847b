//! Operation Context
//!
//! Contains metadata about the current request for logging and tracing.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CORRELATION_ID_HEADER: &str = "X-Correlation-Id";

/// Context for an operation, used for tracing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationContext {
    /// Authenticated user, once the bearer token has been resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Correlation ID for request tracing
    pub correlation_id: Uuid,
}

impl OperationContext {
    /// Create a context with a fresh correlation ID
    pub fn new() -> Self {
        Self {
            user_id: None,
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Reuse the caller's correlation ID when it is a valid UUID
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let correlation_id = headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Self {
            user_id: None,
            correlation_id,
        }
    }

    /// Create context with the authenticated user
    pub fn with_user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}
