//! Identity lookup
//!
//! Resolves the canonical attributes of the user a token names. The identity
//! may live in this process (`LocalIdentityLookup`) or in the service that
//! owns users (`HttpIdentityLookup`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::domain::Identity;
use crate::repository::UserRepository;

pub const IDENTITY_SEARCH_PATH: &str = "/api/users/search";

/// Identity lookup failures. Both surface as authentication failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error("user not found: {0}")]
    NotFound(String),

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    async fn lookup_by_email(&self, email: &str) -> Result<Identity, IdentityError>;
}

/// Lookup against the in-process credential store
#[derive(Clone)]
pub struct LocalIdentityLookup {
    users: Arc<dyn UserRepository>,
}

impl LocalIdentityLookup {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityLookup for LocalIdentityLookup {
    async fn lookup_by_email(&self, email: &str) -> Result<Identity, IdentityError> {
        match self.users.find_by_email(email).await {
            Ok(Some(user)) => Ok(user.identity()),
            Ok(None) => Err(IdentityError::NotFound(email.to_string())),
            Err(e) => Err(IdentityError::Unavailable(e.to_string())),
        }
    }
}

/// Lookup against the identity-owning service over HTTP
pub struct HttpIdentityLookup {
    client: Client,
    search_url: String,
}

impl HttpIdentityLookup {
    /// Build a client whose every request is bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            search_url: format!("{}{}", base_url.trim_end_matches('/'), IDENTITY_SEARCH_PATH),
        })
    }
}

#[async_trait]
impl IdentityLookup for HttpIdentityLookup {
    async fn lookup_by_email(&self, email: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .get(&self.search_url)
            .query(&[("email", email)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Identity lookup request failed");
                IdentityError::Unavailable(e.to_string())
            })?;

        match response.status() {
            StatusCode::OK => response
                .json::<Identity>()
                .await
                .map_err(|e| IdentityError::Unavailable(format!("invalid identity payload: {e}"))),
            StatusCode::NOT_FOUND => Err(IdentityError::NotFound(email.to_string())),
            status => {
                tracing::warn!(status = %status, "Identity service returned an error");
                Err(IdentityError::Unavailable(format!("unexpected status {status}")))
            }
        }
    }
}
