//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::TokenConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secret used to sign access tokens
    pub token_signing_key: String,

    /// Lifetime of an access token
    pub token_validity_seconds: i64,

    /// Client allowed to use the password grant
    pub oauth_client_id: String,
    pub oauth_client_secret: String,

    /// Base URL of the identity-owning service; `None` resolves identities locally
    pub identity_service_url: Option<String>,

    /// Upper bound for one identity lookup
    pub identity_lookup_timeout: Duration,

    /// Largest page size the paginated listing will serve
    pub max_page_size: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let database_max_connections = parsed_or("DATABASE_MAX_CONNECTIONS", 10)?;
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parsed_or("PORT", 3000)?;
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let token_signing_key = required("TOKEN_SIGNING_KEY")?;
        let token_validity_seconds: i64 = parsed_or("TOKEN_VALIDITY_SECONDS", 86_400)?;
        if token_validity_seconds <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_VALIDITY_SECONDS"));
        }

        let oauth_client_id = required("OAUTH_CLIENT_ID")?;
        let oauth_client_secret = required("OAUTH_CLIENT_SECRET")?;

        let identity_service_url = env::var("IDENTITY_SERVICE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let identity_lookup_timeout =
            Duration::from_millis(parsed_or("IDENTITY_LOOKUP_TIMEOUT_MS", 2_000)?);

        let max_page_size: i64 = parsed_or("MAX_PAGE_SIZE", 100)?;
        if max_page_size < 1 {
            return Err(ConfigError::InvalidValue("MAX_PAGE_SIZE"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            token_signing_key,
            token_validity_seconds,
            oauth_client_id,
            oauth_client_secret,
            identity_service_url,
            identity_lookup_timeout,
            max_page_size,
        })
    }

    /// Settings handed to the token issuer
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            signing_key: self.token_signing_key.clone(),
            validity_seconds: self.token_validity_seconds,
            client_id: self.oauth_client_id.clone(),
            client_secret: self.oauth_client_secret.clone(),
        }
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnv(name))
}

fn parsed_or<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue(name)),
        Err(_) => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
