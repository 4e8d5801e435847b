//! Token Issuer/Validator
//!
//! Issues HS256-signed access tokens for verified identities and validates
//! tokens presented on protected routes. The signing key comes from
//! `TokenConfig`, built once at startup; changing it invalidates every
//! outstanding token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Identity, User};

/// Scopes granted to every token in this domain
pub const SCOPES: [&str; 2] = ["read", "write"];

pub const TOKEN_TYPE: &str = "bearer";

/// Signing and client settings for the token issuer
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub signing_key: String,
    pub validity_seconds: i64,
    pub client_id: String,
    pub client_secret: String,
}

/// Token validation failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub name: String,
    pub email: String,
    pub authorities: Vec<String>,
    pub scope: Vec<String>,
    pub client_id: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn identity(&self) -> Result<Identity, TokenError> {
        let id = self
            .sub
            .parse()
            .map_err(|_| TokenError::Malformed(format!("invalid subject: {}", self.sub)))?;

        Ok(Identity {
            id,
            name: self.name.clone(),
            email: self.email.clone(),
        })
    }
}

/// Token response returned by the token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub scope: String,
    pub jti: Uuid,
}

/// Issues and validates access tokens
pub struct TokenIssuer {
    config: Arc<TokenConfig>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: Arc<TokenConfig>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.signing_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.signing_key.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            config,
            encoding_key,
            decoding_key,
            validation,
        }
    }

    pub fn validity_seconds(&self) -> i64 {
        self.config.validity_seconds
    }

    /// Check client credentials of the password grant
    pub fn verify_client(&self, client_id: &str, client_secret: &str) -> bool {
        client_id == self.config.client_id && client_secret == self.config.client_secret
    }

    /// Issue a token for a verified user
    pub fn issue_token(&self, user: &User) -> Result<SignedToken, TokenError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<SignedToken, TokenError> {
        let jti = Uuid::new_v4();
        let expires_at = now + Duration::seconds(self.config.validity_seconds);

        let claims = Claims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            authorities: user.roles.clone(),
            scope: SCOPES.iter().map(|s| s.to_string()).collect(),
            client_id: self.config.client_id.clone(),
            jti,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let access_token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        tracing::debug!(user_id = user.id, jti = %jti, "Access token issued");

        Ok(SignedToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.config.validity_seconds,
            scope: SCOPES.join(" "),
            jti,
        })
    }

    /// Verify signature and expiry and return the token's claims
    pub fn decode_claims(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }

    /// Verify a token and return the identity it names
    pub fn validate_token(&self, token: &str) -> Result<Identity, TokenError> {
        self.decode_claims(token)?.identity()
    }
}
