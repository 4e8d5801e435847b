//! User and Identity types

use serde::{Deserialize, Serialize};

/// Role granted to every registered user
pub const DEFAULT_ROLE: &str = "USER";

/// Registered user as stored by the credential store
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl User {
    /// Public view of this user, without credentials
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// User data about to be inserted (id not yet assigned)
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}

/// Resolved principal behind an authenticated request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
}
