//! Authentication boundary
//!
//! Password hashing, access token issuance/validation and identity lookup.

pub mod identity;
pub mod password;
pub mod token;

pub use identity::{HttpIdentityLookup, IdentityError, IdentityLookup, LocalIdentityLookup};
pub use password::{hash_password, verify_password};
pub use token::{Claims, SignedToken, TokenConfig, TokenError, TokenIssuer};
