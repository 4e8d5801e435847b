//! Password hashing
//!
//! Stored format is `<salt hex>$<sha256(salt || password) hex>`.

use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_LEN: usize = 16;

/// Hash a raw password with a fresh random salt
pub fn hash_password(raw_password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);

    format!("{}${}", hex::encode(salt), digest(&salt, raw_password))
}

/// Check a raw password against a stored hash.
/// Malformed stored hashes never verify.
pub fn verify_password(raw_password: &str, stored_hash: &str) -> bool {
    let Some((salt_hex, expected)) = stored_hash.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };

    digest(&salt, raw_password) == expected
}

fn digest(salt: &[u8], raw_password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(raw_password.as_bytes());
    hex::encode(hasher.finalize())
}
