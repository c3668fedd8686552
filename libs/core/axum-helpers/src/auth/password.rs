//! Credential hashing with Argon2id.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;
use thiserror::Error;

/// Stand-in hash verified when the account does not exist
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("dummy-password-never-matches").unwrap_or_default());

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct PasswordError(String);

/// Salted Argon2 hash in PHC string form. Two calls never return the same string.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// `false` on mismatch and on a malformed stored hash; never an error.
pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Login-side verification. With no stored hash the password is still
/// checked against a dummy hash, so an unknown account costs the same
/// Argon2 run as a wrong password. `None` is always `false`.
pub fn verify_password_or_dummy(stored: Option<&str>, password: &str) -> bool {
    match stored {
        Some(hash) => verify_password(hash, password),
        None => {
            let _ = verify_password(&DUMMY_HASH, password);
            false
        }
    }
}
