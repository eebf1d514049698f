//! Argon2id password hashing in PHC string format.

use argon2::{
    Algorithm, Argon2,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use thiserror::Error;

use crate::validate::ValidationError;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Stored password hash is malformed: {0}")]
    Malformed(String),
}

pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Returns `Ok(false)` on a wrong password; errors only when the stored hash
/// cannot be used.
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::Malformed(e.to_string()))?;
    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Malformed(e.to_string())),
    }
}

pub(crate) fn check_hash_format(hash: &str) -> Result<(), ValidationError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|_| ValidationError::PasswordHash("not a PHC string"))?;
    if parsed.algorithm != Algorithm::Argon2id.ident() {
        return Err(ValidationError::PasswordHash("algorithm must be argon2id"));
    }
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(ValidationError::PasswordHash("salt and hash are required"));
    }
    Ok(())
}
