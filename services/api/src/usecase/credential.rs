//! Salted password hashing (argon2id, PHC string format).
//!
//! The salt is generated per account and stored next to the hash; hashing the
//! same password with the same salt always yields the same PHC string.

use anyhow::anyhow;
use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::ApiError;

pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_owned()
}

pub fn hash_password(password: &str, salt: &str) -> Result<String, ApiError> {
    let salt = SaltString::from_b64(salt).map_err(|e| anyhow!("invalid stored salt: {e}"))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("hash password: {e}"))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ApiError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| anyhow!("parse stored hash: {e}"))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ApiError::Internal(anyhow!("verify password: {e}"))),
    }
}
