use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::PasswordConfig,
    errors::{Error, Result},
};

/// Hash a password with argon2id, returning a PHC string.
pub fn hash_string(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Failed to hash password: {e}");
            Error::Internal {
                operation: "hash password".to_string(),
            }
        })
}

/// Verify a password against a stored PHC hash.
///
/// A mismatch is `Ok(false)`; only an unparseable stored hash is an error.
pub fn verify_string(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        tracing::error!("Stored password hash is malformed: {e}");
        Error::Internal {
            operation: "verify password".to_string(),
        }
    })?;

    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub fn validate_password(password: &str, rules: &PasswordConfig) -> Result<()> {
    let length = password.chars().count();
    if length < rules.min_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at least {} characters", rules.min_length),
        });
    }
    if length > rules.max_length {
        return Err(Error::BadRequest {
            message: format!("Password must be at most {} characters", rules.max_length),
        });
    }
    Ok(())
}
