use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::AppError;

/// PINs are digits only and at least `min_len` long.
pub fn validate_pin(pin: &str, min_len: usize) -> Result<(), AppError> {
    if pin.len() < min_len {
        return Err(AppError::bad_request(format!(
            "PIN must be at least {min_len} digits"
        )));
    }
    if !pin.chars().all(|ch| ch.is_ascii_digit()) {
        return Err(AppError::bad_request("PIN must contain digits only"));
    }
    Ok(())
}

pub fn hash_pin(pin: &str, min_len: usize) -> Result<String, AppError> {
    validate_pin(pin, min_len)?;

    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|err| AppError::internal(format!("PIN hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

pub fn verify_pin(pin: &str, hash: &str) -> Result<bool, AppError> {
    if hash.is_empty() {
        return Ok(false);
    }
    let parsed = PasswordHash::new(hash)
        .map_err(|err| AppError::internal(format!("Invalid PIN hash: {err}")))?;

    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok())
}
