use crate::error::AppError;
use bcrypt::{hash, verify, DEFAULT_COST};

/// Hashes a plaintext password with bcrypt (salted, cost 12).
///
/// A hashing failure is fatal to the calling operation (registration),
/// surfacing as a 500.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks a submitted plaintext password against a stored bcrypt digest.
///
/// A mismatch is the normal `Ok(false)` outcome, not an error. Callers must
/// always pass the *submitted* plaintext first and the *stored* digest
/// second; the comparison is never between a digest and itself.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Failed to verify password: {}", e)))
}
