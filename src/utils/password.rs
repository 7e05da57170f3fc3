use crate::error::{AppError, AppResult};
use bcrypt::{hash, verify};

pub use bcrypt::DEFAULT_COST;

/// bcrypt only looks at the first 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;

/// Rejects empty passwords and ones bcrypt would silently truncate.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::ValidationError(
            "Password must not be empty".to_string(),
        ));
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::ValidationError(format!(
            "Password must be at most {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    Ok(())
}

/// Salted bcrypt hash; `cost` is the bcrypt work factor (4..=31)
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    hash(password, cost)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))
}

/// Checks a password against a stored bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))
}
