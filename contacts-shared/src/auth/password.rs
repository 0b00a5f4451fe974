/// Password hashing with bcrypt
///
/// Hashes use a fixed cost of 10 and the standard `$2b$` modular crypt
/// format, so the salt and cost travel with the stored value.
///
/// Both functions are CPU-bound; async callers should run them on the
/// blocking pool (see [`hash_password_blocking`] and
/// [`verify_password_blocking`]).
///
/// # Example
///
/// ```
/// use contacts_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret123")?;
///
/// assert!(verify_password("secret123", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

/// bcrypt work factor
pub const HASH_COST: u32 = 10;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Stored hash is not a bcrypt hash
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),

    /// The blocking task running the hash was cancelled or panicked
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

/// Hashes a password with bcrypt at [`HASH_COST`]
///
/// # Errors
///
/// Returns `PasswordError::HashError` if bcrypt rejects the input
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    bcrypt::hash(password, HASH_COST).map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a stored bcrypt hash
///
/// # Returns
///
/// `Ok(true)` on match, `Ok(false)` on mismatch
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `hash` cannot be parsed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))
}

/// [`hash_password`] on the blocking thread pool
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}

/// [`verify_password`] on the blocking thread pool
pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::TaskFailed(e.to_string()))?
}
