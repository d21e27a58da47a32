use thiserror::Error;

/// Error type for password operations.
///
/// Messages never include the secret or the stored hash.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Invalid hashing cost: {0}")]
    InvalidCost(String),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Password verification failed: {0}")]
    VerificationFailed(String),
}
