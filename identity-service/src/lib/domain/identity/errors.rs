use thiserror::Error;

use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorKind;

/// Error for user-correctable input problems
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} too long: maximum {max} characters, got {actual}")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} must not contain whitespace or control characters")]
    InvalidCharacters { field: &'static str },

    #[error("age out of range: maximum {max}, got {actual}")]
    AgeOutOfRange { max: u16, actual: u16 },
}

/// Error for actor kind parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown actor kind: {0}")]
pub struct UnknownActorKind(pub String);

/// Error raised by a credential store adapter
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{} already exists: {id}", .kind.label())]
    Conflict { kind: ActorKind, id: ActorId },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Error for login attempts
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("{} not found", .kind.label())]
    NotFound { kind: ActorKind, id: ActorId },

    #[error("Invalid password")]
    InvalidCredential,

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => AuthError::Unavailable(msg),
            StoreError::Conflict { .. } => AuthError::Internal(err.to_string()),
        }
    }
}

/// Error for patient registration
#[derive(Debug, Clone, Error)]
pub enum RegisterError {
    #[error("Invalid registration: {0}")]
    Validation(#[from] ValidationError),

    #[error("Health ID already registered: {0}")]
    AlreadyExists(ActorId),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for RegisterError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { id, .. } => RegisterError::AlreadyExists(id),
            StoreError::Unavailable(msg) => RegisterError::Unavailable(msg),
        }
    }
}

/// Error for bearer token checks
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Invalid session token: {0}")]
    Invalid(String),
}

impl From<auth::JwtError> for SessionError {
    fn from(err: auth::JwtError) -> Self {
        match err {
            auth::JwtError::TokenExpired => SessionError::Expired,
            other => SessionError::Invalid(other.to_string()),
        }
    }
}

/// Error for startup schema provisioning. Always fatal.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Seeding {id} failed: {reason}")]
    Seed { id: String, reason: String },
}
