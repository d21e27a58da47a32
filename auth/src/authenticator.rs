use chrono::DateTime;
use chrono::Utc;

use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::SessionClaims;
use crate::password::HashingCost;
use crate::password::PasswordError;
use crate::password::PasswordHasher;

/// Authentication coordinator combining secret verification and session issuance.
///
/// Hashing and verification are CPU-bound; async callers should run them on a
/// blocking pool. The type is `Send + Sync` so it can be shared through an `Arc`.
pub struct Authenticator {
    password_hasher: PasswordHasher,
    jwt_handler: JwtHandler,
}

/// Result of successful authentication.
#[derive(Debug, Clone)]
pub struct AuthenticationResult {
    /// Signed bearer token
    pub access_token: String,
    /// Claims encoded in `access_token`
    pub claims: SessionClaims,
}

/// Authentication operation errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("JWT error: {0}")]
    JwtError(#[from] JwtError),
}

impl Authenticator {
    /// Create an authenticator with the default hashing cost.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for token signing
    pub fn new(jwt_secret: &[u8]) -> Self {
        Self {
            password_hasher: PasswordHasher::new(),
            jwt_handler: JwtHandler::new(jwt_secret),
        }
    }

    /// Create an authenticator hashing new secrets at `cost`.
    ///
    /// # Errors
    /// * `InvalidCost` - Cost parameters rejected by Argon2
    pub fn with_cost(jwt_secret: &[u8], cost: HashingCost) -> Result<Self, PasswordError> {
        Ok(Self {
            password_hasher: PasswordHasher::with_cost(cost)?,
            jwt_handler: JwtHandler::new(jwt_secret),
        })
    }

    /// Hash a secret for storage.
    pub fn hash_password(&self, password: &str) -> Result<String, PasswordError> {
        self.password_hasher.hash(password)
    }

    /// Check a secret against a stored hash without issuing anything.
    pub fn verify_password(
        &self,
        password: &str,
        stored_hash: &str,
    ) -> Result<bool, PasswordError> {
        self.password_hasher.verify(password, stored_hash)
    }

    /// Verify credentials and issue a session token for `subject`.
    ///
    /// # Arguments
    /// * `password` - Plaintext secret to verify
    /// * `stored_hash` - Stored PHC hash
    /// * `subject` - Actor identifier placed in `sub`
    /// * `kind` - Actor kind placed in `kind`
    /// * `now` - Issue time
    ///
    /// # Errors
    /// * `InvalidCredentials` - Secret does not match
    /// * `PasswordError` - Stored hash could not be used
    /// * `JwtError` - Token generation failed
    pub fn authenticate(
        &self,
        password: &str,
        stored_hash: &str,
        subject: &str,
        kind: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticationResult, AuthenticationError> {
        if !self.password_hasher.verify(password, stored_hash)? {
            return Err(AuthenticationError::InvalidCredentials);
        }

        let claims = SessionClaims::issue(subject, kind, now);
        let access_token = self.jwt_handler.encode(&claims)?;

        Ok(AuthenticationResult {
            access_token,
            claims,
        })
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Errors
    /// * `TokenExpired` - Token lifetime elapsed
    /// * `InvalidToken` - Signature or structure invalid
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, JwtError> {
        self.jwt_handler.decode(token)
    }
}
