use std::sync::Arc;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use chrono::Utc;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::errors::RegisterError;
use crate::domain::identity::errors::SessionError;
use crate::domain::identity::models::Actor;
use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorKind;
use crate::domain::identity::models::ActorProfile;
use crate::domain::identity::models::RawSecret;
use crate::domain::identity::models::RegisterPatientCommand;
use crate::domain::identity::models::SecretHash;
use crate::domain::identity::models::Session;
use crate::domain::identity::models::SessionToken;
use crate::domain::identity::ports::CredentialStore;
use crate::domain::identity::ports::IdentityServicePort;

/// Domain service implementation for login and registration.
///
/// Hashing and verification run on tokio's blocking pool so that concurrent
/// requests keep being served while Argon2 works.
pub struct IdentityService<S>
where
    S: CredentialStore,
{
    store: Arc<S>,
    authenticator: Arc<Authenticator>,
    conceal_unknown_actor: bool,
    decoy_hash: Option<Arc<str>>,
}

impl<S> IdentityService<S>
where
    S: CredentialStore,
{
    /// Create a new identity service with injected dependencies.
    ///
    /// # Arguments
    /// * `store` - Credential store implementation
    /// * `authenticator` - Secret hashing and token signing
    pub fn new(store: Arc<S>, authenticator: Arc<Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            conceal_unknown_actor: false,
            decoy_hash: None,
        }
    }

    /// Report unknown ids as `InvalidCredential` instead of `NotFound`.
    ///
    /// The decoy hash is computed here, at startup, so the first concealed
    /// lookup costs the same as any later one.
    pub fn with_unknown_actor_concealed(mut self, conceal: bool) -> Self {
        self.conceal_unknown_actor = conceal;
        self.decoy_hash = if conceal {
            match self.authenticator.hash_password("decoy-secret") {
                Ok(hash) => Some(Arc::from(hash)),
                Err(e) => {
                    tracing::warn!(error = %e, "Decoy hash unavailable");
                    None
                }
            }
        } else {
            None
        };
        self
    }

    /// Spend one verification on a decoy hash so an unknown id costs as much
    /// time as a wrong secret.
    async fn verify_against_decoy(&self, secret: RawSecret) {
        let Some(decoy_hash) = self.decoy_hash.clone() else {
            return;
        };
        let authenticator = Arc::clone(&self.authenticator);

        // Only the time spent matters: the caller rejects regardless of outcome.
        let _ = tokio::task::spawn_blocking(move || {
            authenticator.verify_password(secret.expose(), &decoy_hash)
        })
        .await;
    }
}

#[async_trait]
impl<S> IdentityServicePort for IdentityService<S>
where
    S: CredentialStore,
{
    async fn authenticate(
        &self,
        kind: ActorKind,
        id: &ActorId,
        secret: RawSecret,
    ) -> Result<SessionToken, AuthError> {
        let actor = match self.store.find_actor(kind, id).await? {
            Some(actor) => actor,
            None if self.conceal_unknown_actor => {
                self.verify_against_decoy(secret).await;
                return Err(AuthError::InvalidCredential);
            }
            None => {
                return Err(AuthError::NotFound {
                    kind,
                    id: id.clone(),
                })
            }
        };

        let authenticator = Arc::clone(&self.authenticator);
        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(
                secret.expose(),
                actor.secret_hash.as_str(),
                actor.id.as_str(),
                kind.as_str(),
                Utc::now(),
            )
        })
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))?;

        let issued = match result {
            Ok(issued) => issued,
            Err(AuthenticationError::InvalidCredentials) => {
                return Err(AuthError::InvalidCredential)
            }
            Err(AuthenticationError::PasswordError(e)) => {
                tracing::error!(
                    actor_id = %id,
                    kind = %kind,
                    error = %e,
                    "Stored secret hash unusable"
                );
                return Err(AuthError::Internal(e.to_string()));
            }
            Err(AuthenticationError::JwtError(e)) => {
                return Err(AuthError::Internal(format!("Token generation failed: {}", e)))
            }
        };

        let session = Session::try_from(issued.claims)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        tracing::debug!(actor_id = %session.subject_id, kind = %kind, "Session issued");

        Ok(SessionToken {
            token: issued.access_token,
            session,
        })
    }

    async fn register_patient(
        &self,
        command: RegisterPatientCommand,
    ) -> Result<ActorId, RegisterError> {
        let authenticator = Arc::clone(&self.authenticator);
        let secret = command.secret;
        let secret_hash = tokio::task::spawn_blocking(move || {
            authenticator.hash_password(secret.expose())
        })
        .await
        .map_err(|e| RegisterError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| RegisterError::Internal(e.to_string()))?;

        let actor = Actor {
            id: command.id,
            display_name: command.display_name,
            secret_hash: SecretHash::new(secret_hash),
            profile: ActorProfile::Patient(command.profile),
            created_at: Utc::now(),
        };

        let id = self.store.insert_actor(actor).await?;

        tracing::info!(actor_id = %id, kind = %ActorKind::Patient, "Patient registered");

        Ok(id)
    }

    fn verify_session(&self, token: &str) -> Result<Session, SessionError> {
        let claims = self.authenticator.validate_token(token)?;
        Session::try_from(claims)
    }
}
