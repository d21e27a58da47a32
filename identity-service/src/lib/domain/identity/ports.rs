use async_trait::async_trait;

use crate::domain::identity::errors::AuthError;
use crate::domain::identity::errors::ProvisionError;
use crate::domain::identity::errors::RegisterError;
use crate::domain::identity::errors::SessionError;
use crate::domain::identity::errors::StoreError;
use crate::domain::identity::models::Actor;
use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorKind;
use crate::domain::identity::models::RawSecret;
use crate::domain::identity::models::RegisterPatientCommand;
use crate::domain::identity::models::Session;
use crate::domain::identity::models::SessionToken;

/// Port for identity domain service operations.
#[async_trait]
pub trait IdentityServicePort: Send + Sync + 'static {
    /// Verify an (id, secret) pair and issue a session token.
    ///
    /// # Arguments
    /// * `kind` - Actor kind the id belongs to
    /// * `id` - Submitted actor id
    /// * `secret` - Submitted plaintext secret
    ///
    /// # Returns
    /// Signed session token valid for 24 hours
    ///
    /// # Errors
    /// * `NotFound` - No actor of this kind has this id
    /// * `InvalidCredential` - Secret does not match the stored hash
    /// * `Unavailable` - Storage operation failed
    async fn authenticate(
        &self,
        kind: ActorKind,
        id: &ActorId,
        secret: RawSecret,
    ) -> Result<SessionToken, AuthError>;

    /// Register a new patient.
    ///
    /// # Arguments
    /// * `command` - Validated command containing id, name, secret and profile
    ///
    /// # Returns
    /// Id of the created patient
    ///
    /// # Errors
    /// * `AlreadyExists` - A patient with this id is already registered
    /// * `Unavailable` - Storage operation failed
    async fn register_patient(
        &self,
        command: RegisterPatientCommand,
    ) -> Result<ActorId, RegisterError>;

    /// Check a bearer token issued by `authenticate`.
    ///
    /// # Errors
    /// * `Expired` - Token lifetime elapsed
    /// * `Invalid` - Signature, structure or claims invalid
    fn verify_session(&self, token: &str) -> Result<Session, SessionError>;
}

/// Persistence boundary for actors and their hashed secrets.
///
/// Keyed by (kind, id). Raw secrets never cross this boundary.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    /// Retrieve an actor by kind and id.
    ///
    /// # Returns
    /// Optional actor (None if not found)
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn find_actor(&self, kind: ActorKind, id: &ActorId)
        -> Result<Option<Actor>, StoreError>;

    /// Persist a new actor.
    ///
    /// The uniqueness check and the insert are one atomic storage operation;
    /// two concurrent inserts of the same (kind, id) yield exactly one success.
    ///
    /// # Errors
    /// * `Conflict` - (kind, id) already exists
    /// * `Unavailable` - Storage operation failed
    async fn insert_actor(&self, actor: Actor) -> Result<ActorId, StoreError>;

    /// Check whether an actor exists.
    ///
    /// # Errors
    /// * `Unavailable` - Storage operation failed
    async fn exists(&self, kind: ActorKind, id: &ActorId) -> Result<bool, StoreError>;
}

/// Startup provisioning of storage structures and optional seed data.
#[async_trait]
pub trait SchemaProvisioner: Send + Sync + 'static {
    /// Ensure the schema exists and seed rows are present.
    ///
    /// Idempotent: repeated runs create no duplicate structures or rows.
    ///
    /// # Errors
    /// * `Migration` - Schema could not be created
    /// * `Seed` - A seed actor could not be written
    async fn provision(&self) -> Result<(), ProvisionError>;
}
