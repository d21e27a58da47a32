use std::sync::Arc;

use async_trait::async_trait;
use auth::Authenticator;
use chrono::Utc;
use sqlx::SqlitePool;

use super::actor::SqliteCredentialStore;
use crate::domain::identity::errors::ProvisionError;
use crate::domain::identity::errors::StoreError;
use crate::domain::identity::models::Actor;
use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorProfile;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::DoctorProfile;
use crate::domain::identity::models::HospitalProfile;
use crate::domain::identity::models::PatientProfile;
use crate::domain::identity::models::SecretHash;
use crate::domain::identity::ports::CredentialStore;
use crate::domain::identity::ports::SchemaProvisioner;

struct DemoSeed {
    authenticator: Arc<Authenticator>,
    password: String,
}

/// Creates the actor tables and optionally seeds the demo actors.
///
/// Safe to run on every start: migrations are recorded by sqlx and use
/// `CREATE TABLE IF NOT EXISTS`, seed rows are only written when absent.
pub struct SqliteSchemaProvisioner {
    pool: SqlitePool,
    seed: Option<DemoSeed>,
}

impl SqliteSchemaProvisioner {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, seed: None }
    }

    /// Seed the demo patient, hospital and doctor, all sharing `password`.
    pub fn with_demo_seed(mut self, authenticator: Arc<Authenticator>, password: String) -> Self {
        self.seed = Some(DemoSeed {
            authenticator,
            password,
        });
        self
    }

    async fn seed_demo_actors(&self, seed: &DemoSeed) -> Result<(), ProvisionError> {
        let store = SqliteCredentialStore::new(self.pool.clone());

        for (id, name, profile) in demo_actors() {
            let seed_error = |reason: String| ProvisionError::Seed {
                id: id.to_string(),
                reason,
            };

            let actor_id = ActorId::new(id).map_err(|e| seed_error(e.to_string()))?;
            let kind = profile.kind();

            if store
                .exists(kind, &actor_id)
                .await
                .map_err(|e| seed_error(e.to_string()))?
            {
                tracing::debug!(actor_id = %actor_id, kind = %kind, "Seed actor already present");
                continue;
            }

            let authenticator = Arc::clone(&seed.authenticator);
            let password = seed.password.clone();
            let secret_hash =
                tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
                    .await
                    .map_err(|e| seed_error(e.to_string()))?
                    .map_err(|e| seed_error(e.to_string()))?;

            let actor = Actor {
                id: actor_id,
                display_name: DisplayName::new(name).map_err(|e| seed_error(e.to_string()))?,
                secret_hash: SecretHash::new(secret_hash),
                profile,
                created_at: Utc::now(),
            };

            match store.insert_actor(actor).await {
                Ok(actor_id) => {
                    tracing::info!(actor_id = %actor_id, kind = %kind, "Seed actor inserted")
                }
                // Another instance seeded it between the check and the insert.
                Err(StoreError::Conflict { .. }) => {}
                Err(e) => return Err(seed_error(e.to_string())),
            }
        }

        Ok(())
    }
}

fn demo_actors() -> Vec<(&'static str, &'static str, ActorProfile)> {
    vec![
        (
            "HV123456789",
            "John Doe",
            ActorProfile::Patient(PatientProfile {
                gender: Some("Male".to_string()),
                age: Some(34),
                phone: Some("9876543210".to_string()),
                address: Some("New York".to_string()),
            }),
        ),
        (
            "HOSP12345",
            "City General Hospital",
            ActorProfile::Hospital(HospitalProfile {
                address: Some("Main Road".to_string()),
            }),
        ),
        (
            "DOC999",
            "Dr. Sarah",
            ActorProfile::Doctor(DoctorProfile {
                speciality: Some("General Medicine".to_string()),
                hospital_id: Some("HOSP12345".to_string()),
            }),
        ),
    ]
}

#[async_trait]
impl SchemaProvisioner for SqliteSchemaProvisioner {
    async fn provision(&self) -> Result<(), ProvisionError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ProvisionError::Migration(e.to_string()))?;
        tracing::info!(database = "sqlite", "Schema provisioned");

        if let Some(seed) = &self.seed {
            self.seed_demo_actors(seed).await?;
        }

        Ok(())
    }
}
