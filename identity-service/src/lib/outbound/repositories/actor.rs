use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::domain::identity::errors::StoreError;
use crate::domain::identity::models::Actor;
use crate::domain::identity::models::ActorId;
use crate::domain::identity::models::ActorKind;
use crate::domain::identity::models::ActorProfile;
use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::DoctorProfile;
use crate::domain::identity::models::HospitalProfile;
use crate::domain::identity::models::PatientProfile;
use crate::domain::identity::models::SecretHash;
use crate::domain::identity::ports::CredentialStore;

/// Credential store backed by one SQLite table per actor kind.
///
/// Uniqueness of (kind, id) is the table's primary key, so a duplicate insert
/// is rejected by SQLite itself.
#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn table(kind: ActorKind) -> &'static str {
    match kind {
        ActorKind::Patient => "patients",
        ActorKind::Hospital => "hospitals",
        ActorKind::Doctor => "doctors",
    }
}

#[derive(sqlx::FromRow)]
struct PatientRow {
    id: String,
    name: String,
    gender: Option<String>,
    age: Option<i64>,
    phone: Option<String>,
    address: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct HospitalRow {
    id: String,
    name: String,
    address: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DoctorRow {
    id: String,
    name: String,
    speciality: Option<String>,
    hospital_id: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

fn actor_from_parts(
    id: String,
    name: String,
    password_hash: String,
    profile: ActorProfile,
    created_at: DateTime<Utc>,
) -> Result<Actor, StoreError> {
    let kind = profile.kind();
    let corrupt = |field: &str| {
        StoreError::Unavailable(format!("Corrupt {} row: invalid {}", kind, field))
    };

    Ok(Actor {
        id: ActorId::new(id).map_err(|_| corrupt("id"))?,
        display_name: DisplayName::new(name).map_err(|_| corrupt("name"))?,
        secret_hash: SecretHash::new(password_hash),
        profile,
        created_at,
    })
}

impl TryFrom<PatientRow> for Actor {
    type Error = StoreError;

    fn try_from(r: PatientRow) -> Result<Self, Self::Error> {
        let profile = ActorProfile::Patient(PatientProfile {
            gender: r.gender,
            age: r.age.and_then(|age| u16::try_from(age).ok()),
            phone: r.phone,
            address: r.address,
        });
        actor_from_parts(r.id, r.name, r.password_hash, profile, r.created_at)
    }
}

impl TryFrom<HospitalRow> for Actor {
    type Error = StoreError;

    fn try_from(r: HospitalRow) -> Result<Self, Self::Error> {
        let profile = ActorProfile::Hospital(HospitalProfile { address: r.address });
        actor_from_parts(r.id, r.name, r.password_hash, profile, r.created_at)
    }
}

impl TryFrom<DoctorRow> for Actor {
    type Error = StoreError;

    fn try_from(r: DoctorRow) -> Result<Self, Self::Error> {
        let profile = ActorProfile::Doctor(DoctorProfile {
            speciality: r.speciality,
            hospital_id: r.hospital_id,
        });
        actor_from_parts(r.id, r.name, r.password_hash, profile, r.created_at)
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn find_actor(
        &self,
        kind: ActorKind,
        id: &ActorId,
    ) -> Result<Option<Actor>, StoreError> {
        match kind {
            ActorKind::Patient => sqlx::query_as::<_, PatientRow>(
                r#"
                SELECT id, name, gender, age, phone, address, password_hash, created_at
                FROM patients
                WHERE id = ?
                "#,
            )
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Actor::try_from)
            .transpose(),

            ActorKind::Hospital => sqlx::query_as::<_, HospitalRow>(
                r#"
                SELECT id, name, address, password_hash, created_at
                FROM hospitals
                WHERE id = ?
                "#,
            )
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Actor::try_from)
            .transpose(),

            ActorKind::Doctor => sqlx::query_as::<_, DoctorRow>(
                r#"
                SELECT id, name, speciality, hospital_id, password_hash, created_at
                FROM doctors
                WHERE id = ?
                "#,
            )
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?
            .map(Actor::try_from)
            .transpose(),
        }
    }

    async fn insert_actor(&self, actor: Actor) -> Result<ActorId, StoreError> {
        let query = match &actor.profile {
            ActorProfile::Patient(p) => sqlx::query(
                r#"
                INSERT INTO patients
                    (id, name, gender, age, phone, address, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(actor.id.as_str())
            .bind(actor.display_name.as_str())
            .bind(p.gender.as_deref())
            .bind(p.age.map(i64::from))
            .bind(p.phone.as_deref())
            .bind(p.address.as_deref()),

            ActorProfile::Hospital(h) => sqlx::query(
                r#"
                INSERT INTO hospitals (id, name, address, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(actor.id.as_str())
            .bind(actor.display_name.as_str())
            .bind(h.address.as_deref()),

            ActorProfile::Doctor(d) => sqlx::query(
                r#"
                INSERT INTO doctors (id, name, speciality, hospital_id, password_hash, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(actor.id.as_str())
            .bind(actor.display_name.as_str())
            .bind(d.speciality.as_deref())
            .bind(d.hospital_id.as_deref()),
        };

        query
            .bind(actor.secret_hash.as_str())
            .bind(actor.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let Some(db_err) = e.as_database_error() {
                    if db_err.is_unique_violation() {
                        return StoreError::Conflict {
                            kind: actor.kind(),
                            id: actor.id.clone(),
                        };
                    }
                }
                unavailable(e)
            })?;

        Ok(actor.id)
    }

    async fn exists(&self, kind: ActorKind, id: &ActorId) -> Result<bool, StoreError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
            table(kind)
        );

        let found = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;

        Ok(found != 0)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn store() -> SqliteCredentialStore {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        SqliteCredentialStore::new(pool)
    }

    fn actor(id: &str, profile: ActorProfile) -> Actor {
        Actor {
            id: ActorId::new(id).unwrap(),
            display_name: DisplayName::new("Jane Doe").unwrap(),
            secret_hash: SecretHash::new(
                "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaA".to_string(),
            ),
            profile,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_then_find_patient() {
        let store = store().await;
        let profile = ActorProfile::Patient(PatientProfile {
            gender: Some("Female".to_string()),
            age: Some(29),
            phone: None,
            address: Some("New York".to_string()),
        });

        let id = store.insert_actor(actor("HV1", profile.clone())).await.unwrap();
        assert_eq!(id.as_str(), "HV1");

        let found = store
            .find_actor(ActorKind::Patient, &id)
            .await
            .unwrap()
            .expect("Patient should exist");
        assert_eq!(found.display_name.as_str(), "Jane Doe");
        assert_eq!(found.profile, profile);
        assert!(found.secret_hash.as_str().starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_find_missing_returns_none() {
        let store = store().await;

        let found = store
            .find_actor(ActorKind::Doctor, &ActorId::new("DOC999").unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = store().await;
        let patient = || ActorProfile::Patient(PatientProfile::default());

        store.insert_actor(actor("HV1", patient())).await.unwrap();
        let result = store.insert_actor(actor("HV1", patient())).await;

        assert!(matches!(
            result,
            Err(StoreError::Conflict {
                kind: ActorKind::Patient,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_ids_are_scoped_per_kind() {
        let store = store().await;

        store
            .insert_actor(actor("SHARED1", ActorProfile::Hospital(HospitalProfile::default())))
            .await
            .unwrap();
        store
            .insert_actor(actor("SHARED1", ActorProfile::Doctor(DoctorProfile::default())))
            .await
            .unwrap();

        let id = ActorId::new("SHARED1").unwrap();
        assert!(store.exists(ActorKind::Hospital, &id).await.unwrap());
        assert!(store.exists(ActorKind::Doctor, &id).await.unwrap());
        assert!(!store.exists(ActorKind::Patient, &id).await.unwrap());
    }
}
