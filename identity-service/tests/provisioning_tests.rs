mod common;

use std::sync::Arc;

use chrono::Utc;
use common::test_authenticator;
use common::TestDb;
use common::DEMO_PASSWORD;
use identity_service::domain::identity::errors::AuthError;
use identity_service::domain::identity::errors::ProvisionError;
use identity_service::domain::identity::errors::StoreError;
use identity_service::domain::identity::models::Actor;
use identity_service::domain::identity::models::ActorId;
use identity_service::domain::identity::models::ActorKind;
use identity_service::domain::identity::models::ActorProfile;
use identity_service::domain::identity::models::DisplayName;
use identity_service::domain::identity::models::PatientProfile;
use identity_service::domain::identity::models::RawSecret;
use identity_service::domain::identity::models::RegisterPatientCommand;
use identity_service::domain::identity::models::SecretHash;
use identity_service::domain::identity::ports::CredentialStore;
use identity_service::domain::identity::ports::IdentityServicePort;
use identity_service::domain::identity::ports::SchemaProvisioner;
use identity_service::domain::identity::service::IdentityService;
use identity_service::outbound::repositories::SqliteCredentialStore;
use identity_service::outbound::repositories::SqliteSchemaProvisioner;

async fn provisioned_db() -> TestDb {
    let db = TestDb::new().await;
    SqliteSchemaProvisioner::new(db.pool.clone())
        .provision()
        .await
        .expect("Failed to provision");
    db
}

fn patient(id: &str) -> Actor {
    Actor {
        id: ActorId::new(id).unwrap(),
        display_name: DisplayName::new("Jane Doe").unwrap(),
        secret_hash: SecretHash::new("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string()),
        profile: ActorProfile::Patient(PatientProfile::default()),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_provision_is_idempotent() {
    let db = TestDb::new().await;
    let provisioner = SqliteSchemaProvisioner::new(db.pool.clone())
        .with_demo_seed(test_authenticator(), DEMO_PASSWORD.to_string());

    provisioner.provision().await.unwrap();
    let schema = db.schema_objects().await;
    let counts = (
        db.count_rows("patients").await,
        db.count_rows("hospitals").await,
        db.count_rows("doctors").await,
    );
    assert_eq!(counts, (1, 1, 1));

    for _ in 0..3 {
        provisioner.provision().await.unwrap();
    }

    assert_eq!(db.schema_objects().await, schema);
    assert_eq!(
        (
            db.count_rows("patients").await,
            db.count_rows("hospitals").await,
            db.count_rows("doctors").await,
        ),
        counts
    );
}

#[tokio::test]
async fn test_provision_without_seed_leaves_tables_empty() {
    let db = provisioned_db().await;

    for table in ["patients", "hospitals", "doctors"] {
        assert_eq!(db.count_rows(table).await, 0);
    }
    let schema = db.schema_objects().await;
    assert!(schema.contains(&"table:patients".to_string()));
    assert!(schema.contains(&"table:hospitals".to_string()));
    assert!(schema.contains(&"table:doctors".to_string()));
}

#[tokio::test]
async fn test_provision_surfaces_storage_failure() {
    let db = TestDb::new().await;
    db.pool.close().await;

    let result = SqliteSchemaProvisioner::new(db.pool.clone())
        .with_demo_seed(test_authenticator(), DEMO_PASSWORD.to_string())
        .provision()
        .await;

    assert!(matches!(result, Err(ProvisionError::Migration(_))));
}

#[tokio::test]
async fn test_seeding_keeps_existing_rows() {
    let db = provisioned_db().await;
    let store = SqliteCredentialStore::new(db.pool.clone());
    store.insert_actor(patient("HV123456789")).await.unwrap();

    SqliteSchemaProvisioner::new(db.pool.clone())
        .with_demo_seed(test_authenticator(), DEMO_PASSWORD.to_string())
        .provision()
        .await
        .unwrap();

    let stored = store
        .find_actor(ActorKind::Patient, &ActorId::new("HV123456789").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.display_name.as_str(), "Jane Doe");
    assert_eq!(db.count_rows("patients").await, 1);
    assert_eq!(db.count_rows("hospitals").await, 1);
}

#[tokio::test]
async fn test_concurrent_insert_single_winner() {
    let db = provisioned_db().await;
    let store = Arc::new(SqliteCredentialStore::new(db.pool.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.insert_actor(patient("HV9")).await })
        })
        .collect();

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(StoreError::Conflict { .. }) => conflicts += 1,
            Err(e) => panic!("unexpected store error: {}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(db.count_rows("patients").await, 1);
}

#[tokio::test]
async fn test_service_authentication_outcomes() {
    let db = provisioned_db().await;
    let store = Arc::new(SqliteCredentialStore::new(db.pool.clone()));
    let service = IdentityService::new(store, test_authenticator());

    let secrets = ["patient123", "correct horse battery staple", "ü-ñ-ß"];
    for (n, secret) in secrets.iter().enumerate() {
        let command = RegisterPatientCommand::new(
            format!("HV{}", n),
            secret.to_string(),
            "Jane Doe".to_string(),
            PatientProfile::default(),
        )
        .unwrap();
        service.register_patient(command).await.unwrap();
    }

    for (n, secret) in secrets.iter().enumerate() {
        let id = ActorId::new(format!("HV{}", n)).unwrap();

        let token = service
            .authenticate(ActorKind::Patient, &id, RawSecret::submitted(*secret))
            .await
            .unwrap();
        assert_eq!(token.session.subject_id, id);
        let session = service.verify_session(&token.token).unwrap();
        assert_eq!(session, token.session);

        let wrong = service
            .authenticate(
                ActorKind::Patient,
                &id,
                RawSecret::submitted(format!("{}x", secret)),
            )
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredential)));

        // The same id under another kind was never inserted.
        let other_kind = service
            .authenticate(ActorKind::Doctor, &id, RawSecret::submitted(*secret))
            .await;
        assert!(matches!(other_kind, Err(AuthError::NotFound { .. })));
    }

    let stored = db.count_rows("patients").await;
    assert_eq!(stored, secrets.len() as i64);
}

#[tokio::test]
async fn test_stored_hash_is_not_the_secret() {
    let db = provisioned_db().await;
    let store = Arc::new(SqliteCredentialStore::new(db.pool.clone()));
    let service = IdentityService::new(Arc::clone(&store), test_authenticator());

    let command = RegisterPatientCommand::new(
        "HV1".to_string(),
        "patient123".to_string(),
        "Jane Doe".to_string(),
        PatientProfile::default(),
    )
    .unwrap();
    service.register_patient(command).await.unwrap();

    let stored: String = sqlx::query_scalar("SELECT password_hash FROM patients WHERE id = ?")
        .bind("HV1")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert!(stored.starts_with("$argon2"));
    assert!(!stored.contains("patient123"));
}
