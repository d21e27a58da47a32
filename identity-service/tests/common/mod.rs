#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use auth::Authenticator;
use auth::HashingCost;
use auth::JwtHandler;
use identity_service::config::DatabaseConfig;
use identity_service::domain::identity::ports::SchemaProvisioner;
use identity_service::domain::identity::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::pool;
use identity_service::outbound::repositories::SqliteCredentialStore;
use identity_service::outbound::repositories::SqliteSchemaProvisioner;
use sqlx::SqlitePool;

pub const JWT_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const DEMO_PASSWORD: &str = "healthvault-demo";

/// Argon2 cost low enough to keep the suite fast.
pub fn test_cost() -> HashingCost {
    HashingCost {
        memory_kib: 1024,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn test_authenticator() -> Arc<Authenticator> {
    Arc::new(Authenticator::with_cost(JWT_SECRET, test_cost()).expect("Invalid test cost"))
}

/// Options for spawning the test application
#[derive(Debug, Clone, Copy, Default)]
pub struct TestOptions {
    pub seed_demo_data: bool,
    pub conceal_unknown_actor: bool,
}

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: TestDb,
    pub api_client: reqwest::Client,
    pub jwt_handler: JwtHandler,
}

/// Test database helper: a fresh SQLite file per test
pub struct TestDb {
    pub pool: SqlitePool,
    pub path: PathBuf,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let authenticator = test_authenticator();

        let db = TestDb::new().await;
        let mut provisioner = SqliteSchemaProvisioner::new(db.pool.clone());
        if options.seed_demo_data {
            provisioner =
                provisioner.with_demo_seed(Arc::clone(&authenticator), DEMO_PASSWORD.to_string());
        }
        provisioner
            .provision()
            .await
            .expect("Failed to provision test database");

        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let store = Arc::new(SqliteCredentialStore::new(db.pool.clone()));
        let identity_service = Arc::new(
            IdentityService::new(store, authenticator)
                .with_unknown_actor_concealed(options.conceal_unknown_actor),
        );

        let router = create_router(identity_service);

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            port,
            db,
            api_client: reqwest::Client::new(),
            jwt_handler: JwtHandler::new(JWT_SECRET),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(&format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(&format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }
}

impl TestDb {
    /// Create a new test database with a unique file name
    pub async fn new() -> Self {
        let path = std::env::temp_dir().join(format!(
            "test_identity_service_{}.db",
            uuid::Uuid::new_v4().to_string().replace('-', "_")
        ));

        let pool = pool::connect(&DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 5,
        })
        .await
        .expect("Failed to open test database");

        Self { pool, path }
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }

    /// Tables, indexes and triggers currently defined.
    pub async fn schema_objects(&self) -> Vec<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT type || ':' || name FROM sqlite_master ORDER BY type, name",
        )
        .fetch_all(&self.pool)
        .await
        .expect("Failed to read schema")
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
