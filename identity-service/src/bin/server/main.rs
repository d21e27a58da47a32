use std::sync::Arc;

use auth::Authenticator;
use identity_service::config::Config;
use identity_service::domain::identity::ports::SchemaProvisioner;
use identity_service::domain::identity::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::repositories::pool;
use identity_service::outbound::repositories::SqliteCredentialStore;
use identity_service::outbound::repositories::SqliteSchemaProvisioner;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        database_url = %config.database.url,
        http_port = config.server.http_port,
        conceal_unknown_actor = config.auth.conceal_unknown_actor,
        seed_demo_data = config.provisioning.seed_demo_data,
        "Configuration loaded"
    );

    let authenticator = Arc::new(Authenticator::with_cost(
        config.jwt.secret.as_bytes(),
        config.password.cost(),
    )?);

    let sqlite_pool = pool::connect(&config.database).await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "sqlite",
        "Database connection pool created"
    );

    // Provisioning must finish before any request can reach the service.
    let mut provisioner = SqliteSchemaProvisioner::new(sqlite_pool.clone());
    if config.provisioning.seed_demo_data {
        if let Some(password) = config.provisioning.demo_password.clone() {
            provisioner = provisioner.with_demo_seed(Arc::clone(&authenticator), password);
        }
    }
    provisioner.provision().await?;
    tracing::info!(database = "sqlite", "Database provisioning completed");

    let credential_store = Arc::new(SqliteCredentialStore::new(sqlite_pool));
    let identity_service = Arc::new(
        IdentityService::new(credential_store, Arc::clone(&authenticator))
            .with_unknown_actor_concealed(config.auth.conceal_unknown_actor),
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(identity_service);
    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
