//! Inkpost API Server
//!
//! Main entry point for the Inkpost backend service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpost_api::{AppState, create_router};
use inkpost_core::storage::{StorageConfig, StorageProvider, StorageService};
use inkpost_db::connect;
use inkpost_shared::{AppConfig, SessionTokenService, StorageSettings, TokenConfig};

/// Build the core storage config from the deserialized settings.
fn storage_config(settings: &StorageSettings) -> anyhow::Result<StorageConfig> {
    let provider = match settings.provider.as_str() {
        "s3" => StorageProvider::s3(
            &settings.endpoint,
            &settings.bucket,
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.region,
        ),
        "azure_blob" => StorageProvider::azure_blob(
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.bucket,
        ),
        "local" => StorageProvider::local_fs(&settings.root),
        other => anyhow::bail!("unknown storage provider: {other}"),
    };

    Ok(StorageConfig::new(provider, &settings.public_base_url)
        .with_max_file_size(settings.max_upload_size))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpost=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Create storage service
    let storage = StorageService::from_config(storage_config(&config.storage)?)
        .context("failed to initialize storage")?;
    info!(provider = %config.storage.provider, "Storage service configured");

    // Create session token service
    let tokens = SessionTokenService::new(TokenConfig {
        secret: config.auth.secret.clone(),
        session_expiry_secs: config.auth.session_expiry_secs,
    });

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        storage: Arc::new(storage),
        tokens: Arc::new(tokens),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
