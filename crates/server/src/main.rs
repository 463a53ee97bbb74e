use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidscan_core::{
    load_config, validate_config, BlobStore, DetectionOrchestrator, FsBlobStore,
    HttpInferenceClient, InferenceClient, ResultReader, SanitizedConfig, SqliteStatusStore,
    StatusStore,
};
use vidscan_server::{create_router, AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("VIDSCAN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = SanitizedConfig::from(&config);
    let config_json = serde_json::to_string(&sanitized).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        "Configuration loaded successfully (hash {})",
        &config_hash[..16]
    );
    info!("Database path: {:?}", config.database.path);
    info!("Inference service: {}", sanitized.inference.url);

    // Status store
    let store: Arc<dyn StatusStore> = Arc::new(
        SqliteStatusStore::new(&config.database.path).context("Failed to open status store")?,
    );
    info!("Status store initialized");

    // Blob store
    let blobs = FsBlobStore::new(config.blob_store.root.clone());
    blobs
        .ensure_bucket(&config.blob_store.video_bucket)
        .await
        .with_context(|| {
            format!(
                "Failed to prepare bucket {} under {:?}",
                config.blob_store.video_bucket, config.blob_store.root
            )
        })?;
    let blobs: Arc<dyn BlobStore> = Arc::new(blobs);
    info!("Blob store ready at {:?}", config.blob_store.root);

    // Inference client
    let inference: Arc<dyn InferenceClient> = Arc::new(
        HttpInferenceClient::new(&config.inference)
            .context("Failed to create inference client")?,
    );

    let orchestrator = Arc::new(
        DetectionOrchestrator::new(
            Arc::clone(&store),
            blobs,
            Arc::clone(&inference),
            config.blob_store.video_bucket.clone(),
        )
        .with_archive_limit(config.server.body_limit_bytes() as u64),
    );
    let results = ResultReader::new(store, inference);

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        Arc::clone(&orchestrator),
        results,
    ));

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    let canceled = orchestrator.shutdown_all();
    info!("Canceled {} in-flight job(s)", canceled);

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
