// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend Bootstrap API Server
//!
//! Signs users in with Google, issues access tokens and serves user
//! profiles and profile photos.

use backend_bootstrap::{
    config::{Config, FileStoreBackend, UserStoreBackend},
    db::{FirestoreUserStore, LocalUserStore, UserStore},
    storage::{GcsObjectStore, LocalObjectStore, ObjectStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Backend Bootstrap API");

    // User store
    let users: Arc<dyn UserStore> = match &config.user_store {
        UserStoreBackend::Local { path } => {
            tracing::info!(path = %path.display(), "Using local user store");
            Arc::new(LocalUserStore::open(path).await?)
        }
        UserStoreBackend::Firestore { project_id } => {
            tracing::info!(project = %project_id, "Using Firestore user store");
            Arc::new(FirestoreUserStore::new(project_id).await?)
        }
    };

    // File store
    let files: Arc<dyn ObjectStore> = match &config.file_store {
        FileStoreBackend::Local { dir } => {
            tracing::info!(dir = %dir.display(), "Using local file store");
            Arc::new(LocalObjectStore::open(dir).await?)
        }
        FileStoreBackend::Gcs { bucket } => {
            tracing::info!(bucket = %bucket, "Using Cloud Storage file store");
            Arc::new(GcsObjectStore::new(bucket).await?)
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), users, files)?);

    // Expired state and access tokens are also dropped lazily on read
    let janitor = state.sessions.spawn_janitor(config.session_cleanup_interval);
    tracing::info!(
        every_secs = config.session_cleanup_interval.as_secs(),
        "Session cache janitor started"
    );

    // Build router
    let app = backend_bootstrap::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    janitor.abort();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("backend_bootstrap=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
