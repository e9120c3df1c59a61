//! Arcade Service - HTTP API for the game catalog.
//!
//! This is the main entry point for the arcade service.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arcade_service::{create_router, AppState, ServiceConfig};
use arcade_store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,arcade=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Arcade Service");

    // Load configuration from environment
    let config = ServiceConfig::from_env();

    tracing::info!(
        listen_addr = %config.listen_addr,
        memory_store = config.uses_memory_store(),
        max_connections = config.database_max_connections,
        secure_cookies = config.secure_cookies,
        "Service configuration loaded"
    );

    let store: Arc<dyn Store> = match config.database_url.as_deref() {
        Some(url) if !config.uses_memory_store() => {
            tracing::info!("Connecting to PostgreSQL");
            Arc::new(PgStore::connect_lazy(url, config.database_max_connections)?)
        }
        _ => {
            tracing::warn!("DATABASE_URL not set - serving from an empty in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    // Build app state
    let state = AppState::new(store, config.clone());

    // Create the router
    let app = create_router(state);

    // Start HTTP server
    tracing::info!(listen_addr = %config.listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}
