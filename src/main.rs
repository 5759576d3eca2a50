//! Main entry point for the collaborative editing server.
//!
//! This binary seeds the shared document and serves the editor WebSocket
//! using the Axum web framework.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use delta_sync::server::{AppState, create_router};
use delta_sync::{Config, RandomIdentities, SyncEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.log).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting delta-sync server...");

    let document = config
        .seed_document()
        .context("failed to seed the shared document")?;
    info!(length = document.len(), "document seeded");

    let engine = SyncEngine::new(document, RandomIdentities)
        .with_options(config.engine_options())
        .into_shared();
    let state = AppState::new(engine, config.outbox_capacity());
    let app = create_router(state, &config.path);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("Server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  GET  {} - Editor WebSocket", config.path);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
