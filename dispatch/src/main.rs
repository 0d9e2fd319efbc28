//! Dispatch Service
//!
//! HTTP server for parcel dispatch: ingest, per-driver next-stop planning,
//! completion and the pickup-to-delivery phase transition.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dispatch::config::Config;
use dispatch::di::AppState;
use dispatch::infrastructure::http;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting Dispatch Service...");

    // Initialize application state
    let state = Arc::new(AppState::new(&config).await.map_err(|e| {
        error!(error = %e, "Failed to initialize application state");
        e
    })?);

    let app = http::router(state);

    let addr = config.listen_addr();
    info!(address = %addr, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for ctrl-c signal");
                return;
            }
            info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
