//! LKH Solver Service
//!
//! HTTP sidecar wrapping the LKH executable: accepts a travel-time matrix,
//! returns the optimized tour and its cost.

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lkh_solver::config::Config;
use lkh_solver::http::{router, SolverState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        e
    })?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting LKH Solver Service...");
    if !config.executable.exists() {
        warn!(path = %config.executable.display(), "LKH executable not found at startup");
    }

    let state = Arc::new(SolverState { executable: config.executable.clone() });

    let addr = config.listen_addr();
    info!(address = %addr, executable = %config.executable.display(), "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state))
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
