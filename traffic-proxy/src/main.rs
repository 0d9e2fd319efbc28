//! Traffic Proxy
//!
//! Fronts the routing engine: harvests live speeds from the public feed on
//! an interval and rewrites route and matrix responses with them.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use traffic_proxy::config::Config;
use traffic_proxy::geocoding::KakaoSearch;
use traffic_proxy::harvester::{load_mappings, Harvester};
use traffic_proxy::http::{router, ProxyState};
use traffic_proxy::speed_table::SpeedTableHandle;

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

    info!("Starting Traffic Proxy...");

    let speed_table = Arc::new(SpeedTableHandle::new());

    // Missing mapping file leaves the proxy serving untouched engine
    // responses; that is degraded, not fatal.
    let mapping = match load_mappings(Path::new(&config.mapping_file)) {
        Ok(mapping) => mapping,
        Err(e) => {
            error!(path = %config.mapping_file, error = %e, "mapping file unavailable");
            Default::default()
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if mapping.is_empty() {
        warn!("no service-link mappings, speed harvester idle");
    } else {
        let harvester = Harvester::new(
            config.feed_base_url.clone(),
            config.seoul_api_key.clone(),
            mapping,
            speed_table.clone(),
            config.sweep_interval(),
        );
        tokio::spawn(harvester.run(shutdown_rx));
        info!(interval = config.traffic_update_interval, "speed harvester started");
    }

    let state = Arc::new(ProxyState {
        client: reqwest::Client::new(),
        valhalla_url: config.valhalla_url.clone(),
        speed_table,
        kakao: KakaoSearch::new(config.kakao_api_key.clone()),
    });

    let addr = config.listen_addr();
    info!(address = %addr, upstream = %config.valhalla_url, "HTTP server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for ctrl-c signal");
                return;
            }
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    Ok(())
}
