//! Configuration Module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen host and port
    pub host: String,
    pub port: u16,

    /// Upstream routing engine
    pub valhalla_url: String,

    /// Speed feed key and base URL
    pub seoul_api_key: String,
    pub feed_base_url: String,

    /// Kakao REST API key for the search facade
    pub kakao_api_key: String,

    /// Seconds between harvest sweeps
    pub traffic_update_interval: u64,

    /// Path of the service-link → way-id mapping CSV
    pub mapping_file: String,

    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional env vars:
    /// - HOST (default: 0.0.0.0), PORT (default: 8003)
    /// - VALHALLA_URL: upstream engine (default: http://valhalla:8002)
    /// - SEOUL_API_KEY: speed feed key (default: empty, harvester idles)
    /// - KAKAO_API_KEY: search facade key (default: empty)
    /// - TRAFFIC_UPDATE_INTERVAL: sweep cadence in seconds (default: 300)
    /// - TRAFFIC_MAPPING_FILE: mapping CSV path
    ///   (default: /data/service_to_osm_mapping.csv)
    /// - RUST_LOG: log level (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8003".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;

        let valhalla_url =
            env::var("VALHALLA_URL").unwrap_or_else(|_| "http://valhalla:8002".to_string());

        let seoul_api_key = env::var("SEOUL_API_KEY").unwrap_or_default();
        let feed_base_url = env::var("TRAFFIC_FEED_URL")
            .unwrap_or_else(|_| "http://openapi.seoul.go.kr:8088".to_string());

        let kakao_api_key = env::var("KAKAO_API_KEY").unwrap_or_default();

        let traffic_update_interval = env::var("TRAFFIC_UPDATE_INTERVAL")
            .unwrap_or_else(|_| "300".to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidValue("TRAFFIC_UPDATE_INTERVAL".to_string(), e.to_string())
            })?;

        let mapping_file = env::var("TRAFFIC_MAPPING_FILE")
            .unwrap_or_else(|_| "/data/service_to_osm_mapping.csv".to_string());

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            valhalla_url,
            seoul_api_key,
            feed_base_url,
            kakao_api_key,
            traffic_update_interval,
            mapping_file,
            log_level,
        })
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.traffic_update_interval)
    }

    /// Get the HTTP listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
