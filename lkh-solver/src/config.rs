//! Configuration Module
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

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

    /// Path of the LKH executable
    pub executable: PathBuf,

    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional env vars:
    /// - HOST (default: 0.0.0.0), PORT (default: 5001)
    /// - LKH_EXECUTABLE: solver binary path (default: /usr/local/bin/LKH)
    /// - RUST_LOG: log level (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5001".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;

        let executable = PathBuf::from(
            env::var("LKH_EXECUTABLE").unwrap_or_else(|_| "/usr/local/bin/LKH".to_string()),
        );

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self { host, port, executable, log_level })
    }

    /// Get the HTTP listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
