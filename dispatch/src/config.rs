//! Configuration Module
//!
//! Loads configuration from environment variables.

use std::env;

use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen host
    pub host: String,

    /// Listen port
    pub port: u16,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// MySQL connection parts
    pub mysql_host: String,
    pub mysql_user: String,
    pub mysql_password: String,
    pub mysql_database: String,

    /// Traffic-proxied routing engine
    pub valhalla_host: String,
    pub valhalla_port: u16,

    /// LKH solver sidecar
    pub lkh_service_url: String,

    /// Kakao REST API key for geocoding
    pub kakao_api_key: String,

    /// Log level (e.g., "info", "debug", "trace")
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Required env vars:
    /// - JWT_SECRET: HS256 token secret
    /// - MYSQL_HOST / MYSQL_USER / MYSQL_PASSWORD / MYSQL_DATABASE
    ///
    /// Optional env vars:
    /// - HOST: listen host (default: 0.0.0.0)
    /// - PORT: listen port (default: 5000)
    /// - VALHALLA_HOST: traffic proxy host (default: traffic-proxy)
    /// - VALHALLA_PORT: traffic proxy port (default: 8003)
    /// - LKH_SERVICE_URL: solver endpoint (default: http://lkh:5001/solve)
    /// - KAKAO_API_KEY: geocoding key (default: empty, offline fallback only)
    /// - RUST_LOG: log level (default: "info")
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| ConfigError::MissingEnv("JWT_SECRET".to_string()))?;

        let mysql_host =
            env::var("MYSQL_HOST").map_err(|_| ConfigError::MissingEnv("MYSQL_HOST".to_string()))?;
        let mysql_user =
            env::var("MYSQL_USER").map_err(|_| ConfigError::MissingEnv("MYSQL_USER".to_string()))?;
        let mysql_password = env::var("MYSQL_PASSWORD")
            .map_err(|_| ConfigError::MissingEnv("MYSQL_PASSWORD".to_string()))?;
        let mysql_database = env::var("MYSQL_DATABASE")
            .map_err(|_| ConfigError::MissingEnv("MYSQL_DATABASE".to_string()))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;

        let valhalla_host =
            env::var("VALHALLA_HOST").unwrap_or_else(|_| "traffic-proxy".to_string());
        let valhalla_port = env::var("VALHALLA_PORT")
            .unwrap_or_else(|_| "8003".to_string())
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("VALHALLA_PORT".to_string(), e.to_string()))?;

        let lkh_service_url =
            env::var("LKH_SERVICE_URL").unwrap_or_else(|_| "http://lkh:5001/solve".to_string());

        let kakao_api_key = env::var("KAKAO_API_KEY").unwrap_or_default();

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            host,
            port,
            jwt_secret,
            mysql_host,
            mysql_user,
            mysql_password,
            mysql_database,
            valhalla_host,
            valhalla_port,
            lkh_service_url,
            kakao_api_key,
            log_level,
        })
    }

    /// MySQL connection URL for Sea-ORM.
    pub fn database_url(&self) -> String {
        format!(
            "mysql://{}:{}@{}/{}",
            self.mysql_user, self.mysql_password, self.mysql_host, self.mysql_database
        )
    }

    /// Base URL of the traffic-proxied routing engine.
    pub fn routing_base_url(&self) -> String {
        format!("http://{}:{}", self.valhalla_host, self.valhalla_port)
    }

    /// Get the HTTP listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
