//! Geocoder Port
//!
//! Address resolution with a built-in fallback ladder. The port is
//! infallible: failures of the external provider degrade to the offline
//! district table and ultimately the city-hall coordinate, so callers always
//! get a usable point with a confidence score.

use async_trait::async_trait;

use crate::domain::model::location::GeoPoint;

/// Result of resolving a free-text address.
#[derive(Debug, Clone, PartialEq)]
pub struct Geocoded {
    pub point: GeoPoint,
    /// Canonical address or place label for the matched location.
    pub label: String,
    /// `[0, 1]`; 0.95 structured match, 0.85 keyword match, 0.5 offline
    /// district table, 0.1 city-hall fallback.
    pub confidence: f64,
}

/// Geocoder Port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve an address to coordinates.
    async fn geocode(&self, address: &str) -> Geocoded;

    /// Resolve the administrative district of an address, preferring the
    /// provider's structured region field over token scanning.
    async fn resolve_district(&self, address: &str) -> Option<String>;
}
