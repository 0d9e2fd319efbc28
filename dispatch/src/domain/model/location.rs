//! Geographic value objects shared by the planner and the adapters.

use serde::{Deserialize, Serialize};

/// A WGS-84 coordinate pair.
///
/// Two points are equal when their coordinates are equal; the planner treats
/// points as opaque once geocoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// The fixed hub all drivers start from and return to (용산역).
pub const HUB_POINT: GeoPoint = GeoPoint {
    lat: 37.5299,
    lon: 126.9648,
};

/// Display name of the hub.
pub const HUB_NAME: &str = "용산역";

/// A geocoded stop the planner feeds into the travel-time matrix.
///
/// Index 0 of the matrix is always the driver's current position; every
/// other entry carries the parcel it stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopLocation {
    pub lat: f64,
    pub lon: f64,
    pub parcel_id: i64,
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
    #[serde(rename = "recipientName", skip_serializing_if = "Option::is_none")]
    pub recipient_name: Option<String>,
    #[serde(rename = "recipientPhone", skip_serializing_if = "Option::is_none")]
    pub recipient_phone: Option<String>,
}

impl StopLocation {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}
