//! Routing-engine response payloads.
//!
//! Only the fields the planner reads are typed; everything else the engine
//! returns is preserved through a flattened map so the payload reaches the
//! driver app unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded point of the route shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// One maneuver-aligned stop of the route, shown in the driver app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub instruction: String,
}

/// Full route response. `waypoints` and `coordinates` are attached by the
/// planner after extraction; the engine never sends them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<Trip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<Waypoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Vec<Coordinate>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TripSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub maneuvers: Vec<Maneuver>,
    /// Encoded polyline of the leg geometry, precision 6.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maneuver {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub street_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub begin_shape_index: Option<usize>,
    /// Segment length in kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Travel time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripSummary {
    /// Total length in kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    /// Total travel time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RoutePayload {
    /// Total route length from the trip summary, 0 when absent.
    pub fn summary_length(&self) -> f64 {
        self.trip
            .as_ref()
            .and_then(|t| t.summary.as_ref())
            .and_then(|s| s.length)
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = serde_json::json!({
            "trip": {
                "legs": [{
                    "maneuvers": [{"instruction": "직진", "street_names": ["한강대로"], "begin_shape_index": 0, "length": 1.2, "time": 90.0, "travel_mode": "drive"}],
                    "shape": "abc",
                    "summary": {"length": 1.2}
                }],
                "summary": {"length": 1.2, "time": 90.0},
                "status": 0
            },
            "id": "route-1"
        });
        let payload: RoutePayload = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&payload).unwrap();
        assert_eq!(back["trip"]["status"], 0);
        assert_eq!(back["id"], "route-1");
        assert_eq!(back["trip"]["legs"][0]["maneuvers"][0]["travel_mode"], "drive");
    }

    #[test]
    fn test_summary_length_defaults_to_zero() {
        let payload = RoutePayload {
            trip: None,
            waypoints: None,
            coordinates: None,
            extra: Map::new(),
        };
        assert_eq!(payload.summary_length(), 0.0);
    }
}
