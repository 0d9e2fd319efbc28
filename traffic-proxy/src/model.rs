//! Routing-engine payloads the proxy rewrites.
//!
//! Only the rewritten fields are typed; everything else the engine returns
//! is carried through flattened maps so the proxy stays transparent.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip: Option<Trip>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    #[serde(default)]
    pub legs: Vec<Leg>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub maneuvers: Vec<Maneuver>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maneuver {
    /// Travel time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Segment length in kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub street_names: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResponse {
    #[serde(default)]
    pub sources_to_targets: Vec<Vec<Option<MatrixCell>>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Travel time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Distance in kilometers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_round_trip_preserves_unknown_fields() {
        let raw = serde_json::json!({
            "trip": {
                "legs": [{
                    "maneuvers": [{"time": 30.0, "length": 0.4, "street_names": ["세종대로"], "type": 1}],
                    "summary": {"time": 30.0, "length": 0.4},
                    "shape": "encoded"
                }],
                "summary": {"time": 30.0, "length": 0.4},
                "locations": []
            },
            "id": "abc"
        });
        let parsed: RouteResponse = serde_json::from_value(raw.clone()).unwrap();
        let back = serde_json::to_value(&parsed).unwrap();
        assert_eq!(back["id"], "abc");
        assert_eq!(back["trip"]["legs"][0]["shape"], "encoded");
        assert_eq!(back["trip"]["legs"][0]["maneuvers"][0]["type"], 1);
    }
}
