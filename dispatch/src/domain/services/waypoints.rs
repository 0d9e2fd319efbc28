//! Waypoint extraction from routing-engine responses.
//!
//! The driver app renders the decoded route shape plus one waypoint per
//! maneuver. Maneuvers whose shape index falls outside the decoded geometry
//! get a zero coordinate rather than being dropped, so the waypoint list
//! always lines up with the maneuver list.

use tracing::warn;

use crate::domain::model::location::GeoPoint;
use crate::domain::model::route::{Coordinate, RoutePayload, Waypoint};

/// Decode the first leg's shape and pair every maneuver with its starting
/// coordinate, street name and instruction.
pub fn extract_waypoints(payload: &RoutePayload) -> (Vec<Waypoint>, Vec<Coordinate>) {
    let mut waypoints = Vec::new();
    let mut coordinates = Vec::new();

    let Some(trip) = payload.trip.as_ref() else {
        return (waypoints, coordinates);
    };
    let Some(leg) = trip.legs.first() else {
        return (waypoints, coordinates);
    };

    if let Some(shape) = leg.shape.as_deref() {
        match polyline::decode_polyline(shape, 6) {
            Ok(line) => {
                coordinates = line
                    .coords()
                    .map(|c| Coordinate { lat: c.y, lon: c.x })
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "failed to decode route shape");
            }
        }
    }

    for (i, maneuver) in leg.maneuvers.iter().enumerate() {
        let instruction = maneuver
            .instruction
            .clone()
            .unwrap_or_else(|| format!("구간 {}", i + 1));
        let name = maneuver
            .street_names
            .first()
            .cloned()
            .unwrap_or_else(|| format!("구간{}", i + 1));

        let begin_idx = maneuver.begin_shape_index.unwrap_or(0);
        let (lat, lon) = match coordinates.get(begin_idx) {
            Some(c) => (c.lat, c.lon),
            None => (0.0, 0.0),
        };

        waypoints.push(Waypoint { lat, lon, name, instruction });
    }

    (waypoints, coordinates)
}

/// Two-point stand-in used when a route carries no usable maneuvers:
/// the current position and the destination.
pub fn synthetic_waypoints(
    from: GeoPoint,
    start_instruction: &str,
    to: GeoPoint,
    to_name: &str,
    end_instruction: &str,
) -> (Vec<Waypoint>, Vec<Coordinate>) {
    let waypoints = vec![
        Waypoint {
            lat: from.lat,
            lon: from.lon,
            name: "현재위치".to_string(),
            instruction: start_instruction.to_string(),
        },
        Waypoint {
            lat: to.lat,
            lon: to.lon,
            name: to_name.to_string(),
            instruction: end_instruction.to_string(),
        },
    ];
    let coordinates = vec![
        Coordinate { lat: from.lat, lon: from.lon },
        Coordinate { lat: to.lat, lon: to.lon },
    ];
    (waypoints, coordinates)
}

/// Attach extracted waypoints to the payload, substituting the synthetic
/// pair when extraction yields nothing.
pub fn enrich_route(
    payload: &mut RoutePayload,
    from: GeoPoint,
    start_instruction: &str,
    to: GeoPoint,
    to_name: &str,
    end_instruction: &str,
) {
    let (mut waypoints, mut coordinates) = extract_waypoints(payload);
    if waypoints.is_empty() {
        (waypoints, coordinates) =
            synthetic_waypoints(from, start_instruction, to, to_name, end_instruction);
    }
    if payload.trip.is_some() {
        payload.waypoints = Some(waypoints);
        payload.coordinates = Some(coordinates);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Map;

    use super::*;
    use crate::domain::model::route::{Leg, Maneuver, Trip};

    fn maneuver(instruction: &str, street: Option<&str>, begin: usize) -> Maneuver {
        Maneuver {
            instruction: Some(instruction.to_string()),
            street_names: street.map(|s| vec![s.to_string()]).unwrap_or_default(),
            begin_shape_index: Some(begin),
            length: Some(1.0),
            time: Some(60.0),
            extra: Map::new(),
        }
    }

    fn payload_with(maneuvers: Vec<Maneuver>, shape: Option<&str>) -> RoutePayload {
        RoutePayload {
            trip: Some(Trip {
                legs: vec![Leg {
                    maneuvers,
                    shape: shape.map(|s| s.to_string()),
                    extra: Map::new(),
                }],
                summary: None,
                extra: Map::new(),
            }),
            waypoints: None,
            coordinates: None,
            extra: Map::new(),
        }
    }

    // Precision-6 encoding of (37.53, 126.96) -> (37.54, 126.97).
    fn encoded_shape() -> String {
        let line = geo_types::LineString::from(vec![(126.96, 37.53), (126.97, 37.54)]);
        polyline::encode_coordinates(line, 6).unwrap()
    }

    #[test]
    fn test_extracts_waypoint_per_maneuver() {
        let shape = encoded_shape();
        let payload = payload_with(
            vec![maneuver("출발", Some("한강대로"), 0), maneuver("도착", None, 1)],
            Some(&shape),
        );

        let (waypoints, coordinates) = extract_waypoints(&payload);
        assert_eq!(coordinates.len(), 2);
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].name, "한강대로");
        assert!((waypoints[0].lat - 37.53).abs() < 1e-5);
        assert_eq!(waypoints[1].name, "구간2");
        assert!((waypoints[1].lat - 37.54).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_shape_index_yields_zero() {
        let shape = encoded_shape();
        let payload = payload_with(vec![maneuver("도착", Some("역삼로"), 99)], Some(&shape));

        let (waypoints, _) = extract_waypoints(&payload);
        assert_eq!(waypoints[0].lat, 0.0);
        assert_eq!(waypoints[0].lon, 0.0);
    }

    #[test]
    fn test_missing_trip_yields_nothing() {
        let payload = RoutePayload {
            trip: None,
            waypoints: None,
            coordinates: None,
            extra: Map::new(),
        };
        let (waypoints, coordinates) = extract_waypoints(&payload);
        assert!(waypoints.is_empty());
        assert!(coordinates.is_empty());
    }

    #[test]
    fn test_enrich_falls_back_to_synthetic_pair() {
        let mut payload = payload_with(vec![], None);
        enrich_route(
            &mut payload,
            GeoPoint::new(37.5, 127.0),
            "수거 시작",
            GeoPoint::new(37.51, 127.01),
            "상품",
            "목적지 도착",
        );
        let waypoints = payload.waypoints.unwrap();
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].name, "현재위치");
        assert_eq!(waypoints[1].instruction, "목적지 도착");
        assert_eq!(payload.coordinates.unwrap().len(), 2);
    }
}
