//! Live-traffic rewriting of route and matrix responses.
//!
//! Per-maneuver effective speed combines four multiplicative factors: a
//! base speed from segment length and street-name keywords, the network
//! congestion factor, an area factor from region keywords, and the
//! time-of-day factor. Rewritten times are only accepted within a sanity
//! band relative to the engine's original estimate.

use serde_json::json;
use tracing::{debug, info};

use crate::model::{MatrixResponse, RouteResponse};
use crate::speed_table::{Congestion, SpeedTable};

/// Effective speed clamp, km/h.
const SPEED_FLOOR: f64 = 8.0;
const SPEED_CEIL: f64 = 80.0;

/// Acceptance band for rewritten maneuver times.
const ROUTE_RATIO_MIN: f64 = 0.3;
const ROUTE_RATIO_MAX: f64 = 3.0;

/// Acceptance band for rewritten matrix cells.
const MATRIX_RATIO_MIN: f64 = 0.5;
const MATRIX_RATIO_MAX: f64 = 2.0;

/// Base speed from segment length, bumped by street-name class keywords.
fn base_speed(street_text: &str, length_km: f64) -> f64 {
    let mut base: f64 = if length_km >= 1.5 {
        50.0
    } else if length_km >= 0.5 {
        35.0
    } else {
        25.0
    };

    if ["고속도로", "순환로", "대로"].iter().any(|k| street_text.contains(k)) {
        base = base.max(40.0);
    } else if street_text.contains("로") {
        base = base.max(30.0);
    } else if ["길", "동"].iter().any(|k| street_text.contains(k)) {
        base = base.min(30.0);
    }

    base
}

/// Area factor from region keywords in the street names.
fn area_factor(street_text: &str) -> f64 {
    if ["강남", "테헤란", "서초", "역삼"].iter().any(|k| street_text.contains(k)) {
        0.75
    } else if ["종로", "을지로", "명동", "세종대로", "중구"].iter().any(|k| street_text.contains(k)) {
        0.80
    } else if ["강변북로", "올림픽대로", "한강대로"].iter().any(|k| street_text.contains(k)) {
        1.30
    } else if ["외곽순환", "강서", "노원", "도봉"].iter().any(|k| street_text.contains(k)) {
        1.15
    } else {
        1.0
    }
}

/// Time-of-day factor for the local hour.
fn time_factor(hour: u32) -> f64 {
    if (7..=9).contains(&hour) || (18..=20).contains(&hour) {
        0.60
    } else if (12..=14).contains(&hour) {
        0.80
    } else if hour >= 22 || hour <= 6 {
        1.40
    } else {
        1.0
    }
}

/// Effective speed for one maneuver, clamped to the plausible range.
pub fn effective_speed(
    street_names: &[String],
    length_km: f64,
    congestion: Congestion,
    hour: u32,
) -> f64 {
    let street_text = street_names.join(" ").to_lowercase();
    let speed = base_speed(&street_text, length_km)
        * congestion.route_factor()
        * area_factor(&street_text)
        * time_factor(hour);
    speed.clamp(SPEED_FLOOR, SPEED_CEIL)
}

/// Rewrite a route response in place.
///
/// Without the live-traffic flag or without usable speed observations the
/// response passes through untouched, marked `has_traffic: false`.
pub fn apply_live_traffic(
    response: &mut RouteResponse,
    table: &SpeedTable,
    use_traffic: bool,
    hour: u32,
) {
    let congestion = table.congestion();
    let Some(trip) = response.trip.as_mut() else {
        return;
    };

    let Some(congestion) = congestion.filter(|_| use_traffic) else {
        trip.extra.insert("has_traffic".to_string(), json!(false));
        trip.extra.insert("traffic_data_count".to_string(), json!(table.len()));
        trip.extra.insert("real_traffic_applied".to_string(), json!(false));
        return;
    };

    let mut applied_segments = 0usize;
    let mut total_segments = 0usize;
    let mut total_original_time = 0.0;
    let mut total_new_time = 0.0;

    for leg in &mut trip.legs {
        let mut leg_original_time = 0.0;
        let mut leg_new_time = 0.0;

        for maneuver in &mut leg.maneuvers {
            total_segments += 1;

            let original_time = maneuver.time.unwrap_or(0.0);
            let length = maneuver.length.unwrap_or(0.0);
            leg_original_time += original_time;

            if length <= 0.0 {
                leg_new_time += original_time;
                continue;
            }

            let speed = effective_speed(&maneuver.street_names, length, congestion, hour);
            let new_time = length / speed * 3600.0;
            let ratio = if original_time > 0.0 { new_time / original_time } else { 1.0 };

            if (ROUTE_RATIO_MIN..=ROUTE_RATIO_MAX).contains(&ratio) {
                maneuver.time = Some(new_time);
                maneuver.extra.insert("original_time".to_string(), json!(original_time));
                maneuver.extra.insert("real_speed_applied".to_string(), json!(speed));
                leg_new_time += new_time;
                applied_segments += 1;
                debug!(speed, new_time, original_time, "maneuver time rewritten");
            } else {
                leg_new_time += original_time;
            }
        }

        if let Some(summary) = leg.summary.as_mut() {
            summary.extra.insert("original_time".to_string(), json!(leg_original_time));
            summary.time = Some(leg_new_time);
        }

        total_original_time += leg_original_time;
        total_new_time += leg_new_time;
    }

    if let Some(summary) = trip.summary.as_mut() {
        summary.extra.insert("original_time".to_string(), json!(total_original_time));
        summary.extra.insert("traffic_time".to_string(), json!(total_new_time));
        summary.time = Some(total_new_time);
    }

    trip.extra.insert("has_traffic".to_string(), json!(true));
    trip.extra.insert("traffic_data_count".to_string(), json!(table.len()));
    trip.extra.insert("real_traffic_applied".to_string(), json!(true));
    trip.extra.insert("applied_segments".to_string(), json!(applied_segments));
    trip.extra.insert("total_segments".to_string(), json!(total_segments));

    info!(
        applied_segments,
        total_segments,
        congestion = congestion.label,
        "live traffic applied to route"
    );
}

/// Rewrite a matrix response in place using the distance-tier speed model.
pub fn apply_traffic_to_matrix(response: &mut MatrixResponse, table: &SpeedTable) {
    let Some(congestion) = table.congestion() else {
        return;
    };
    let factor = congestion.matrix_factor();

    let mut applied = 0usize;
    for row in &mut response.sources_to_targets {
        for cell in row.iter_mut().flatten() {
            let (Some(original_time), Some(distance)) = (cell.time, cell.distance) else {
                continue;
            };
            if distance <= 0.0 {
                continue;
            }

            let tier_speed = if distance >= 5.0 {
                45.0
            } else if distance >= 2.0 {
                35.0
            } else {
                25.0
            };
            let expected_speed = tier_speed * factor;
            let new_time = distance / expected_speed * 3600.0;
            let ratio = if original_time > 0.0 { new_time / original_time } else { 1.0 };

            if (MATRIX_RATIO_MIN..=MATRIX_RATIO_MAX).contains(&ratio) {
                cell.time = Some(new_time);
                cell.extra.insert("original_time".to_string(), json!(original_time));
                cell.extra.insert("traffic_applied".to_string(), json!(true));
                cell.extra.insert("applied_speed".to_string(), json!(expected_speed));
                applied += 1;
            }
        }
    }

    info!(applied, slow_ratio = congestion.slow_ratio, "live traffic applied to matrix");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::Map;

    use super::*;
    use crate::model::{Leg, Maneuver, MatrixCell, Summary, Trip};

    fn free_flow_table() -> SpeedTable {
        SpeedTable::new(
            (0..10)
                .map(|i| (format!("way{}", i), 45.0))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn maneuver(time: f64, length: f64, street: &str) -> Maneuver {
        Maneuver {
            time: Some(time),
            length: Some(length),
            street_names: vec![street.to_string()],
            extra: Map::new(),
        }
    }

    fn route_with(maneuvers: Vec<Maneuver>) -> RouteResponse {
        let leg_time: f64 = maneuvers.iter().filter_map(|m| m.time).sum();
        RouteResponse {
            trip: Some(Trip {
                legs: vec![Leg {
                    maneuvers,
                    summary: Some(Summary {
                        time: Some(leg_time),
                        length: None,
                        extra: Map::new(),
                    }),
                    extra: Map::new(),
                }],
                summary: Some(Summary { time: Some(leg_time), length: None, extra: Map::new() }),
                extra: Map::new(),
            }),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_factors() {
        assert_eq!(time_factor(8), 0.60);
        assert_eq!(time_factor(19), 0.60);
        assert_eq!(time_factor(13), 0.80);
        assert_eq!(time_factor(23), 1.40);
        assert_eq!(time_factor(3), 1.40);
        assert_eq!(time_factor(10), 1.0);

        assert_eq!(area_factor("테헤란로"), 0.75);
        assert_eq!(area_factor("을지로 3가"), 0.80);
        assert_eq!(area_factor("올림픽대로"), 1.30);
        assert_eq!(area_factor("노원로"), 1.15);
        assert_eq!(area_factor("아무 길"), 1.0);

        assert_eq!(base_speed("한남대로", 0.3), 40.0);
        assert_eq!(base_speed("백범로", 0.3), 30.0);
        assert_eq!(base_speed("골목길", 2.0), 30.0);
        assert_eq!(base_speed("", 2.0), 50.0);
        assert_eq!(base_speed("", 0.8), 35.0);
    }

    #[test]
    fn test_effective_speed_is_clamped() {
        let congestion = Congestion { slow_ratio: 0.9, label: "혼잡" };
        // tiny local street in the Gangnam core at rush hour
        let speed = effective_speed(&["역삼동".to_string()], 0.1, congestion, 8);
        assert!(speed >= SPEED_FLOOR);

        let free = Congestion { slow_ratio: 0.0, label: "원활" };
        let speed = effective_speed(&["올림픽대로".to_string()], 3.0, free, 2);
        assert!(speed <= SPEED_CEIL);
    }

    #[test]
    fn test_rewritten_times_stay_in_band() {
        let table = free_flow_table();
        let mut response = route_with(vec![
            maneuver(120.0, 1.0, "세종대로"),
            maneuver(300.0, 4.0, "올림픽대로"),
            maneuver(45.0, 0.2, "골목길"),
        ]);
        let original: Vec<f64> = response.trip.as_ref().unwrap().legs[0]
            .maneuvers
            .iter()
            .map(|m| m.time.unwrap())
            .collect();

        apply_live_traffic(&mut response, &table, true, 10);

        let trip = response.trip.as_ref().unwrap();
        for (m, orig) in trip.legs[0].maneuvers.iter().zip(original) {
            let ratio = m.time.unwrap() / orig;
            assert!(
                (ROUTE_RATIO_MIN..=ROUTE_RATIO_MAX).contains(&ratio),
                "ratio {} out of band",
                ratio
            );
        }
        assert_eq!(trip.extra["has_traffic"], json!(true));
        assert_eq!(trip.extra["total_segments"], json!(3));
    }

    #[test]
    fn test_out_of_band_rewrite_keeps_original_time() {
        let table = free_flow_table();
        // 100 s for 10 meters: any plausible speed gives a ratio below 0.3
        let mut response = route_with(vec![maneuver(100.0, 0.01, "세종대로")]);

        apply_live_traffic(&mut response, &table, true, 10);

        let trip = response.trip.as_ref().unwrap();
        let m = &trip.legs[0].maneuvers[0];
        assert_eq!(m.time, Some(100.0));
        assert!(!m.extra.contains_key("original_time"));
        assert_eq!(trip.extra["applied_segments"], json!(0));
    }

    #[test]
    fn test_no_traffic_flag_passes_through() {
        let table = free_flow_table();
        let mut response = route_with(vec![maneuver(120.0, 1.0, "세종대로")]);

        apply_live_traffic(&mut response, &table, false, 10);

        let trip = response.trip.as_ref().unwrap();
        assert_eq!(trip.legs[0].maneuvers[0].time, Some(120.0));
        assert_eq!(trip.extra["has_traffic"], json!(false));
        assert_eq!(trip.extra["real_traffic_applied"], json!(false));
    }

    #[test]
    fn test_leg_and_trip_summaries_resummed() {
        let table = free_flow_table();
        let mut response = route_with(vec![
            maneuver(120.0, 1.0, "세종대로"),
            maneuver(200.0, 2.0, "한강대로"),
        ]);

        apply_live_traffic(&mut response, &table, true, 10);

        let trip = response.trip.as_ref().unwrap();
        let leg_sum: f64 = trip.legs[0].maneuvers.iter().filter_map(|m| m.time).sum();
        let leg_summary = trip.legs[0].summary.as_ref().unwrap();
        assert!((leg_summary.time.unwrap() - leg_sum).abs() < 1e-9);
        assert_eq!(leg_summary.extra["original_time"], json!(320.0));

        let trip_summary = trip.summary.as_ref().unwrap();
        assert!((trip_summary.time.unwrap() - leg_sum).abs() < 1e-9);
        assert_eq!(trip_summary.extra["traffic_time"], json!(trip_summary.time.unwrap()));
    }

    fn matrix_with(cells: Vec<(f64, f64)>) -> MatrixResponse {
        MatrixResponse {
            sources_to_targets: vec![cells
                .into_iter()
                .map(|(time, distance)| {
                    Some(MatrixCell {
                        time: Some(time),
                        distance: Some(distance),
                        extra: Map::new(),
                    })
                })
                .collect()],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_matrix_rewrite_band() {
        let table = free_flow_table();
        // 6 km at 45 km/h is 480 s; original 400 s gives an in-band ratio
        let mut response = matrix_with(vec![(400.0, 6.0), (10.0, 6.0), (0.0, 0.0)]);

        apply_traffic_to_matrix(&mut response, &table);

        let row = &response.sources_to_targets[0];
        let rewritten = row[0].as_ref().unwrap();
        assert!((rewritten.time.unwrap() - 480.0).abs() < 1e-9);
        assert_eq!(rewritten.extra["traffic_applied"], json!(true));
        assert_eq!(rewritten.extra["original_time"], json!(400.0));

        // ratio 48x is far out of band; untouched
        let kept = row[1].as_ref().unwrap();
        assert_eq!(kept.time, Some(10.0));
        assert!(!kept.extra.contains_key("traffic_applied"));

        // zero distance is skipped
        let zero = row[2].as_ref().unwrap();
        assert_eq!(zero.time, Some(0.0));
    }

    #[test]
    fn test_matrix_congestion_slows_expected_speed() {
        let congested = SpeedTable::new(
            (0..10)
                .map(|i| (format!("way{}", i), 15.0))
                .collect::<HashMap<_, _>>(),
        );
        // congested factor 0.7: 3 km at 35*0.7=24.5 km/h -> ~440.8 s
        let mut response = matrix_with(vec![(300.0, 3.0)]);
        apply_traffic_to_matrix(&mut response, &congested);

        let cell = response.sources_to_targets[0][0].as_ref().unwrap();
        assert!((cell.time.unwrap() - 3.0 / 24.5 * 3600.0).abs() < 1e-6);
    }
}
