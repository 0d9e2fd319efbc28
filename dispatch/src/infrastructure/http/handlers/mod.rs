//! HTTP handlers for the dispatch API.
//!
//! The pickup and delivery routers share the planner and the completion
//! handlers; only the wire vocabulary differs between the phases.

pub mod delivery;
pub mod pickup;
pub mod status;

use axum::Json;
use serde_json::{json, Value};

use crate::di::AppState;
use crate::domain::model::driver::{Phase, PICKUP_CUTOFF_LABEL};
use crate::domain::model::location::{HUB_NAME, HUB_POINT};
use crate::usecases::next_destination::PlannerOutcome;

use super::error::ApiError;

/// Log the caller's registered profile. Missing registrations are logged,
/// not rejected; the district maps stay authoritative for routing.
async fn log_driver_profile(state: &AppState, user_id: i64) {
    use crate::boundary::ports::DriverRepository;

    match state.driver_repo.find_by_user_id(user_id).await {
        Ok(Some(profile)) => {
            tracing::info!(
                user_id,
                driver = %profile.name,
                district = %profile.district,
                zone = %profile.zone,
                "driver request"
            );
        }
        Ok(None) => tracing::warn!(user_id, "no driver registration for authenticated user"),
        Err(e) => tracing::warn!(user_id, error = %e, "driver profile lookup failed"),
    }
}

/// Reject callers that are not drivers of the given phase.
fn require_phase_driver(state: &AppState, phase: Phase, user_id: i64) -> Result<(), ApiError> {
    let (map, message) = match phase {
        Phase::Pickup => (&state.pickup_districts, "수거 기사만 접근 가능합니다"),
        Phase::Delivery => (&state.delivery_districts, "배달 기사만 접근 가능합니다"),
    };
    if map.contains_driver(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(message.to_string()))
    }
}

fn hub_json() -> Value {
    json!({ "lat": HUB_POINT.lat, "lon": HUB_POINT.lon, "name": HUB_NAME })
}

/// Name of the remaining-stops field per phase.
fn remaining_key(phase: Phase) -> &'static str {
    match phase {
        Phase::Pickup => "remaining_pickups",
        Phase::Delivery => "remaining",
    }
}

/// Render a planner outcome into the phase's wire shape.
fn render_planner_outcome(phase: Phase, outcome: PlannerOutcome) -> Json<Value> {
    let remaining = remaining_key(phase);
    let body = match outcome {
        PlannerOutcome::Waiting { current_time, hours_left, minutes_left } => {
            let message = match phase {
                Phase::Pickup => format!(
                    "수거는 오전 7시부터 시작됩니다. {}시간 {}분 남았습니다.",
                    hours_left, minutes_left
                ),
                Phase::Delivery => format!(
                    "배달은 오후 3시부터 시작됩니다. {}시간 {}분 남았습니다.",
                    hours_left, minutes_left
                ),
            };
            json!({
                "status": "waiting",
                "message": message,
                "start_time": phase.window_open_label(),
                "current_time": current_time,
            })
        }
        PlannerOutcome::AtHub { current_location } => json!({
            "status": "at_hub",
            "message": "허브에 도착했습니다. 수고하셨습니다!",
            "current_location": current_location,
            remaining: 0,
            "is_last": true,
        }),
        PlannerOutcome::WaitingForOrders { current_time, current_location } => json!({
            "status": "waiting_for_orders",
            "message": format!(
                "현재 할당된 수거가 없습니다. 신규 요청을 대기 중입니다. (마감: {})",
                PICKUP_CUTOFF_LABEL
            ),
            "current_time": current_time,
            "cutoff_time": PICKUP_CUTOFF_LABEL,
            "current_location": current_location,
            "is_last": false,
            remaining: 0,
        }),
        PlannerOutcome::ReturnToHub { route, current_location, distance_to_hub } => {
            let message = match phase {
                Phase::Pickup => "모든 수거가 완료되었습니다. 허브로 복귀해주세요.",
                Phase::Delivery => "모든 배달이 완료되었습니다. 허브로 복귀해주세요.",
            };
            json!({
                "status": "return_to_hub",
                "message": message,
                "next_destination": hub_json(),
                "route": route,
                "is_last": true,
                remaining: 0,
                "current_location": current_location,
                "distance_to_hub": distance_to_hub,
            })
        }
        PlannerOutcome::Next { destination, route, remaining: count, current_location, algorithm } => {
            let mut destination_json =
                serde_json::to_value(&destination).unwrap_or_else(|_| json!({}));
            if phase == Phase::Delivery {
                if let Some(obj) = destination_json.as_object_mut() {
                    obj.insert("delivery_id".to_string(), json!(destination.parcel_id));
                    obj.insert("parcelId".to_string(), json!(destination.parcel_id.to_string()));
                    obj.insert("productName".to_string(), json!(destination.name));
                }
            }
            json!({
                "status": "success",
                "next_destination": destination_json,
                "route": route,
                "is_last": false,
                remaining: count,
                "current_location": current_location,
                "algorithm_used": algorithm.as_str(),
            })
        }
    };
    Json(body)
}
