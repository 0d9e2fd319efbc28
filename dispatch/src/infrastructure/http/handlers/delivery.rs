//! Delivery-phase handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::clock;
use crate::di::AppState;
use crate::domain::model::driver::Phase;
use crate::infrastructure::http::auth::AuthedDriver;
use crate::infrastructure::http::error::ApiError;
use crate::usecases::hub_arrival::HubArrivalError;

use super::{render_planner_outcome, require_phase_driver};

/// POST /api/delivery/import — convert today's completed pickups.
pub async fn import(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let today = clock::now().date_naive();
    let summary = state.phase_transition.import_today(today).await?;

    Ok(Json(json!({
        "status": "success",
        "converted": summary.converted,
        "by_district": summary.by_district,
        "geocoding_method": "kakao",
    }))
    .into_response())
}

/// POST /api/delivery/assign — assign converted deliveries by district.
pub async fn assign(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let today = clock::now().date_naive();
    let summary = state.phase_transition.assign_today(today).await?;

    let assignments: serde_json::Map<String, serde_json::Value> = summary
        .assignments
        .iter()
        .map(|(district, a)| {
            (district.clone(), json!({ "driver_id": a.driver_id, "count": a.count }))
        })
        .collect();

    Ok(Json(json!({
        "status": "success",
        "assignments": assignments,
        "geocoding_method": "kakao",
    }))
    .into_response())
}

/// GET /api/delivery/next — per-driver planner, delivery phase.
pub async fn next(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
) -> Result<Response, ApiError> {
    require_phase_driver(&state, Phase::Delivery, driver.user_id)?;
    super::log_driver_profile(&state, driver.user_id).await;

    let outcome = state.planner.handle(Phase::Delivery, driver.user_id, clock::now()).await?;
    Ok(render_planner_outcome(Phase::Delivery, outcome).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(rename = "deliveryId")]
    delivery_id: Option<i64>,
}

/// POST /api/delivery/complete — mark a delivery done.
pub async fn complete(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
    Json(body): Json<CompleteRequest>,
) -> Result<Response, ApiError> {
    let delivery_id = body
        .delivery_id
        .ok_or_else(|| ApiError::Validation("deliveryId required".to_string()))?;

    let outcome = state
        .complete
        .handle(Phase::Delivery, driver.user_id, delivery_id, clock::now())
        .await?;

    info!(driver_id = driver.user_id, delivery_id, "delivery completed");
    Ok(Json(json!({
        "status": "success",
        "message": "배달이 완료되었습니다",
        "remaining": outcome.remaining,
        "completed_at": outcome.completed_at,
    }))
    .into_response())
}

/// POST /api/delivery/hub-arrived — delivery driver reports hub arrival.
pub async fn hub_arrived(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
) -> Result<Response, ApiError> {
    require_phase_driver(&state, Phase::Delivery, driver.user_id)?;

    match state.hub_arrival.handle(Phase::Delivery, driver.user_id, clock::now()).await {
        Ok(outcome) => Ok(Json(json!({
            "status": "success",
            "message": "허브 도착이 완료되었습니다. 수고하셨습니다!",
            "location": {
                "lat": outcome.location.lat,
                "lon": outcome.location.lon,
                "name": outcome.location_name,
            },
            "arrival_time": outcome.arrival_time,
        }))
        .into_response()),
        Err(HubArrivalError::StopsOutstanding(count)) => Ok((
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "아직 완료하지 않은 배달이 있습니다",
                "remaining_deliveries": count,
            })),
        )
            .into_response()),
        Err(HubArrivalError::Repository(e)) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /api/delivery/status — liveness.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "geocoding": "kakao",
        "kakao_api_configured": state.kakao_configured,
    }))
}
