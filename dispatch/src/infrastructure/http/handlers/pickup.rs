//! Pickup-phase handlers.

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
use crate::domain::model::driver::{Phase, PICKUP_CUTOFF_LABEL};
use crate::infrastructure::http::auth::AuthedDriver;
use crate::infrastructure::http::error::ApiError;
use crate::usecases::hub_arrival::HubArrivalError;
use crate::usecases::ingest::IngestOutcome;
use crate::usecases::phase_transition::SweepOutcome;

use super::{log_driver_profile, render_planner_outcome, require_phase_driver};

#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(rename = "parcelId")]
    parcel_id: Option<i64>,
}

/// POST /api/pickup/webhook — ingest a new parcel announcement.
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    Json(body): Json<WebhookRequest>,
) -> Result<Response, ApiError> {
    let parcel_id = body
        .parcel_id
        .ok_or_else(|| ApiError::Validation("parcelId is required".to_string()))?;

    let outcome = state.ingest.handle(parcel_id, clock::now()).await?;
    let body = match outcome {
        IngestOutcome::ScheduledTomorrow { scheduled_date, current_time } => json!({
            "status": "scheduled_tomorrow",
            "message": "정오 12시 이후 요청은 다음날 수거로 처리됩니다.",
            "scheduled_date": scheduled_date.to_string(),
            "cutoff_time": PICKUP_CUTOFF_LABEL,
            "current_time": current_time,
        }),
        IngestOutcome::AlreadyProcessed => json!({ "status": "already_processed" }),
        IngestOutcome::Assigned { district, driver_id, coordinates } => json!({
            "status": "success",
            "parcelId": parcel_id,
            "district": district,
            "driverId": driver_id,
            "coordinates": coordinates,
            "scheduled_for": "today",
        }),
    };
    Ok(Json(body).into_response())
}

/// GET /api/pickup/next — per-driver planner, pickup phase.
pub async fn next(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
) -> Result<Response, ApiError> {
    require_phase_driver(&state, Phase::Pickup, driver.user_id)?;
    log_driver_profile(&state, driver.user_id).await;

    let outcome = state.planner.handle(Phase::Pickup, driver.user_id, clock::now()).await?;
    Ok(render_planner_outcome(Phase::Pickup, outcome).into_response())
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    #[serde(rename = "parcelId")]
    parcel_id: Option<i64>,
}

/// POST /api/pickup/complete — mark a pickup done.
pub async fn complete(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
    Json(body): Json<CompleteRequest>,
) -> Result<Response, ApiError> {
    let parcel_id = body
        .parcel_id
        .ok_or_else(|| ApiError::Validation("parcelId is required".to_string()))?;

    let outcome = state
        .complete
        .handle(Phase::Pickup, driver.user_id, parcel_id, clock::now())
        .await?;

    info!(driver_id = driver.user_id, parcel_id, "pickup completed");
    Ok(Json(json!({
        "status": "success",
        "message": "수거가 완료되었습니다",
        "remaining_pickups": outcome.remaining,
        "completed_at": outcome.completed_at,
    }))
    .into_response())
}

/// POST /api/pickup/hub-arrived — pickup driver reports hub arrival.
pub async fn hub_arrived(
    State(state): State<Arc<AppState>>,
    driver: AuthedDriver,
) -> Result<Response, ApiError> {
    require_phase_driver(&state, Phase::Pickup, driver.user_id)?;

    match state.hub_arrival.handle(Phase::Pickup, driver.user_id, clock::now()).await {
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
                "error": "아직 완료하지 않은 수거가 있습니다",
                "remaining_pickups": count,
            })),
        )
            .into_response()),
        Err(HubArrivalError::Repository(e)) => Err(ApiError::Internal(e.to_string())),
    }
}

/// GET /api/pickup/all-completed — phase-transition sweep.
pub async fn all_completed(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let today = clock::now().date_naive();
    let outcome = state.phase_transition.sweep(today).await?;

    let body = match outcome {
        SweepOutcome::NotYet {
            remaining,
            completed_count,
            first_pending_driver,
            first_pending_count,
        } => json!({
            "completed": false,
            "remaining": remaining,
            "completed_count": completed_count,
            "driver_status": format!(
                "Driver {} has {} pending",
                first_pending_driver, first_pending_count
            ),
        }),
        SweepOutcome::Converted { total_converted, import, assign } => json!({
            "completed": true,
            "message": "All pickups completed and converted to delivery",
            "total_converted": total_converted,
            "imported": import.converted,
            "assignments": assign
                .assignments
                .iter()
                .map(|(district, a)| {
                    (district.clone(), json!({ "driver_id": a.driver_id, "count": a.count }))
                })
                .collect::<serde_json::Map<_, _>>(),
        }),
        SweepOutcome::NoPickupsToday => json!({
            "completed": true,
            "message": "No pickups today",
            "total_completed": 0,
        }),
    };
    Ok(Json(body).into_response())
}

/// GET /api/pickup/status — liveness.
pub async fn status() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
