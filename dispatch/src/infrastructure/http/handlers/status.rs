//! Monitoring handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::boundary::ports::ParcelRepository;
use crate::clock;
use crate::di::AppState;
use crate::infrastructure::http::error::ApiError;

/// GET /api/status/daily — live status counts plus today's completions.
pub async fn daily(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, ApiError> {
    let today = clock::now().date_naive();
    let counts = state
        .parcel_repo
        .daily_status_counts(today)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let by_status: serde_json::Map<String, serde_json::Value> = counts
        .by_status
        .into_iter()
        .map(|(status, count)| (status, json!(count)))
        .collect();

    Ok(Json(json!({
        "status": "success",
        "today": today.to_string(),
        "status_counts": by_status,
        "today_counts": {
            "pickup_completed": counts.pickups_completed_today,
            "delivery_completed": counts.deliveries_completed_today,
        },
    })))
}
