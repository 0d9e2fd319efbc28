//! Proxy HTTP surface.
//!
//! `/route` and `/matrix` forward to the routing engine and rewrite the
//! response when the caller asked for live traffic; `/sources_to_targets`
//! is a raw pass-through kept for callers that want engine output untouched.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Timelike;
use chrono_tz::Asia::Seoul;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::geocoding::KakaoSearch;
use crate::model::{MatrixResponse, RouteResponse};
use crate::rewrite::{apply_live_traffic, apply_traffic_to_matrix};
use crate::speed_table::SpeedTableHandle;

const ROUTE_TIMEOUT: Duration = Duration::from_secs(30);
const MATRIX_TIMEOUT: Duration = Duration::from_secs(60);
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// Shared proxy state.
pub struct ProxyState {
    pub client: reqwest::Client,
    pub valhalla_url: String,
    pub speed_table: Arc<SpeedTableHandle>,
    pub kakao: KakaoSearch,
}

pub fn router(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/route", post(proxy_route))
        .route("/matrix", post(proxy_matrix))
        .route("/sources_to_targets", post(proxy_sources_to_targets))
        .route("/search", get(search))
        .route("/health", get(health))
        .route("/status", get(engine_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Read the live-traffic flag out of the request's costing options.
fn wants_live_traffic(request: &Value) -> bool {
    let costing = request
        .get("costing")
        .and_then(Value::as_str)
        .unwrap_or("auto");
    request
        .get("costing_options")
        .and_then(|options| options.get(costing))
        .and_then(|c| c.get("use_live_traffic"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn proxy_error(e: reqwest::Error) -> Response {
    error!(error = %e, "engine request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response()
}

async fn proxy_route(
    State(state): State<Arc<ProxyState>>,
    Json(request): Json<Value>,
) -> Response {
    let use_traffic = wants_live_traffic(&request);
    info!(use_traffic, "route request received");

    let response = match state
        .client
        .post(format!("{}/route", state.valhalla_url))
        .json(&request)
        .timeout(ROUTE_TIMEOUT)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => return proxy_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        error!(%status, "engine rejected route request");
        return (status, Json(json!({ "error": "routing engine error" }))).into_response();
    }

    match response.json::<RouteResponse>().await {
        Ok(mut payload) => {
            let table = state.speed_table.load();
            let hour = chrono::Utc::now().with_timezone(&Seoul).hour();
            apply_live_traffic(&mut payload, &table, use_traffic, hour);
            Json(payload).into_response()
        }
        Err(e) => {
            error!(error = %e, "unparsable engine route response");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn proxy_matrix(
    State(state): State<Arc<ProxyState>>,
    Json(request): Json<Value>,
) -> Response {
    let use_traffic = wants_live_traffic(&request);
    info!(use_traffic, "matrix request received");

    let response = match state
        .client
        .post(format!("{}/sources_to_targets", state.valhalla_url))
        .json(&request)
        .timeout(MATRIX_TIMEOUT)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => return proxy_error(e),
    };

    let status = response.status();
    if !status.is_success() {
        error!(%status, "engine rejected matrix request");
        return (status, Json(json!({ "error": "routing engine error" }))).into_response();
    }

    match response.json::<MatrixResponse>().await {
        Ok(mut payload) => {
            let table = state.speed_table.load();
            if use_traffic && !table.is_empty() {
                apply_traffic_to_matrix(&mut payload, &table);
            }
            Json(payload).into_response()
        }
        Err(e) => {
            error!(error = %e, "unparsable engine matrix response");
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn proxy_sources_to_targets(
    State(state): State<Arc<ProxyState>>,
    Json(request): Json<Value>,
) -> Response {
    match state
        .client
        .post(format!("{}/sources_to_targets", state.valhalla_url))
        .json(&request)
        .timeout(MATRIX_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => match response.json::<Value>().await {
            Ok(payload) => Json(payload).into_response(),
            Err(e) => proxy_error(e),
        },
        Err(e) => proxy_error(e),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    text: Option<String>,
}

async fn search(
    State(state): State<Arc<ProxyState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(text) = params.text.filter(|t| !t.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "text parameter required" })),
        )
            .into_response();
    };

    let hit = state.kakao.search(&text).await;
    info!(%text, confidence = hit.confidence, "geocoding search served");

    Json(json!({
        "features": [{
            "geometry": { "coordinates": [hit.lon, hit.lat] },
            "properties": {
                "confidence": hit.confidence,
                "display_name": hit.label,
                "geocoding_method": "kakao",
            }
        }]
    }))
    .into_response()
}

async fn health(State(state): State<Arc<ProxyState>>) -> Json<Value> {
    let table = state.speed_table.load();
    let stats = table.stats().map(|s| {
        json!({
            "avg_speed": s.avg_speed,
            "min_speed": s.min_speed,
            "max_speed": s.max_speed,
            "slow_roads": s.slow_roads,
            "fast_roads": s.fast_roads,
        })
    });

    Json(json!({
        "status": "healthy",
        "traffic_data_count": table.len(),
        "traffic_stats": stats,
        "valhalla_url": state.valhalla_url,
        "kakao_api_configured": state.kakao.configured(),
    }))
}

async fn engine_status(State(state): State<Arc<ProxyState>>) -> Response {
    match state
        .client
        .get(format!("{}/status", state.valhalla_url))
        .timeout(STATUS_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            (status, body).into_response()
        }
        Err(e) => {
            error!(error = %e, "engine status check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "routing engine unreachable" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wants_live_traffic() {
        let request = json!({
            "costing": "auto",
            "costing_options": { "auto": { "use_live_traffic": true } }
        });
        assert!(wants_live_traffic(&request));

        let without_flag = json!({ "costing": "auto", "costing_options": { "auto": {} } });
        assert!(!wants_live_traffic(&without_flag));

        // flag under a different costing model than requested
        let mismatched = json!({
            "costing": "bicycle",
            "costing_options": { "auto": { "use_live_traffic": true } }
        });
        assert!(!wants_live_traffic(&mismatched));

        assert!(!wants_live_traffic(&json!({})));
    }
}
