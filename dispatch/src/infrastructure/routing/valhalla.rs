//! Valhalla routing client, fronted by the traffic proxy.
//!
//! Both the many-to-many matrix and the turn-by-turn route are requested
//! with the live-traffic costing option so the proxy rewrites travel times.
//! Requests retry up to three times with a fixed backoff on timeouts and
//! transport errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::boundary::ports::{RoutingEngine, RoutingError, TimeMatrix};
use crate::domain::model::location::GeoPoint;
use crate::domain::model::route::RoutePayload;

const COSTING_MODEL: &str = "auto";

const MATRIX_TIMEOUT: Duration = Duration::from_secs(60);
const ROUTE_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Penalty weight for unroutable point pairs.
const UNREACHABLE_PENALTY: f64 = 9_999_999.0;

#[derive(Debug, Serialize)]
struct LocationParam {
    lat: f64,
    lon: f64,
}

impl From<GeoPoint> for LocationParam {
    fn from(p: GeoPoint) -> Self {
        Self { lat: p.lat, lon: p.lon }
    }
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    #[serde(default)]
    sources_to_targets: Vec<Vec<Option<MatrixCell>>>,
}

#[derive(Debug, Deserialize)]
struct MatrixCell {
    time: Option<f64>,
    distance: Option<f64>,
}

/// Valhalla client speaking through the traffic proxy.
pub struct ValhallaClient {
    client: Client,
    base_url: String,
}

impl ValhallaClient {
    pub fn new(base_url: String) -> Self {
        Self { client: Client::new(), base_url }
    }

    fn costing_options() -> serde_json::Value {
        json!({ COSTING_MODEL: { "use_live_traffic": true } })
    }

    async fn post_with_retries(
        &self,
        path: &str,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<reqwest::Response, RoutingError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = String::new();

        for attempt in 1..=MAX_RETRIES {
            info!(%url, attempt, "routing engine request");
            match self.client.post(&url).json(body).timeout(timeout).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    // non-2xx is not retried; the engine rejected the request
                    return Err(RoutingError::BadResponse(format!(
                        "HTTP {} from {}",
                        response.status(),
                        path
                    )));
                }
                Err(e) => {
                    warn!(%url, attempt, error = %e, "routing engine request failed");
                    last_error = e.to_string();
                }
            }

            if attempt < MAX_RETRIES {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }

        Err(RoutingError::Transport(last_error))
    }
}

#[async_trait]
impl RoutingEngine for ValhallaClient {
    async fn time_matrix(&self, points: &[GeoPoint]) -> Result<TimeMatrix, RoutingError> {
        if points.len() < 2 {
            return Err(RoutingError::BadResponse(
                "matrix needs at least two locations".to_string(),
            ));
        }

        let locations: Vec<LocationParam> = points.iter().copied().map(Into::into).collect();
        let body = json!({
            "sources": locations,
            "targets": locations,
            "costing": COSTING_MODEL,
            "units": "kilometers",
            "costing_options": Self::costing_options(),
        });

        let response = self.post_with_retries("/matrix", &body, MATRIX_TIMEOUT).await?;
        let parsed: MatrixResponse = response
            .json()
            .await
            .map_err(|e| RoutingError::BadResponse(e.to_string()))?;

        let n = points.len();
        let mut seconds = vec![vec![UNREACHABLE_PENALTY; n]; n];
        let mut found = 0usize;

        for (i, row) in parsed.sources_to_targets.iter().enumerate().take(n) {
            for (j, cell) in row.iter().enumerate().take(n) {
                match cell {
                    Some(MatrixCell { time: Some(time), distance: Some(_) }) => {
                        seconds[i][j] = *time;
                        found += 1;
                    }
                    _ => {
                        warn!(source = i, target = j, "no route between locations, penalized");
                    }
                }
            }
        }

        if found == 0 {
            return Err(RoutingError::BadResponse(
                "no routes between any locations".to_string(),
            ));
        }

        Ok(TimeMatrix { seconds })
    }

    async fn turn_by_turn(
        &self,
        from: GeoPoint,
        to: GeoPoint,
    ) -> Result<RoutePayload, RoutingError> {
        let body = json!({
            "locations": [LocationParam::from(from), LocationParam::from(to)],
            "costing": COSTING_MODEL,
            "directions_options": {
                "units": "kilometers",
                "language": "ko-KR",
                "narrative": true,
            },
            "costing_options": Self::costing_options(),
            "directions_type": "maneuvers",
        });

        let response = self.post_with_retries("/route", &body, ROUTE_TIMEOUT).await?;
        let payload: RoutePayload = response
            .json()
            .await
            .map_err(|e| RoutingError::BadResponse(e.to_string()))?;

        if payload.trip.is_none() {
            return Err(RoutingError::BadResponse("response missing trip".to_string()));
        }
        Ok(payload)
    }
}
