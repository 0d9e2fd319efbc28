//! Solve endpoint.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::solver::{self, SolverError, MAX_RUNS};

/// Shared solver state.
pub struct SolverState {
    pub executable: PathBuf,
}

pub fn router(state: Arc<SolverState>) -> Router {
    Router::new()
        .route("/solve", post(solve))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct SolveRequest {
    /// Square travel-time matrix; `distances` is the legacy field name.
    matrix: Option<Vec<Vec<f64>>>,
    distances: Option<Vec<Vec<f64>>>,
}

impl SolveRequest {
    fn into_matrix(self) -> Option<Vec<Vec<f64>>> {
        self.distances.or(self.matrix)
    }
}

async fn solve(
    State(state): State<Arc<SolverState>>,
    Json(request): Json<SolveRequest>,
) -> Response {
    let Some(matrix) = request.into_matrix() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Missing 'distances' or 'matrix' field" })),
        )
            .into_response();
    };

    let n = matrix.len();
    if matrix.iter().any(|row| row.len() != n) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Distance matrix must be square" })),
        )
            .into_response();
    }

    info!(nodes = n, "solving tour");
    match solver::solve(&matrix, &state.executable).await {
        Ok(solution) => {
            info!(nodes = n, cost = solution.cost, "tour solved");
            Json(json!({
                "tour": solution.tour,
                "tour_length": solution.cost,
                "nodes": n,
                "runs_used": solver::tuning_for(n).runs.min(MAX_RUNS),
            }))
            .into_response()
        }
        Err(e @ SolverError::InvalidMatrix(_)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "solver run failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() })))
                .into_response()
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}
