//! LKH solver client.
//!
//! Posts the travel-time matrix to the solver sidecar once, with no retry:
//! the solver caps its own wall time, and the planner has a nearest-neighbor
//! fallback for every failure mode. The returned tour is validated as a
//! permutation before the planner trusts it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::boundary::ports::{OptimizerError, TimeMatrix, Tour, TourOptimizer};

/// A bit over the solver's largest configured time limit.
const SOLVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SolveResponse {
    tour: Vec<usize>,
    tour_length: f64,
}

/// HTTP client for the LKH solver sidecar.
pub struct LkhHttpClient {
    client: Client,
    solve_url: String,
}

impl LkhHttpClient {
    pub fn new(solve_url: String) -> Self {
        Self { client: Client::new(), solve_url }
    }
}

#[async_trait]
impl TourOptimizer for LkhHttpClient {
    async fn solve(&self, matrix: &TimeMatrix) -> Result<Tour, OptimizerError> {
        let response = self
            .client
            .post(&self.solve_url)
            .json(&json!({ "matrix": matrix.seconds }))
            .timeout(SOLVE_TIMEOUT)
            .send()
            .await
            .map_err(|e| OptimizerError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OptimizerError::Unavailable(format!("HTTP {}", response.status())));
        }

        let parsed: SolveResponse = response
            .json()
            .await
            .map_err(|e| OptimizerError::Unavailable(e.to_string()))?;

        let tour = Tour { order: parsed.tour, cost: parsed.tour_length };
        if !tour.is_permutation_of(matrix.len()) {
            return Err(OptimizerError::InvalidTour(format!(
                "expected a permutation of 0..{}, got {:?}",
                matrix.len(),
                tour.order
            )));
        }

        info!(nodes = matrix.len(), cost = tour.cost, "tour solved");
        Ok(tour)
    }
}
