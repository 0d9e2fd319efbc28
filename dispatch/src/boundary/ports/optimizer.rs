//! Tour Optimizer Port
//!
//! Single-shot tour computation over a travel-time matrix. Requests are not
//! retried; the solver's own time cap is the guard, and the planner degrades
//! to nearest-neighbor when the solver is unavailable.

use async_trait::async_trait;
use thiserror::Error;

use super::routing::TimeMatrix;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Optimizer unavailable: {0}")]
    Unavailable(String),

    #[error("Optimizer returned an invalid tour: {0}")]
    InvalidTour(String),
}

/// An ordered visit over the matrix nodes plus its cost in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Tour {
    pub order: Vec<usize>,
    pub cost: f64,
}

impl Tour {
    /// Check the tour is a permutation of `[0, n)`.
    pub fn is_permutation_of(&self, n: usize) -> bool {
        if self.order.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        for &idx in &self.order {
            if idx >= n || seen[idx] {
                return false;
            }
            seen[idx] = true;
        }
        true
    }
}

/// Tour Optimizer Port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TourOptimizer: Send + Sync {
    async fn solve(&self, matrix: &TimeMatrix) -> Result<Tour, OptimizerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permutation_check() {
        let tour = Tour { order: vec![0, 2, 1, 3], cost: 10.0 };
        assert!(tour.is_permutation_of(4));
        assert!(!tour.is_permutation_of(3));

        let dup = Tour { order: vec![0, 0, 1, 2], cost: 10.0 };
        assert!(!dup.is_permutation_of(4));

        let out_of_range = Tour { order: vec![0, 1, 4], cost: 10.0 };
        assert!(!out_of_range.is_permutation_of(3));
    }
}
