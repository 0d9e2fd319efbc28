//! Routing Engine Port
//!
//! Travel-time matrix and turn-by-turn guidance, served through the traffic
//! proxy so live-traffic rewriting applies to both.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::model::location::GeoPoint;
use crate::domain::model::route::RoutePayload;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Routing engine request failed: {0}")]
    Transport(String),

    #[error("Routing engine returned an unusable response: {0}")]
    BadResponse(String),
}

/// Square travel-time matrix in seconds, row = source, column = target.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeMatrix {
    pub seconds: Vec<Vec<f64>>,
}

impl TimeMatrix {
    pub fn len(&self) -> usize {
        self.seconds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seconds.is_empty()
    }
}

/// Routing Engine Port
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoutingEngine: Send + Sync {
    /// Many-to-many travel-time matrix over the given points, with live
    /// traffic applied.
    async fn time_matrix(&self, points: &[GeoPoint]) -> Result<TimeMatrix, RoutingError>;

    /// Turn-by-turn guidance between two points, with live traffic applied.
    async fn turn_by_turn(&self, from: GeoPoint, to: GeoPoint)
        -> Result<RoutePayload, RoutingError>;
}
