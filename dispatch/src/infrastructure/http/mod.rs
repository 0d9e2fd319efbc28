//! HTTP surface of the dispatch service.
//!
//! JSON-over-HTTP with bearer-token auth on the driver-facing endpoints;
//! the webhook and the phase-transition sweep are service-to-service calls.

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::di::AppState;

/// Build the API router over the shared application state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/pickup/webhook", post(handlers::pickup::webhook))
        .route("/api/pickup/next", get(handlers::pickup::next))
        .route("/api/pickup/complete", post(handlers::pickup::complete))
        .route("/api/pickup/hub-arrived", post(handlers::pickup::hub_arrived))
        .route("/api/pickup/all-completed", get(handlers::pickup::all_completed))
        .route("/api/pickup/status", get(handlers::pickup::status))
        .route("/api/delivery/import", post(handlers::delivery::import))
        .route("/api/delivery/assign", post(handlers::delivery::assign))
        .route("/api/delivery/next", get(handlers::delivery::next))
        .route("/api/delivery/complete", post(handlers::delivery::complete))
        .route("/api/delivery/hub-arrived", post(handlers::delivery::hub_arrived))
        .route("/api/delivery/status", get(handlers::delivery::status))
        .route("/api/status/daily", get(handlers::status::daily))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
