//! HTTP error mapping.
//!
//! Every typed usecase error lands here once and is translated to a status
//! code and a JSON body. External-service failures never surface as 5xx
//! when a fallback exists; only repository and consistency failures do.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::usecases::complete::CompleteError;
use crate::usecases::ingest::IngestError;
use crate::usecases::next_destination::PlannerError;
use crate::usecases::phase_transition::PhaseTransitionError;

/// API-level error taxonomy, one variant per status class.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A guarded update changed zero rows; the caller should re-read.
    #[error("{0}")]
    ConsistencyConflict(String),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, json!({ "error": msg }))
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::ConsistencyConflict(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": msg, "kind": "consistency_conflict" }),
            ),
            ApiError::Internal(msg) => {
                error!(%msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<PlannerError> for ApiError {
    fn from(e: PlannerError) -> Self {
        match e {
            PlannerError::Repository(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::ParcelNotFound(_) => ApiError::NotFound("Parcel not found".to_string()),
            IngestError::NoDistrict => {
                ApiError::Validation("Could not determine district".to_string())
            }
            IngestError::NoDriverForDistrict(district) => {
                ApiError::Internal(format!("No driver for district {}", district))
            }
            IngestError::StaleState(id) => {
                ApiError::ConsistencyConflict(format!("Assignment changed no rows for parcel {}", id))
            }
            IngestError::Repository(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<CompleteError> for ApiError {
    fn from(e: CompleteError) -> Self {
        match e {
            CompleteError::ParcelNotFound(_) => {
                ApiError::NotFound("Parcel not found".to_string())
            }
            CompleteError::NotOwner(..) => ApiError::Forbidden("권한이 없습니다".to_string()),
            CompleteError::StaleState(id) => {
                ApiError::ConsistencyConflict(format!("Completion changed no rows for parcel {}", id))
            }
            CompleteError::Repository(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}

impl From<PhaseTransitionError> for ApiError {
    fn from(e: PhaseTransitionError) -> Self {
        match e {
            PhaseTransitionError::Repository(inner) => ApiError::Internal(inner.to_string()),
        }
    }
}
