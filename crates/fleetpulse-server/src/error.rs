use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use fleetpulse_core::error::EngineError;

/// Application-level errors that map directly to HTTP responses.
///
/// Every variant implements [`IntoResponse`] so Axum handlers can use
/// `Result<impl IntoResponse, AppError>` as their return type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Empty brand/feature selection. The UI should prompt for a selection;
    /// no query was issued.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// The metrics source is down and the placeholder fallback is disabled.
    #[error("metrics source unavailable")]
    SourceUnavailable,

    #[error("batch too large: {0} events (max 500)")]
    BatchTooLarge(usize),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidFilter(msg) => AppError::InvalidFilter(msg),
            EngineError::FetchUnavailable(_) => AppError::SourceUnavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "validation_error", msg.clone())
            }
            AppError::InvalidFilter(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_filter", msg.clone())
            }
            AppError::SourceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "source_unavailable",
                "Metrics source unreachable; no live data".to_string(),
            ),
            AppError::BatchTooLarge(_) => (
                StatusCode::BAD_REQUEST,
                "batch_too_large",
                "Batch exceeds maximum of 500 events".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(json!({
                "error": {
                    "code": code,
                    "message": message,
                    "field": null
                }
            })),
        )
            .into_response()
    }
}
