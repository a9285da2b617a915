//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Nothing here is fatal to the process; every failure is per-request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use memberd_core::ServiceError;

pub type ApiResult<T> = Result<T, ApiError>;

/// API error type with automatic HTTP status mapping
#[derive(Debug, Error)]
pub enum ApiError {
    /// Record not found (404)
    #[error("record '{uuid}' not found")]
    NotFound { uuid: String },

    /// Path uuid and payload uuid disagree (400)
    #[error("payload uuid '{body}' does not match path uuid '{path}'")]
    UuidMismatch { path: String, body: String },

    /// Error surfaced by the service below; status depends on the variant
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Errors that can keep the server from starting at all.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("invalid bind address: {0}")]
    Addr(#[from] std::net::AddrParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound { uuid } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("record '{uuid}' not found")
                }),
            ),
            Self::UuidMismatch { .. } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "uuid_mismatch",
                    "message": self.to_string()
                }),
            ),
            Self::Service(e) => match e {
                ServiceError::Decode(_)
                | ServiceError::InvalidDate { .. }
                | ServiceError::MissingUuid => (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": "validation_error",
                        "message": e.to_string()
                    }),
                ),
                ServiceError::Backend(_) | ServiceError::BatchTooLarge { .. } => {
                    tracing::error!("graph backend error: {e}");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        json!({
                            "error": "backend_error",
                            "message": "the graph backend is unavailable"
                        }),
                    )
                }
            },
        };

        (status, Json(body)).into_response()
    }
}
