//! HTTP request handlers.
//!
//! - `webhook` - webhook ingestion and event-kind dispatch
//! - `events` - recent event query
//! - `health` - health, readiness and liveness checks
//!
//! Error bodies share one shape: `{"status": "error", "code", "message"}`,
//! where `code` comes from the [`HooklineError`] taxonomy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hookline_core::HooklineError;
use serde::Serialize;

pub mod events;
pub mod health;
pub mod webhook;

pub use events::list_events;
pub use health::{health_check, liveness_check, readiness_check};
pub use webhook::receive_webhook;

/// Outcome marker carried in every JSON response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request did what was asked.
    Success,
    /// The request was valid but intentionally not recorded.
    Skipped,
    /// The request failed.
    Error,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always [`ResponseStatus::Error`].
    pub status: ResponseStatus,
    /// Error code from the taxonomy (E1001-E3001, E9999).
    pub code: &'static str,
    /// Human-readable error description.
    pub message: String,
}

/// Maps an error to its HTTP status code.
pub fn status_for(error: &HooklineError) -> StatusCode {
    match error {
        HooklineError::MissingEventKind
        | HooklineError::InvalidPayload
        | HooklineError::Validation(_) => StatusCode::BAD_REQUEST,
        HooklineError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        HooklineError::Storage(_) | HooklineError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Creates a standardized error response with the error's client message.
pub fn create_error_response(error: &HooklineError) -> Response {
    error_response_with_message(error, error.client_message())
}

/// Creates a standardized error response with a caller-chosen message.
pub fn error_response_with_message(error: &HooklineError, message: String) -> Response {
    let body = ErrorResponse { status: ResponseStatus::Error, code: error.code(), message };
    (status_for(error), Json(body)).into_response()
}
