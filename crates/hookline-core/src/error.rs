//! Error types for ingestion, validation and storage.
//!
//! [`ValidationError`] carries the client-facing messages produced when a
//! payload or normalized record is rejected. [`CoreError`] covers storage
//! failures. [`HooklineError`] is the top-level taxonomy with stable codes
//! used by the HTTP layer to pick status codes.

use thiserror::Error;

use crate::models::EventAction;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Rejection of a payload or a normalized record.
///
/// The `Display` output is returned verbatim to webhook senders.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required record field is absent or null.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The action is not one of the recognized values.
    #[error("Invalid action: {value}. Must be one of {}", EventAction::allowed_list())]
    InvalidAction {
        /// The offending action as received.
        value: String,
    },

    /// The payload could not be interpreted as the given event kind.
    #[error("Invalid {kind} event payload: {reason}")]
    InvalidPayload {
        /// Event kind that was being normalized (`push` or `pull_request`).
        kind: &'static str,
        /// Parser detail describing what was wrong.
        reason: String,
    },
}

/// Core error type for storage operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Entity not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Constraint violation.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("requested event not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                Self::ConstraintViolation(format!("unique constraint violation: {db_err}"))
            },
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                Self::ConstraintViolation(format!("check constraint violation: {db_err}"))
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Hookline error taxonomy with stable codes.
#[derive(Debug, Error)]
pub enum HooklineError {
    // Request errors (E1001-E1004)
    /// The event-kind header was not supplied (E1001).
    #[error("[E1001] Missing X-GitHub-Event header")]
    MissingEventKind,

    /// Body is empty, not JSON, or not a non-empty JSON object (E1002).
    #[error("[E1002] Invalid or empty JSON payload")]
    InvalidPayload,

    /// Normalization or validation rejected the event (E1003).
    #[error("[E1003] {0}")]
    Validation(#[from] ValidationError),

    /// Body exceeded the configured size limit (E1004).
    #[error("[E1004] Payload too large: exceeds {limit_bytes} byte limit")]
    PayloadTooLarge {
        /// Configured maximum body size in bytes.
        limit_bytes: usize,
    },

    // System errors (E3001)
    /// The event store failed (E3001).
    #[error("[E3001] Storage error: {0}")]
    Storage(#[from] CoreError),

    /// Generic error for wrapping other errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HooklineError {
    /// Returns the error code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MissingEventKind => "E1001",
            Self::InvalidPayload => "E1002",
            Self::Validation(_) => "E1003",
            Self::PayloadTooLarge { .. } => "E1004",
            Self::Storage(_) => "E3001",
            Self::Other(_) => "E9999",
        }
    }

    /// Returns whether the sender is at fault.
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_) | Self::Other(_))
    }

    /// Message safe to return to the sender.
    ///
    /// Server-side failures collapse to a generic message so storage details
    /// never leak to callers.
    pub fn client_message(&self) -> String {
        match self {
            Self::MissingEventKind => "Missing X-GitHub-Event header".to_string(),
            Self::InvalidPayload => "Invalid or empty JSON payload".to_string(),
            Self::Validation(err) => err.to_string(),
            Self::PayloadTooLarge { limit_bytes } => {
                format!("Payload too large: exceeds {limit_bytes} byte limit")
            },
            Self::Storage(_) | Self::Other(_) => "Internal server error".to_string(),
        }
    }
}
