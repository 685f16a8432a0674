//! Recent event query.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hookline_core::HooklineError;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use super::error_response_with_message;
use crate::AppState;

/// Records returned when no usable limit is given.
pub const DEFAULT_LIMIT: usize = 10;
/// Smallest limit honored.
pub const MIN_LIMIT: usize = 1;
/// Largest limit honored.
pub const MAX_LIMIT: usize = 100;

/// Query string of `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Requested number of records, kept raw so bad input can fall back.
    pub limit: Option<String>,
}

impl EventsQuery {
    /// Limit clamped to `[MIN_LIMIT, MAX_LIMIT]`, or `DEFAULT_LIMIT` when
    /// absent or not an integer.
    pub fn effective_limit(&self) -> usize {
        self.limit.as_deref().and_then(parse_limit).map_or(DEFAULT_LIMIT, clamp_limit)
    }
}

/// Parses an integer, saturating digit strings too long for `i64`.
fn parse_limit(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

fn clamp_limit(value: i64) -> usize {
    let min = i64::try_from(MIN_LIMIT).unwrap_or(1);
    let max = i64::try_from(MAX_LIMIT).unwrap_or(i64::MAX);
    usize::try_from(value.clamp(min, max)).unwrap_or(DEFAULT_LIMIT)
}

/// Lists the most recent events, newest first.
///
/// A malformed query string is treated like an absent one.
#[instrument(name = "list_events", skip(state, query))]
pub async fn list_events(
    State(state): State<AppState>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let limit = query.effective_limit();

    match state.store.recent(limit).await {
        Ok(records) => {
            debug!(limit, returned = records.len(), "Events retrieved");
            (StatusCode::OK, Json(records)).into_response()
        },
        Err(e) => {
            error!(error = %e, limit, "Failed to retrieve events");
            error_response_with_message(
                &HooklineError::Storage(e),
                "Failed to retrieve events".to_string(),
            )
        },
    }
}
