//! Webhook ingestion.
//!
//! Reads the event kind from the `X-GitHub-Event` header, decides whether
//! the event is recorded, and runs recorded events through normalization,
//! validation and a single store insert.

use axum::{
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use hookline_core::{validate, HooklineError, StoredEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use super::{create_error_response, ResponseStatus};
use crate::AppState;

/// Header naming the event kind.
pub const EVENT_KIND_HEADER: &str = "X-GitHub-Event";

/// Pull request actions recorded as `PULL_REQUEST` (or `MERGE` if merged).
pub const TRACKED_PULL_REQUEST_ACTIONS: [&str; 4] = ["opened", "synchronize", "reopened", "edited"];

/// What to do with an incoming event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Normalize as a push.
    Push,
    /// Normalize as a pull request.
    PullRequest,
    /// Acknowledge without recording.
    Ping,
    /// Not recorded; carries the message returned to the sender.
    Skip(String),
}

/// Decides how an event of `kind` is handled.
///
/// Only the pull request `action` and `pull_request.merged` fields are
/// consulted. Wrong types there are treated as absent; the normalizer reports
/// malformed payloads.
pub fn dispatch(kind: &str, payload: &Value) -> Dispatch {
    match kind {
        "push" => Dispatch::Push,
        "ping" => Dispatch::Ping,
        "pull_request" => {
            let action = payload.get("action").and_then(Value::as_str).unwrap_or_default();
            let merged =
                payload.pointer("/pull_request/merged").and_then(Value::as_bool).unwrap_or(false);

            if (action == "closed" && merged) || TRACKED_PULL_REQUEST_ACTIONS.contains(&action) {
                Dispatch::PullRequest
            } else {
                Dispatch::Skip(format!("Pull request action \"{action}\" not tracked"))
            }
        },
        other => Dispatch::Skip(format!("Event type \"{other}\" not supported")),
    }
}

/// Body of every non-error ingestion response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Success or skipped.
    pub status: ResponseStatus,
    /// Human-readable outcome.
    pub message: String,
    /// The stored record, present only when something was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<StoredEvent>,
}

/// Result of a successfully handled webhook.
#[derive(Debug)]
pub enum Outcome {
    /// Record persisted.
    Stored(StoredEvent),
    /// Ping acknowledged.
    Pinged,
    /// Event deliberately not recorded.
    Skipped(String),
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Stored(event) => (StatusCode::CREATED, WebhookResponse {
                status: ResponseStatus::Success,
                message: "Event processed and stored".to_string(),
                event: Some(event),
            }),
            Self::Pinged => (StatusCode::OK, WebhookResponse {
                status: ResponseStatus::Success,
                message: "Webhook configured successfully".to_string(),
                event: None,
            }),
            Self::Skipped(message) => (StatusCode::OK, WebhookResponse {
                status: ResponseStatus::Skipped,
                message,
                event: None,
            }),
        };
        (status, Json(body)).into_response()
    }
}

/// Receives a source-control webhook.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 400: missing event kind, empty or non-object body, validation failure
/// - 413: body larger than the configured limit
/// - 500: storage failure
#[instrument(
    name = "receive_webhook",
    skip(state, headers, body),
    fields(
        event_kind = header_str(&headers, EVENT_KIND_HEADER).unwrap_or("none"),
        content_length = header_str(&headers, "content-length").unwrap_or("unknown"),
    )
)]
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    match process_webhook(&state, &headers, body).await {
        Ok(outcome) => outcome.into_response(),
        Err(e) if e.is_client_error() => {
            warn!(code = e.code(), error = %e, "Rejected webhook");
            create_error_response(&e)
        },
        Err(e) => {
            error!(code = e.code(), error = %e, "Failed to process webhook");
            create_error_response(&e)
        },
    }
}

async fn process_webhook(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Outcome, HooklineError> {
    let kind = event_kind(headers).ok_or(HooklineError::MissingEventKind)?;

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            HooklineError::PayloadTooLarge { limit_bytes: state.limits.max_payload_bytes }
        } else {
            HooklineError::InvalidPayload
        }
    })?;
    let payload = parse_payload(&body)?;

    let record = match dispatch(kind, &payload) {
        Dispatch::Ping => {
            info!("Webhook ping received");
            return Ok(Outcome::Pinged);
        },
        Dispatch::Skip(message) => {
            debug!(reason = %message, "Skipping webhook");
            return Ok(Outcome::Skipped(message));
        },
        Dispatch::Push => state.normalizer.push(&payload)?,
        Dispatch::PullRequest => state.normalizer.pull_request(&payload)?,
    };

    validate(&record)?;

    let stored = state.store.insert(&record).await?;

    info!(
        event_id = %stored.id,
        action = %stored.record.action,
        author = %stored.record.author,
        request_id = %stored.record.request_id,
        "Event stored"
    );

    Ok(Outcome::Stored(stored))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Event kind from the request headers; empty or non-UTF-8 counts as absent.
fn event_kind(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, EVENT_KIND_HEADER).map(str::trim).filter(|kind| !kind.is_empty())
}

/// Parses the body as a non-empty JSON object.
fn parse_payload(body: &[u8]) -> Result<Value, HooklineError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(Value::Object(map)),
        _ => Err(HooklineError::InvalidPayload),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn push_and_ping_are_dispatched_by_kind() {
        assert_eq!(dispatch("push", &json!({"ref": "x"})), Dispatch::Push);
        assert_eq!(dispatch("ping", &json!({"zen": "hi"})), Dispatch::Ping);
    }

    #[test]
    fn unknown_kind_is_skipped() {
        assert_eq!(
            dispatch("issues", &json!({"action": "opened"})),
            Dispatch::Skip("Event type \"issues\" not supported".to_string())
        );
    }

    #[test]
    fn tracked_pull_request_actions() {
        for action in TRACKED_PULL_REQUEST_ACTIONS {
            assert_eq!(
                dispatch("pull_request", &json!({"action": action})),
                Dispatch::PullRequest,
                "{action} should be tracked"
            );
        }
    }

    #[test]
    fn closed_requires_merge() {
        let merged = json!({"action": "closed", "pull_request": {"merged": true}});
        let unmerged = json!({"action": "closed", "pull_request": {"merged": false}});

        assert_eq!(dispatch("pull_request", &merged), Dispatch::PullRequest);
        assert_eq!(
            dispatch("pull_request", &unmerged),
            Dispatch::Skip("Pull request action \"closed\" not tracked".to_string())
        );
    }

    #[test]
    fn other_pull_request_actions_are_skipped() {
        assert_eq!(
            dispatch("pull_request", &json!({"action": "labeled"})),
            Dispatch::Skip("Pull request action \"labeled\" not tracked".to_string())
        );
        assert!(matches!(dispatch("pull_request", &json!({})), Dispatch::Skip(_)));
    }

    #[test]
    fn event_kind_header_must_be_non_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(event_kind(&headers), None);

        headers.insert(EVENT_KIND_HEADER, "".parse().unwrap());
        assert_eq!(event_kind(&headers), None);

        headers.insert(EVENT_KIND_HEADER, "push".parse().unwrap());
        assert_eq!(event_kind(&headers), Some("push"));
    }

    #[test]
    fn payload_must_be_non_empty_object() {
        assert!(parse_payload(br#"{"a":1}"#).is_ok());
        assert!(matches!(parse_payload(b"{}"), Err(HooklineError::InvalidPayload)));
        assert!(matches!(parse_payload(b"[1,2]"), Err(HooklineError::InvalidPayload)));
        assert!(matches!(parse_payload(b""), Err(HooklineError::InvalidPayload)));
        assert!(matches!(parse_payload(b"not json"), Err(HooklineError::InvalidPayload)));
    }
}
