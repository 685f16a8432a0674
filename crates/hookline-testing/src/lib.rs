//! Test infrastructure for Hookline.
//!
//! [`TestEnv`] wires the production router to an in-memory event store and a
//! manually driven clock, so HTTP-level tests run without a database and
//! produce deterministic fallback timestamps.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::{
    sync::Arc,
    time::{Duration, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    Router,
};
use hookline_api::{create_router, AppState, RequestLimits};
pub use hookline_core::{EventRecord, MemoryEventStore, StoredEvent, TestClock};
use serde_json::Value;
use tower::ServiceExt;

pub mod fixtures;

pub use fixtures::{PullRequestPayloadBuilder, PushPayloadBuilder};

/// Wall-clock start of every [`TestEnv`] clock: 2024-03-01 12:00:00 UTC.
pub const TEST_EPOCH_SECS: u64 = 1_709_294_400;

/// Display form of [`TEST_EPOCH_SECS`], produced when a payload timestamp is
/// missing or unparseable.
pub const TEST_EPOCH_DISPLAY: &str = "01 March 2024 - 12:00 PM UTC";

/// Isolated application instance for integration tests.
pub struct TestEnv {
    /// Deterministic clock shared with the service.
    pub clock: TestClock,
    /// Backing store, inspectable and fault-injectable from tests.
    pub store: Arc<MemoryEventStore>,
    state: AppState,
}

impl TestEnv {
    /// Creates an environment with default request limits.
    pub fn new() -> Self {
        Self::with_limits(RequestLimits::default())
    }

    /// Creates an environment with custom request limits.
    pub fn with_limits(limits: RequestLimits) -> Self {
        let clock = TestClock::with_start_time(UNIX_EPOCH + Duration::from_secs(TEST_EPOCH_SECS));
        let store = Arc::new(MemoryEventStore::new());
        let state = AppState::new(store.clone(), Arc::new(clock.clone())).with_limits(limits);

        Self { clock, store, state }
    }

    /// Application state backing the router.
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Fresh router over this environment's state.
    pub fn router(&self) -> Router {
        create_router(self.state())
    }

    /// Posts a JSON payload to the webhook receiver with the given event kind.
    pub async fn post_webhook(&self, kind: &str, payload: &Value) -> Result<TestResponse> {
        self.post_raw(Some(kind), payload.to_string()).await
    }

    /// Posts a raw body to the webhook receiver, optionally without the
    /// event kind header.
    pub async fn post_raw(
        &self,
        kind: Option<&str>,
        body: impl Into<Body>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/webhook/receiver")
            .header("content-type", "application/json");
        if let Some(kind) = kind {
            builder = builder.header("X-GitHub-Event", kind);
        }

        let request = builder.body(body.into()).context("failed to build webhook request")?;
        self.send(request).await
    }

    /// Issues a GET request.
    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .context("failed to build GET request")?;
        self.send(request).await
    }

    /// Sends an arbitrary request through a fresh router.
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router().oneshot(request).await.context("router call failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .context("failed to read response body")?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(TestResponse { status, headers, body })
    }

    /// Records currently stored, oldest first.
    pub async fn stored_records(&self) -> Vec<EventRecord> {
        self.store.snapshot().await.into_iter().map(|stored| stored.record).collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffered HTTP response.
#[derive(Debug)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body parsed as JSON; non-JSON bodies become a JSON string.
    pub body: Value,
}

impl TestResponse {
    /// String field of the body, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.body.get(name).and_then(Value::as_str)
    }

    /// Asserts the status and returns `self` for chaining.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(self.status, expected, "unexpected status, body: {}", self.body);
        self
    }

    /// Asserts an error body with the given code.
    #[track_caller]
    pub fn assert_error(&self, status: StatusCode, code: &str) {
        self.assert_status(status);
        assert_eq!(self.field("status"), Some("error"), "body: {}", self.body);
        assert_eq!(self.field("code"), Some(code), "body: {}", self.body);
    }
}
