//! Health check handlers for service monitoring.
//!
//! `/health` and `/ready` check the event store; `/live` only reports that
//! the process is answering.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use hookline_core::{Clock, EventStore};
use serde::Serialize;
use tracing::{debug, error, instrument};

use crate::AppState;

/// Health check response structure.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service health.
    pub status: HealthStatus,
    /// Whether the event store answered.
    pub database: DatabaseState,
    /// Time the check was performed.
    pub timestamp: DateTime<Utc>,
    /// Store check duration in milliseconds.
    pub response_time_ms: u64,
    /// Service version.
    pub version: String,
    /// Failure description when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store reachable.
    Healthy,
    /// Store unreachable.
    Unhealthy,
}

/// Event store connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseState {
    /// Check succeeded.
    Connected,
    /// Check failed.
    Disconnected,
}

/// Runs health checks against the event store.
pub struct HealthService {
    clock: Arc<dyn Clock>,
}

impl HealthService {
    /// Creates a new health service with the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Checks `store` and builds the response.
    ///
    /// Failure detail is logged, not returned.
    pub async fn health_check(&self, store: &dyn EventStore) -> HealthResponse {
        let timestamp = self.clock.now_utc();
        let start = self.clock.now();

        let result = store.health_check().await;
        let elapsed = self.clock.now().saturating_duration_since(start);
        let response_time_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let (status, database, message) = match result {
            Ok(()) => (HealthStatus::Healthy, DatabaseState::Connected, None),
            Err(e) => {
                error!(error = %e, "Event store health check failed");
                (
                    HealthStatus::Unhealthy,
                    DatabaseState::Disconnected,
                    Some("Event store unavailable".to_string()),
                )
            },
        };

        HealthResponse {
            status,
            database,
            timestamp,
            response_time_ms,
            version: env!("CARGO_PKG_VERSION").to_string(),
            message,
        }
    }
}

/// Health check endpoint handler.
#[instrument(name = "health_check", skip(app_state))]
pub async fn health_check(State(app_state): State<AppState>) -> Response {
    let health_service = HealthService::new(app_state.clock.clone());
    let response = health_service.health_check(app_state.store.as_ref()).await;

    let status_code = match response.status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    debug!(status = ?response.status, database = ?response.database, "Health check completed");

    (status_code, Json(response)).into_response()
}

/// Readiness check endpoint; the store is the only dependency.
#[instrument(name = "readiness_check", skip(app_state))]
pub async fn readiness_check(State(app_state): State<AppState>) -> Response {
    health_check(State(app_state)).await
}

/// Liveness check endpoint. Does not touch the store.
#[instrument(name = "liveness_check", skip(app_state))]
pub async fn liveness_check(State(app_state): State<AppState>) -> Response {
    let response = serde_json::json!({
        "status": "alive",
        "timestamp": app_state.clock.now_utc(),
        "service": "hookline-api"
    });

    (StatusCode::OK, Json(response)).into_response()
}
