//! HTTP server setup and request routing.
//!
//! Requests flow through middleware in order:
//! 1. Request ID injection
//! 2. Request/response tracing
//! 3. Timeout enforcement
//! 4. CORS (any origin)
//! 5. Body size limit (webhook and query routes)
//! 6. Handler execution
//!
//! On SIGINT or SIGTERM the server stops accepting connections and drains
//! in-flight requests before returning.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use hookline_core::{Clock, EventStore, Normalizer};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::handlers;

/// Header carrying the per-request identifier on every response.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Per-request resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    /// Largest accepted request body in bytes.
    pub max_payload_bytes: usize,
    /// Time allowed for a request before it is answered with 408.
    pub request_timeout: Duration,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self { max_payload_bytes: 10 * 1024 * 1024, request_timeout: Duration::from_secs(30) }
    }
}

/// Shared state handed to every handler.
///
/// Built once at startup. The store and clock are trait objects so tests can
/// substitute in-memory and manually driven implementations.
#[derive(Clone)]
pub struct AppState {
    /// Where accepted records are persisted.
    pub store: Arc<dyn EventStore>,
    /// Time source for health responses and timestamp fallback.
    pub clock: Arc<dyn Clock>,
    /// Payload normalizer sharing `clock`.
    pub normalizer: Arc<Normalizer>,
    /// Request limits applied by the router.
    pub limits: RequestLimits,
}

impl AppState {
    /// Creates state with default request limits.
    pub fn new(store: Arc<dyn EventStore>, clock: Arc<dyn Clock>) -> Self {
        let normalizer = Arc::new(Normalizer::new(clock.clone()));
        Self { store, clock, normalizer, limits: RequestLimits::default() }
    }

    /// Replaces the request limits.
    #[must_use]
    pub fn with_limits(mut self, limits: RequestLimits) -> Self {
        self.limits = limits;
        self
    }
}

/// Creates the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use hookline_api::{create_router, AppState};
/// use hookline_core::{MemoryEventStore, RealClock};
///
/// let state = AppState::new(Arc::new(MemoryEventStore::new()), Arc::new(RealClock::new()));
/// let app = create_router(state);
/// ```
pub fn create_router(state: AppState) -> Router {
    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/live", get(handlers::liveness_check));

    let api_routes = Router::new()
        .route("/webhook/receiver", post(handlers::receive_webhook))
        .route("/api/events", get(handlers::list_events))
        .layer(DefaultBodyLimit::max(state.limits.max_payload_bytes));

    Router::new()
        .merge(health_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(state.limits.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(inject_request_id))
        .with_state(state)
}

/// Middleware to inject a request ID into all responses.
async fn inject_request_id(mut req: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(request_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    response
}

/// Starts the HTTP server and serves until a shutdown signal arrives.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(state: AppState, addr: SocketAddr) -> Result<(), std::io::Error> {
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!(addr = %actual_addr, "HTTP server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("HTTP server stopped gracefully");
    Ok(())
}

/// Waits for CTRL+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received CTRL+C, starting graceful shutdown");
        },
        () = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
