//! HTTP API for Hookline.
//!
//! Accepts source-control webhooks on `POST /webhook/receiver`, serves the
//! most recent records on `GET /api/events`, and exposes health checks.
//! Configuration is layered defaults, `config.toml` and environment.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod handlers;
pub mod server;

pub use config::{Config, Environment, StorageBackend};
pub use server::{create_router, start_server, AppState, RequestLimits, REQUEST_ID_HEADER};
