//! Hookline webhook ingestion service.
//!
//! Loads configuration, connects the event store and serves the HTTP API
//! until SIGINT or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use hookline_api::{start_server, AppState, Config, StorageBackend};
use hookline_core::{
    storage::connect_with_retry, EventStore, MemoryEventStore, PostgresEventStore, RealClock,
    Storage,
};
use sqlx::PgPool;
use tracing::{info, warn};
use tracing_appender::{
    non_blocking::{NonBlocking, WorkerGuard},
    rolling::{RollingFileAppender, Rotation},
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    let _log_guard = init_tracing(&config)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Hookline webhook service");

    let addr = config.parse_server_addr()?;
    info!(
        environment = %config.app_env,
        storage_backend = ?config.storage_backend,
        database_url = %config.database_url_masked(),
        server_addr = %addr,
        max_connections = config.database_max_connections,
        max_payload_bytes = config.max_payload_bytes,
        "Configuration loaded"
    );

    let clock = Arc::new(RealClock::new());
    let (store, pool) = open_store(&config, &clock).await?;

    let state = AppState::new(store, clock).with_limits(config.request_limits());
    let served = start_server(state, addr).await.context("HTTP server failed");

    if let Some(pool) = pool {
        pool.close().await;
        info!("Database connections closed");
    }

    served?;
    info!("Hookline shutdown complete");
    Ok(())
}

/// Builds the configured event store. The pool is returned so it can be
/// closed after the server drains.
async fn open_store(
    config: &Config,
    clock: &Arc<RealClock>,
) -> Result<(Arc<dyn EventStore>, Option<PgPool>)> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = connect_with_retry(
                config.to_pool_options(),
                &config.database_url,
                config.database_connect_retries,
                config.retry_delay(),
                clock.as_ref(),
            )
            .await
            .context("Failed to connect to database")?;

            let storage = Arc::new(Storage::new(pool.clone()));
            storage.health_check().await.context("Failed to verify database connection")?;
            storage.ensure_schema().await.context("Failed to prepare events schema")?;
            info!("Database connection pool established");

            Ok((Arc::new(PostgresEventStore::new(storage)), Some(pool)))
        },
        StorageBackend::Memory => {
            warn!("Using in-memory event store; records are lost on restart");
            Ok((Arc::new(MemoryEventStore::new()), None))
        },
    }
}

/// Initializes structured logging to stdout and, when `log_dir` is set, to
/// daily-rotated files. The returned guard flushes the file writer on drop.
fn init_tracing(config: &Config) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let directives = config.log_filter();
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|e| {
        eprintln!("Invalid log filter {directives:?}: {e}; falling back to info");
        EnvFilter::new("info")
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let (file_layer, guard) = match config.log_directory() {
        Some(dir) => {
            let (writer, guard) = file_writer(dir, config.log_max_files)?;
            let layer = fmt::layer().with_writer(writer).with_ansi(false).with_target(true);
            (Some(layer), Some(guard))
        },
        None => (None, None),
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).with(file_layer).init();

    Ok(guard)
}

/// Opens a non-blocking writer over `hookline.<date>.log` files in `dir`.
fn file_writer(dir: &str, max_files: usize) -> Result<(NonBlocking, WorkerGuard)> {
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("hookline")
        .filename_suffix("log")
        .max_log_files(max_files)
        .build(dir)
        .with_context(|| format!("Failed to open log directory {dir}"))?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Write};

    use super::*;

    #[test]
    fn file_writer_creates_rotated_log_in_directory() {
        let dir = std::env::temp_dir().join(format!("hookline-logs-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let (mut writer, guard) = file_writer(dir.to_str().unwrap(), 2).unwrap();
        writer.write_all(b"event stored\n").unwrap();
        drop(guard);

        let files: Vec<_> = fs::read_dir(&dir).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("hookline.") && name.ends_with(".log"), "got {name}");
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), "event stored\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
