//! Persistence for normalized event records.
//!
//! Request handlers talk to an [`EventStore`] trait object so the same
//! pipeline runs against PostgreSQL in production and against
//! [`memory::MemoryEventStore`] in tests or when no database is configured.
//! SQL lives only in the repositories under this module.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::warn;

pub mod events;
pub mod memory;

use crate::{
    error::Result,
    models::{EventRecord, StoredEvent},
    time::Clock,
};

/// Operations the HTTP layer needs from a record store.
pub trait EventStore: Send + Sync + 'static {
    /// Persists a validated record as a single write and returns it with its
    /// assigned identifier.
    fn insert<'a>(
        &'a self,
        record: &'a EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<StoredEvent>> + Send + 'a>>;

    /// Returns up to `limit` records, most recently inserted first.
    fn recent(
        &self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EventRecord>>> + Send + '_>>;

    /// Verifies the store is reachable.
    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Container for repository instances sharing one connection pool.
#[derive(Clone)]
pub struct Storage {
    /// Repository for event records.
    pub events: Arc<events::Repository>,
}

impl Storage {
    /// Creates a new storage instance over the given pool.
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self { events: Arc::new(events::Repository::new(pool)) }
    }

    /// Executes `SELECT 1` to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Database` if the connection is unhealthy.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.events.pool()).await?;
        Ok(())
    }

    /// Creates any missing tables and indexes.
    ///
    /// # Errors
    ///
    /// Returns error if the schema cannot be created.
    pub async fn ensure_schema(&self) -> Result<()> {
        self.events.ensure_schema().await
    }
}

/// PostgreSQL-backed [`EventStore`].
#[derive(Clone)]
pub struct PostgresEventStore {
    storage: Arc<Storage>,
}

impl PostgresEventStore {
    /// Creates a store adapter over existing storage.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl EventStore for PostgresEventStore {
    fn insert<'a>(
        &'a self,
        record: &'a EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<StoredEvent>> + Send + 'a>> {
        Box::pin(async move {
            let id = self.storage.events.create(record).await?;
            Ok(StoredEvent { id, record: record.clone() })
        })
    }

    fn recent(
        &self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EventRecord>>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.events.find_recent(limit).await })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.health_check().await })
    }
}

/// Opens a connection pool, retrying with a fixed delay between attempts.
///
/// `attempts` is the total number of tries and is treated as at least one.
///
/// # Errors
///
/// Returns the last connection error once every attempt has failed.
pub async fn connect_with_retry(
    options: PgPoolOptions,
    url: &str,
    attempts: u32,
    delay: Duration,
    clock: &dyn Clock,
) -> Result<PgPool> {
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match options.clone().connect(url).await {
            Ok(pool) => return Ok(pool),
            Err(e) if attempt < attempts => {
                warn!(
                    attempt,
                    max_attempts = attempts,
                    error = %e,
                    "Database connection failed, retrying"
                );
                clock.sleep(delay).await;
                attempt += 1;
            },
            Err(e) => return Err(e.into()),
        }
    }
}
