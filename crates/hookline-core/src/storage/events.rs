//! Repository for normalized event records.
//!
//! Records are append-only: the repository exposes inserts and reads, never
//! updates or deletes.

use std::sync::Arc;

use sqlx::PgPool;

use crate::{
    error::Result,
    models::{EventId, EventRecord},
};

/// DDL for the events table and its ordering index.
///
/// Every statement is idempotent so bootstrap can run it on each start.
pub const SCHEMA: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id BIGSERIAL PRIMARY KEY,
        request_id TEXT NOT NULL,
        author TEXT NOT NULL,
        action TEXT NOT NULL CHECK (action IN ('PUSH', 'PULL_REQUEST', 'MERGE')),
        from_branch TEXT NOT NULL,
        to_branch TEXT NOT NULL,
        "timestamp" TEXT NOT NULL,
        received_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_events_id_desc ON events (id DESC)
    "#,
];

/// Repository for event record database operations.
pub struct Repository {
    pool: Arc<PgPool>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Creates the events table and index if they are missing.
    ///
    /// # Errors
    ///
    /// Returns error if any DDL statement fails.
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&*self.pool).await?;
        }
        Ok(())
    }

    /// Inserts a record and returns its assigned identifier.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or the action check constraint is
    /// violated.
    pub async fn create(&self, record: &EventRecord) -> Result<EventId> {
        let id = sqlx::query_scalar(
            r#"
            INSERT INTO events (request_id, author, action, from_branch, to_branch, "timestamp")
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&record.request_id)
        .bind(&record.author)
        .bind(record.action)
        .bind(&record.from_branch)
        .bind(&record.to_branch)
        .bind(&record.timestamp)
        .fetch_one(&*self.pool)
        .await?;

        Ok(id)
    }

    /// Returns up to `limit` records, most recently inserted first.
    ///
    /// # Errors
    ///
    /// Returns error if the query fails or a stored action is unrecognized.
    pub async fn find_recent(&self, limit: usize) -> Result<Vec<EventRecord>> {
        let records = sqlx::query_as::<_, EventRecord>(
            r#"
            SELECT request_id, author, action, from_branch, to_branch, "timestamp"
            FROM events
            ORDER BY id DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&*self.pool)
        .await?;

        Ok(records)
    }
}
