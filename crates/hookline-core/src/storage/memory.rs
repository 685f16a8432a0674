//! In-process event store.
//!
//! Backs the service when it runs without PostgreSQL and drives the HTTP
//! tests. Writes and reads can be made to fail on demand.

use std::{
    future::Future,
    pin::Pin,
    sync::atomic::{AtomicBool, AtomicI64, Ordering},
};

use tokio::sync::RwLock;

use super::EventStore;
use crate::{
    error::{CoreError, Result},
    models::{EventId, EventRecord, StoredEvent},
};

/// Event store holding records in memory, in insertion order.
#[derive(Debug)]
pub struct MemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryEventStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            next_id: AtomicI64::new(1),
            fail_writes: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Makes subsequent inserts fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Makes subsequent reads and health checks fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Release);
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether no records have been stored.
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    /// All stored records with their identifiers, oldest first.
    pub async fn snapshot(&self) -> Vec<StoredEvent> {
        self.events.read().await.clone()
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::Acquire) {
            return Err(CoreError::Database("injected read failure".to_string()));
        }
        Ok(())
    }
}

impl Default for MemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore for MemoryEventStore {
    fn insert<'a>(
        &'a self,
        record: &'a EventRecord,
    ) -> Pin<Box<dyn Future<Output = Result<StoredEvent>> + Send + 'a>> {
        Box::pin(async move {
            if self.fail_writes.load(Ordering::Acquire) {
                return Err(CoreError::Database("injected write failure".to_string()));
            }

            let mut events = self.events.write().await;
            let id = EventId(self.next_id.fetch_add(1, Ordering::AcqRel));
            let stored = StoredEvent { id, record: record.clone() };
            events.push(stored.clone());
            Ok(stored)
        })
    }

    fn recent(
        &self,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EventRecord>>> + Send + '_>> {
        Box::pin(async move {
            self.check_reads()?;
            let events = self.events.read().await;
            Ok(events.iter().rev().take(limit).map(|e| e.record.clone()).collect())
        })
    }

    fn health_check(&self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move { self.check_reads() })
    }
}
