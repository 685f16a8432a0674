//! Core domain for the Hookline webhook ingestion service.
//!
//! Turns source-control webhook payloads into canonical [`EventRecord`]s,
//! validates them and persists them through an [`EventStore`]. The HTTP layer
//! in `hookline-api` only decides which events to record and maps errors to
//! responses.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod models;
pub mod normalize;
pub mod payload;
pub mod storage;
pub mod time;
pub mod timestamp;
pub mod validate;

pub use error::{CoreError, HooklineError, Result, ValidationError};
pub use models::{EventAction, EventId, EventRecord, StoredEvent, UNKNOWN};
pub use normalize::Normalizer;
pub use storage::{memory::MemoryEventStore, EventStore, PostgresEventStore, Storage};
pub use time::{Clock, RealClock, TestClock};
pub use timestamp::TimestampNormalizer;
pub use validate::validate;
