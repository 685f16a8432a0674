//! Conversion of raw webhook payloads into [`EventRecord`]s.
//!
//! The normalizer only decides field values. Whether a given event kind or
//! pull request action is worth recording at all is the caller's decision.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ValidationError,
    models::{EventAction, EventRecord, UNKNOWN},
    payload::{PullRequestPayload, PushPayload},
    time::Clock,
    timestamp::TimestampNormalizer,
};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Builds canonical records from push and pull request payloads.
#[derive(Debug, Clone)]
pub struct Normalizer {
    timestamps: TimestampNormalizer,
}

impl Normalizer {
    /// Creates a normalizer whose timestamp fallback reads from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { timestamps: TimestampNormalizer::new(clock) }
    }

    /// Normalizes a raw `push` payload.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPayload`] when a consumed field has
    /// the wrong JSON type.
    pub fn push(&self, payload: &Value) -> Result<EventRecord, ValidationError> {
        let parsed = PushPayload::deserialize(payload)
            .map_err(|e| ValidationError::InvalidPayload { kind: "push", reason: e.to_string() })?;
        Ok(self.push_record(&parsed))
    }

    /// Normalizes a raw `pull_request` payload into `PULL_REQUEST` or `MERGE`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidPayload`] when a consumed field has
    /// the wrong JSON type.
    pub fn pull_request(&self, payload: &Value) -> Result<EventRecord, ValidationError> {
        let parsed = PullRequestPayload::deserialize(payload).map_err(|e| {
            ValidationError::InvalidPayload { kind: "pull_request", reason: e.to_string() }
        })?;
        Ok(self.pull_request_record(&parsed))
    }

    /// Builds a `PUSH` record from an already parsed payload.
    pub fn push_record(&self, payload: &PushPayload) -> EventRecord {
        let head_commit = payload.head_commit.as_ref();

        let request_id = head_commit
            .and_then(|c| c.id.clone())
            .or_else(|| payload.after.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let author = payload
            .pusher
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let branch = branch_from_ref(payload.git_ref.as_deref().unwrap_or_default());
        let timestamp = self.timestamps.normalize(head_commit.and_then(|c| c.timestamp.as_deref()));

        EventRecord {
            request_id,
            author,
            action: EventAction::Push,
            from_branch: branch.clone(),
            to_branch: branch,
            timestamp,
        }
    }

    /// Builds a `PULL_REQUEST` or `MERGE` record from an already parsed
    /// payload.
    pub fn pull_request_record(&self, payload: &PullRequestPayload) -> EventRecord {
        let pr = payload.pull_request.clone().unwrap_or_default();

        let request_id = payload
            .number
            .as_ref()
            .or(pr.number.as_ref())
            .map_or_else(|| UNKNOWN.to_string(), ToString::to_string);
        let author = pr.user.and_then(|u| u.login).unwrap_or_else(|| UNKNOWN.to_string());
        let from_branch = pr.head.and_then(|b| b.name).unwrap_or_else(|| UNKNOWN.to_string());
        let to_branch = pr.base.and_then(|b| b.name).unwrap_or_else(|| UNKNOWN.to_string());

        let (action, raw_timestamp) = if pr.merged.unwrap_or(false) {
            (EventAction::Merge, pr.merged_at)
        } else {
            (EventAction::PullRequest, pr.updated_at.or(pr.created_at))
        };

        EventRecord {
            request_id,
            author,
            action,
            from_branch,
            to_branch,
            timestamp: self.timestamps.normalize(raw_timestamp.as_deref()),
        }
    }
}

fn branch_from_ref(git_ref: &str) -> String {
    git_ref.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(git_ref).to_string()
}
