//! Normalized event records and their identifiers.
//!
//! Every accepted webhook is flattened into an [`EventRecord`] with the same
//! six fields regardless of the event kind that produced it. Records are
//! never updated after they are persisted.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};

use crate::error::ValidationError;

type PgDb = sqlx::Postgres;
type PgValueRef<'r> = sqlx::postgres::PgValueRef<'r>;
type PgTypeInfo = sqlx::postgres::PgTypeInfo;
type PgArgumentBuffer = sqlx::postgres::PgArgumentBuffer;
type EncodeResult =
    Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>;
type BoxDynError = sqlx::error::BoxDynError;

/// Placeholder used when a payload omits a value the record needs.
pub const UNKNOWN: &str = "unknown";

/// Identifier assigned by the event store on insert.
///
/// Identifiers increase with insertion order, which is what "most recent
/// first" sorts on. On the wire the identifier is rendered as a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EventId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl sqlx::Type<PgDb> for EventId {
    fn type_info() -> PgTypeInfo {
        <i64 as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for EventId {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let id = <i64 as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(Self(id))
    }
}

/// Kind of repository activity a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventAction {
    /// Commits pushed to a branch.
    Push,
    /// Pull request opened or updated.
    PullRequest,
    /// Pull request merged.
    Merge,
}

impl EventAction {
    /// Every recognized action, in declaration order.
    pub const ALL: [Self; 3] = [Self::Push, Self::PullRequest, Self::Merge];

    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "PUSH",
            Self::PullRequest => "PULL_REQUEST",
            Self::Merge => "MERGE",
        }
    }

    /// Recognized actions rendered for error messages.
    pub fn allowed_list() -> String {
        let quoted: Vec<String> = Self::ALL.iter().map(|a| format!("'{}'", a.as_str())).collect();
        format!("[{}]", quoted.join(", "))
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUSH" => Ok(Self::Push),
            "PULL_REQUEST" => Ok(Self::PullRequest),
            "MERGE" => Ok(Self::Merge),
            other => Err(ValidationError::InvalidAction { value: other.to_string() }),
        }
    }
}

impl sqlx::Type<PgDb> for EventAction {
    fn type_info() -> PgTypeInfo {
        <&str as sqlx::Type<PgDb>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, PgDb> for EventAction {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as sqlx::Decode<PgDb>>::decode(value)?;
        Ok(s.parse()?)
    }
}

impl sqlx::Encode<'_, PgDb> for EventAction {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> EncodeResult {
        <&str as sqlx::Encode<PgDb>>::encode_by_ref(&self.as_str(), buf)
    }
}

/// Normalized, storage-ready event.
///
/// Field order here is the order fields appear in JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    /// Commit hash for pushes, pull request number for pull requests.
    pub request_id: String,

    /// Pusher name or pull request author login.
    pub author: String,

    /// Activity kind.
    pub action: EventAction,

    /// Source branch. Same as `to_branch` for pushes.
    pub from_branch: String,

    /// Destination branch.
    pub to_branch: String,

    /// Human-readable UTC time, e.g. `15 January 2024 - 10:30 AM UTC`.
    pub timestamp: String,
}

/// Record as returned from an insert, carrying its assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredEvent {
    /// Identifier assigned by the store.
    #[serde(rename = "_id")]
    pub id: EventId,

    /// The persisted record.
    #[serde(flatten)]
    pub record: EventRecord,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_record() -> EventRecord {
        EventRecord {
            request_id: "abc123".into(),
            author: "octocat".into(),
            action: EventAction::Push,
            from_branch: "main".into(),
            to_branch: "main".into(),
            timestamp: "15 January 2024 - 10:30 AM UTC".into(),
        }
    }

    #[test]
    fn action_display_matches_storage_format() {
        assert_eq!(EventAction::Push.to_string(), "PUSH");
        assert_eq!(EventAction::PullRequest.to_string(), "PULL_REQUEST");
        assert_eq!(EventAction::Merge.to_string(), "MERGE");
    }

    #[test]
    fn action_parse_rejects_unknown_and_lowercase() {
        assert_eq!("MERGE".parse::<EventAction>(), Ok(EventAction::Merge));
        assert!(matches!(
            "push".parse::<EventAction>(),
            Err(ValidationError::InvalidAction { value }) if value == "push"
        ));
    }

    #[test]
    fn record_serializes_with_screaming_action() {
        let value = serde_json::to_value(sample_record()).unwrap();

        assert_eq!(value["action"], "PUSH");
        assert_eq!(value["from_branch"], "main");
        assert_eq!(value.as_object().unwrap().len(), 6);
    }

    #[test]
    fn stored_event_renders_id_as_string() {
        let stored = StoredEvent { id: EventId(42), record: sample_record() };

        let value = serde_json::to_value(&stored).unwrap();

        assert_eq!(value["_id"], json!("42"));
        assert_eq!(value["author"], "octocat");
    }
}
