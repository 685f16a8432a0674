//! Typed views over the source-control webhook payloads we consume.
//!
//! Only the fields the normalizer reads are modeled. Every field is optional
//! so that absent or `null` values fall through to defaults, while a value of
//! the wrong JSON type is reported as a malformed payload. Unknown fields are
//! ignored.

use std::fmt;

use serde::Deserialize;

/// Payload of a `push` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    /// Fully qualified ref, e.g. `refs/heads/main`.
    #[serde(rename = "ref")]
    pub git_ref: Option<String>,

    /// Commit hash the ref points to after the push.
    pub after: Option<String>,

    /// Most recent commit of the push.
    pub head_commit: Option<HeadCommit>,

    /// Account that performed the push.
    pub pusher: Option<Pusher>,
}

/// Head commit of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HeadCommit {
    /// Commit hash.
    pub id: Option<String>,

    /// Commit timestamp.
    pub timestamp: Option<String>,
}

/// Pushing account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pusher {
    /// Display name.
    pub name: Option<String>,
}

/// Payload of a `pull_request` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequestPayload {
    /// Activity on the pull request, e.g. `opened` or `closed`.
    pub action: Option<String>,

    /// Pull request number at the top level of the payload.
    pub number: Option<PullNumber>,

    /// The pull request itself.
    pub pull_request: Option<PullRequest>,
}

/// Pull request body of a `pull_request` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    /// Pull request number.
    pub number: Option<PullNumber>,

    /// Whether the pull request has been merged.
    pub merged: Option<bool>,

    /// Merge time, set once merged.
    pub merged_at: Option<String>,

    /// Last update time.
    pub updated_at: Option<String>,

    /// Creation time.
    pub created_at: Option<String>,

    /// Author of the pull request.
    pub user: Option<Account>,

    /// Source branch.
    pub head: Option<BranchRef>,

    /// Destination branch.
    pub base: Option<BranchRef>,
}

/// Account reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Account {
    /// Login handle.
    pub login: Option<String>,
}

/// Branch end of a pull request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BranchRef {
    /// Short branch name.
    #[serde(rename = "ref")]
    pub name: Option<String>,
}

/// Pull request number, sent as a JSON number but tolerated as a string.
///
/// Any JSON number is accepted, including floats and values beyond `i64`,
/// and rendered the way `serde_json` prints it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PullNumber {
    /// Numeric form.
    Number(serde_json::Number),
    /// Textual form.
    Text(String),
}

impl fmt::Display for PullNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl PullRequestPayload {
    /// Whether the pull request reports itself as merged.
    pub fn is_merged(&self) -> bool {
        self.pull_request.as_ref().and_then(|pr| pr.merged).unwrap_or(false)
    }
}
