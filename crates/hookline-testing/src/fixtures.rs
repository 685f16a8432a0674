//! Payload builders shaped like GitHub webhook deliveries.
//!
//! Each builder starts empty; `with_defaults()` fills in a realistic payload.
//! Setting a field to `None` removes it from the built JSON.

use serde_json::{json, Map, Value};

/// Builder for `push` payloads.
#[derive(Debug, Clone, Default)]
pub struct PushPayloadBuilder {
    git_ref: Option<String>,
    after: Option<String>,
    commit_id: Option<String>,
    commit_timestamp: Option<String>,
    pusher: Option<String>,
}

impl PushPayloadBuilder {
    /// Creates a builder with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for a push of `abc123` to `main` by `alice`.
    pub fn with_defaults() -> Self {
        Self {
            git_ref: Some("refs/heads/main".to_string()),
            after: Some("abc123".to_string()),
            commit_id: Some("abc123".to_string()),
            commit_timestamp: Some("2024-01-15T10:00:00Z".to_string()),
            pusher: Some("alice".to_string()),
        }
    }

    /// Sets the full ref, e.g. `refs/heads/main`.
    #[must_use]
    pub fn git_ref(mut self, git_ref: impl Into<String>) -> Self {
        self.git_ref = Some(git_ref.into());
        self
    }

    /// Sets the pushed branch, expanding it to `refs/heads/<branch>`.
    #[must_use]
    pub fn branch(self, branch: &str) -> Self {
        self.git_ref(format!("refs/heads/{branch}"))
    }

    /// Sets the head commit id.
    #[must_use]
    pub fn commit_id(mut self, id: impl Into<String>) -> Self {
        self.commit_id = Some(id.into());
        self
    }

    /// Sets the top-level `after` SHA.
    #[must_use]
    pub fn after(mut self, sha: impl Into<String>) -> Self {
        self.after = Some(sha.into());
        self
    }

    /// Sets the head commit timestamp.
    #[must_use]
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.commit_timestamp = Some(timestamp.into());
        self
    }

    /// Sets the pusher name.
    #[must_use]
    pub fn pusher(mut self, name: impl Into<String>) -> Self {
        self.pusher = Some(name.into());
        self
    }

    /// Drops the head commit (commit id and timestamp).
    #[must_use]
    pub fn without_head_commit(mut self) -> Self {
        self.commit_id = None;
        self.commit_timestamp = None;
        self
    }

    /// Drops the pusher object.
    #[must_use]
    pub fn without_pusher(mut self) -> Self {
        self.pusher = None;
        self
    }

    /// Builds the JSON payload.
    pub fn build(self) -> Value {
        let mut payload = Map::new();
        if let Some(git_ref) = self.git_ref {
            payload.insert("ref".to_string(), json!(git_ref));
        }
        if let Some(after) = self.after {
            payload.insert("after".to_string(), json!(after));
        }
        if self.commit_id.is_some() || self.commit_timestamp.is_some() {
            let mut commit = Map::new();
            if let Some(id) = self.commit_id {
                commit.insert("id".to_string(), json!(id));
            }
            if let Some(timestamp) = self.commit_timestamp {
                commit.insert("timestamp".to_string(), json!(timestamp));
            }
            payload.insert("head_commit".to_string(), Value::Object(commit));
        }
        if let Some(name) = self.pusher {
            payload.insert("pusher".to_string(), json!({ "name": name }));
        }
        payload.insert("repository".to_string(), json!({ "full_name": "octo/hookline" }));
        Value::Object(payload)
    }
}

/// Builder for `pull_request` payloads.
#[derive(Debug, Clone, Default)]
pub struct PullRequestPayloadBuilder {
    action: Option<String>,
    number: Option<i64>,
    merged: Option<bool>,
    merged_at: Option<String>,
    updated_at: Option<String>,
    created_at: Option<String>,
    author: Option<String>,
    head: Option<String>,
    base: Option<String>,
}

impl PullRequestPayloadBuilder {
    /// Creates a builder with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for PR #42 from `feature-x` into `main` by `bob`,
    /// just opened.
    pub fn with_defaults() -> Self {
        Self {
            action: Some("opened".to_string()),
            number: Some(42),
            merged: Some(false),
            merged_at: None,
            updated_at: Some("2024-01-15T11:00:00Z".to_string()),
            created_at: Some("2024-01-15T09:00:00Z".to_string()),
            author: Some("bob".to_string()),
            head: Some("feature-x".to_string()),
            base: Some("main".to_string()),
        }
    }

    /// Sets the delivery action (`opened`, `closed`, ...).
    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Sets the pull request number.
    #[must_use]
    pub fn number(mut self, number: i64) -> Self {
        self.number = Some(number);
        self
    }

    /// Marks the pull request merged at `merged_at`, closing it.
    #[must_use]
    pub fn merged_at(mut self, merged_at: impl Into<String>) -> Self {
        self.action = Some("closed".to_string());
        self.merged = Some(true);
        self.merged_at = Some(merged_at.into());
        self
    }

    /// Sets the merged flag without touching the action.
    #[must_use]
    pub fn merged(mut self, merged: bool) -> Self {
        self.merged = Some(merged);
        self
    }

    /// Sets `updated_at`.
    #[must_use]
    pub fn updated_at(mut self, timestamp: impl Into<String>) -> Self {
        self.updated_at = Some(timestamp.into());
        self
    }

    /// Removes `updated_at` so `created_at` is used.
    #[must_use]
    pub fn without_updated_at(mut self) -> Self {
        self.updated_at = None;
        self
    }

    /// Sets the author login.
    #[must_use]
    pub fn author(mut self, login: impl Into<String>) -> Self {
        self.author = Some(login.into());
        self
    }

    /// Sets the source branch.
    #[must_use]
    pub fn head(mut self, branch: impl Into<String>) -> Self {
        self.head = Some(branch.into());
        self
    }

    /// Sets the target branch.
    #[must_use]
    pub fn base(mut self, branch: impl Into<String>) -> Self {
        self.base = Some(branch.into());
        self
    }

    /// Builds the JSON payload.
    pub fn build(self) -> Value {
        let mut pull_request = Map::new();
        if let Some(number) = self.number {
            pull_request.insert("number".to_string(), json!(number));
        }
        if let Some(merged) = self.merged {
            pull_request.insert("merged".to_string(), json!(merged));
        }
        for (key, value) in [
            ("merged_at", self.merged_at),
            ("updated_at", self.updated_at),
            ("created_at", self.created_at),
        ] {
            if let Some(value) = value {
                pull_request.insert(key.to_string(), json!(value));
            }
        }
        if let Some(login) = self.author {
            pull_request.insert("user".to_string(), json!({ "login": login }));
        }
        if let Some(head) = self.head {
            pull_request.insert("head".to_string(), json!({ "ref": head }));
        }
        if let Some(base) = self.base {
            pull_request.insert("base".to_string(), json!({ "ref": base }));
        }

        let mut payload = Map::new();
        if let Some(action) = self.action {
            payload.insert("action".to_string(), json!(action));
        }
        if let Some(number) = self.number {
            payload.insert("number".to_string(), json!(number));
        }
        payload.insert("pull_request".to_string(), Value::Object(pull_request));
        Value::Object(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_defaults_look_like_github() {
        let payload = PushPayloadBuilder::with_defaults().build();

        assert_eq!(payload["ref"], "refs/heads/main");
        assert_eq!(payload["head_commit"]["id"], "abc123");
        assert_eq!(payload["pusher"]["name"], "alice");
    }

    #[test]
    fn push_without_head_commit_omits_object() {
        let payload = PushPayloadBuilder::with_defaults().without_head_commit().build();

        assert!(payload.get("head_commit").is_none());
        assert_eq!(payload["after"], "abc123");
    }

    #[test]
    fn merged_pull_request_is_closed() {
        let payload =
            PullRequestPayloadBuilder::with_defaults().merged_at("2024-01-15T12:00:00Z").build();

        assert_eq!(payload["action"], "closed");
        assert_eq!(payload["pull_request"]["merged"], true);
        assert_eq!(payload["pull_request"]["merged_at"], "2024-01-15T12:00:00Z");
        assert_eq!(payload["number"], 42);
    }
}
