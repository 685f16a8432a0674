//! Reference payloads and the records they must produce.
//!
//! Each case posts a literal payload through the full router and compares the
//! persisted record field by field.

use axum::http::StatusCode;
use hookline_testing::TestEnv;
use serde_json::{json, Value};

async fn ingest(env: &TestEnv, kind: &str, payload: Value) -> Value {
    let response = env.post_webhook(kind, &payload).await.unwrap();
    response.assert_status(StatusCode::CREATED);
    response.body["event"].clone()
}

#[tokio::test]
async fn golden_push() {
    let env = TestEnv::new();

    let event = ingest(
        &env,
        "push",
        json!({
            "head_commit": {"id": "abc123", "timestamp": "2024-01-15T10:00:00Z"},
            "pusher": {"name": "alice"},
            "ref": "refs/heads/main"
        }),
    )
    .await;

    assert_eq!(event["request_id"], "abc123");
    assert_eq!(event["author"], "alice");
    assert_eq!(event["action"], "PUSH");
    assert_eq!(event["from_branch"], "main");
    assert_eq!(event["to_branch"], "main");
    assert_eq!(event["timestamp"], "15 January 2024 - 10:00 AM UTC");
}

#[tokio::test]
async fn golden_opened_pull_request() {
    let env = TestEnv::new();

    let event = ingest(
        &env,
        "pull_request",
        json!({
            "number": 42,
            "action": "opened",
            "pull_request": {
                "user": {"login": "bob"},
                "head": {"ref": "feature"},
                "base": {"ref": "main"},
                "merged": false,
                "created_at": "2024-01-15T10:00:00Z"
            }
        }),
    )
    .await;

    assert_eq!(event["request_id"], "42");
    assert_eq!(event["author"], "bob");
    assert_eq!(event["action"], "PULL_REQUEST");
    assert_eq!(event["from_branch"], "feature");
    assert_eq!(event["to_branch"], "main");
    assert_eq!(event["timestamp"], "15 January 2024 - 10:00 AM UTC");
}

#[tokio::test]
async fn golden_merged_pull_request() {
    let env = TestEnv::new();

    let event = ingest(
        &env,
        "pull_request",
        json!({
            "number": 42,
            "action": "closed",
            "pull_request": {
                "user": {"login": "bob"},
                "head": {"ref": "feature"},
                "base": {"ref": "main"},
                "merged": true,
                "merged_at": "2024-01-16T10:00:00Z",
                "updated_at": "2024-01-16T11:30:00Z",
                "created_at": "2024-01-15T10:00:00Z"
            }
        }),
    )
    .await;

    assert_eq!(event["action"], "MERGE");
    assert_eq!(event["timestamp"], "16 January 2024 - 10:00 AM UTC");
}

#[tokio::test]
async fn golden_records_are_queryable_newest_first() {
    let env = TestEnv::new();
    ingest(
        &env,
        "push",
        json!({"ref": "refs/heads/main", "head_commit": {"id": "first"}, "pusher": {"name": "a"}}),
    )
    .await;
    ingest(
        &env,
        "push",
        json!({"ref": "refs/heads/dev", "head_commit": {"id": "second"}, "pusher": {"name": "b"}}),
    )
    .await;

    let response = env.get("/api/events").await.unwrap();

    response.assert_status(StatusCode::OK);
    assert_eq!(response.body[0]["request_id"], "second");
    assert_eq!(response.body[0]["to_branch"], "dev");
    assert_eq!(response.body[1]["request_id"], "first");
}
