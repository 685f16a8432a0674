//! Property-based tests for the HTTP pipeline.
//!
//! Each case runs a request through a fresh in-memory environment on a
//! current-thread runtime.

use axum::http::StatusCode;
use hookline_testing::{PullRequestPayloadBuilder, PushPayloadBuilder, TestEnv, TestResponse};
use proptest::prelude::*;
use serde_json::Value;

fn proptest_config() -> ProptestConfig {
    ProptestConfig { cases: 64, ..ProptestConfig::default() }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build runtime")
        .block_on(future)
}

fn post(kind: &str, payload: Value) -> (TestResponse, usize) {
    block_on(async {
        let env = TestEnv::new();
        let response = env.post_webhook(kind, &payload).await.expect("request failed");
        let stored = env.store.len().await;
        (response, stored)
    })
}

fn branch_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9/_-]{0,24}"
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn pushes_are_stored_on_one_branch(branch in branch_name(), sha in "[0-9a-f]{7,40}") {
        let payload =
            PushPayloadBuilder::with_defaults().branch(&branch).commit_id(sha.clone()).build();

        let (response, stored) = post("push", payload);

        prop_assert_eq!(response.status, StatusCode::CREATED);
        prop_assert_eq!(stored, 1);
        let event = &response.body["event"];
        prop_assert_eq!(event["from_branch"].as_str(), Some(branch.as_str()));
        prop_assert_eq!(event["to_branch"].as_str(), Some(branch.as_str()));
        prop_assert_eq!(event["request_id"].as_str(), Some(sha.as_str()));
    }

    #[test]
    fn tracked_unmerged_pull_requests_are_pull_request_records(
        action in prop::sample::select(vec!["opened", "synchronize", "reopened", "edited"]),
        number in 1i64..100_000,
    ) {
        let payload =
            PullRequestPayloadBuilder::with_defaults().action(action).number(number).build();

        let (response, stored) = post("pull_request", payload);

        prop_assert_eq!(response.status, StatusCode::CREATED);
        prop_assert_eq!(stored, 1);
        prop_assert_eq!(&response.body["event"]["action"], "PULL_REQUEST");
        let expected = number.to_string();
        prop_assert_eq!(response.body["event"]["request_id"].as_str(), Some(expected.as_str()));
    }

    #[test]
    fn closed_unmerged_pull_requests_are_never_stored(number in 1i64..100_000) {
        let payload =
            PullRequestPayloadBuilder::with_defaults().action("closed").number(number).build();

        let (response, stored) = post("pull_request", payload);

        prop_assert_eq!(response.status, StatusCode::OK);
        prop_assert_eq!(response.field("status"), Some("skipped"));
        prop_assert_eq!(stored, 0);
    }

    #[test]
    fn garbage_timestamps_never_fail_ingestion(raw in ".{0,40}") {
        let payload = PushPayloadBuilder::with_defaults().timestamp(raw).build();

        let (response, _) = post("push", payload);

        prop_assert_eq!(response.status, StatusCode::CREATED);
        let timestamp = response.body["event"]["timestamp"].as_str().unwrap_or_default();
        prop_assert!(timestamp.ends_with(" UTC"), "got {}", timestamp);
    }

    #[test]
    fn unsupported_kinds_are_skipped(kind in "[a-z_]{1,20}") {
        prop_assume!(!matches!(kind.as_str(), "push" | "pull_request" | "ping"));

        let (response, stored) = post(&kind, PushPayloadBuilder::with_defaults().build());

        prop_assert_eq!(response.status, StatusCode::OK);
        prop_assert_eq!(response.field("status"), Some("skipped"));
        prop_assert_eq!(stored, 0);
    }
}
