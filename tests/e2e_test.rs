//! End-to-end tests over a real TCP listener.
//!
//! Binds the production router to an ephemeral port and talks to it with an
//! HTTP client, covering middleware that in-process calls skip.

use std::net::SocketAddr;

use anyhow::Result;
use hookline_api::create_router;
use hookline_testing::{PullRequestPayloadBuilder, PushPayloadBuilder, TestEnv};
use serde_json::Value;
use tokio::task::JoinHandle;

async fn spawn_server(env: &TestEnv) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = create_router(env.state());

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok((addr, handle))
}

#[tokio::test]
async fn webhook_round_trip_over_http() -> Result<()> {
    let env = TestEnv::new();
    let (addr, server) = spawn_server(&env).await?;
    let client = reqwest::Client::new();

    let push = client
        .post(format!("http://{addr}/webhook/receiver"))
        .header("X-GitHub-Event", "push")
        .json(&PushPayloadBuilder::with_defaults().build())
        .send()
        .await?;
    assert_eq!(push.status(), 201);
    assert!(push.headers().contains_key("x-request-id"));

    let merge = client
        .post(format!("http://{addr}/webhook/receiver"))
        .header("X-GitHub-Event", "pull_request")
        .json(&PullRequestPayloadBuilder::with_defaults().merged_at("2024-01-16T10:00:00Z").build())
        .send()
        .await?;
    assert_eq!(merge.status(), 201);

    let events: Value =
        client.get(format!("http://{addr}/api/events?limit=5")).send().await?.json().await?;
    let events = events.as_array().expect("array response");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["action"], "MERGE");
    assert_eq!(events[1]["action"], "PUSH");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn cors_preflight_is_allowed_from_any_origin() -> Result<()> {
    let env = TestEnv::new();
    let (addr, server) = spawn_server(&env).await?;

    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("http://{addr}/api/events"))
        .header("Origin", "https://dashboard.example.com")
        .header("Access-Control-Request-Method", "GET")
        .send()
        .await?;

    assert!(response.status().is_success());
    assert_eq!(
        response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );

    server.abort();
    Ok(())
}

#[tokio::test]
async fn health_over_http() -> Result<()> {
    let env = TestEnv::new();
    let (addr, server) = spawn_server(&env).await?;

    let response = reqwest::get(format!("http://{addr}/health")).await?;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["status"], "healthy");

    env.store.fail_reads(true);
    let response = reqwest::get(format!("http://{addr}/health")).await?;
    assert_eq!(response.status(), 503);

    server.abort();
    Ok(())
}
