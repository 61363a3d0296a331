#![allow(clippy::unwrap_used)]
// Integration tests for `FlowClient` using wiremock.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::time::Instant;
use url::Url;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flowdeck_api::types::TriggerDagRunRequest;
use flowdeck_api::{Credentials, Error, FlowClient, ListOptions, Pacer};

// ── Helpers ─────────────────────────────────────────────────────────

fn basic() -> Credentials {
    Credentials::Basic {
        username: "admin".into(),
        password: SecretString::from("hunter2"),
    }
}

async fn setup(credentials: Credentials) -> (MockServer, FlowClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = FlowClient::with_client(reqwest::Client::new(), base_url, credentials)
        .with_pacer(Pacer::new(Duration::ZERO));
    (server, client)
}

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_json(json!({ "username": "admin", "password": "hunter2" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "access_token": token })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ── Token lifecycle ─────────────────────────────────────────────────

#[tokio::test]
async fn test_first_call_exchanges_credentials() {
    let (server, client) = setup(basic()).await;
    mount_token(&server, "fresh", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dags"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dags": [], "total_entries": 0 })))
        .expect(2)
        .mount(&server)
        .await;

    client.list_dags(&ListOptions::default()).await.unwrap();
    client.list_dags(&ListOptions::default()).await.unwrap();
    assert!(client.token_expiry().await.is_some());
}

#[tokio::test]
async fn test_token_with_five_minutes_left_is_reused() {
    let (server, client) = setup(basic()).await;
    mount_token(&server, "unused", 0).await;

    client
        .install_token(
            SecretString::from("cached"),
            Instant::now() + Duration::from_secs(300),
        )
        .await;

    let token = client.ensure_token().await.unwrap();
    assert_eq!(token.expose_secret(), "cached");
}

#[tokio::test]
async fn test_token_inside_buffer_is_refreshed_once() {
    let (server, client) = setup(basic()).await;
    mount_token(&server, "renewed", 1).await;

    client
        .install_token(
            SecretString::from("stale"),
            Instant::now() + Duration::from_secs(30),
        )
        .await;

    let token = client.ensure_token().await.unwrap();
    assert_eq!(token.expose_secret(), "renewed");

    // The renewed token is good for hours; no second exchange.
    let token = client.ensure_token().await.unwrap();
    assert_eq!(token.expose_secret(), "renewed");
}

#[tokio::test]
async fn test_concurrent_callers_share_one_exchange() {
    let (server, client) = setup(basic()).await;
    mount_token(&server, "shared", 1).await;

    client
        .install_token(
            SecretString::from("stale"),
            Instant::now() + Duration::from_secs(30),
        )
        .await;

    let (a, b) = tokio::join!(client.ensure_token(), client.ensure_token());
    assert_eq!(a.unwrap().expose_secret(), "shared");
    assert_eq!(b.unwrap().expose_secret(), "shared");
}

#[tokio::test]
async fn test_static_token_never_exchanges() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;
    mount_token(&server, "unused", 0).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/monitor/health"))
        .and(header("authorization", "Bearer pat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadatabase": { "status": "healthy" },
            "scheduler": {
                "status": "healthy",
                "latest_scheduler_heartbeat": "2025-03-01T12:00:00Z"
            }
        })))
        .mount(&server)
        .await;

    let health = client.health().await.unwrap();
    let scheduler = health.scheduler.unwrap();
    assert_eq!(scheduler.status.as_deref(), Some("healthy"));
    assert_eq!(scheduler.heartbeat(), Some("2025-03-01T12:00:00Z"));
    assert!(health.triggerer.is_none());
}

#[tokio::test]
async fn test_missing_username_is_authentication_error() {
    let (server, client) = setup(Credentials::Basic {
        username: String::new(),
        password: SecretString::from("x"),
    })
    .await;
    mount_token(&server, "unused", 0).await;

    let result = client.list_dags(&ListOptions::default()).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_no_credentials_is_authentication_error() {
    let (_server, client) = setup(Credentials::None).await;
    let result = client.ensure_token().await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_rejected_exchange_carries_status_and_body() {
    let (server, client) = setup(basic()).await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .mount(&server)
        .await;

    let err = client.ensure_token().await.unwrap_err();
    assert!(err.is_auth_failure());
    let message = err.to_string();
    assert!(message.contains("401"), "{message}");
    assert!(message.contains("invalid credentials"), "{message}");
}

// ── Request handling ────────────────────────────────────────────────

#[tokio::test]
async fn test_non_success_status_is_api_error() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dags/missing/dagRuns"))
        .respond_with(ResponseTemplate::new(404).set_body_string("DAG not found"))
        .mount(&server)
        .await;

    let err = client
        .list_dag_runs("missing", &ListOptions::default())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "DAG not found");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dags"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let result = client.list_dags(&ListOptions::default()).await;
    match result {
        Err(Error::Deserialization { body, .. }) => assert!(body.contains("proxy error")),
        other => panic!("expected Deserialization error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_options_become_query_params() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dags/etl/dagRuns"))
        .and(query_param("limit", "50"))
        .and(query_param("order_by", "-start_date"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dag_runs": [{
                "dag_id": "etl",
                "dag_run_id": "manual__2025-03-01",
                "state": "running",
                "start_date": "2025-03-01T00:00:05Z",
                "end_date": null,
                "run_type": "manual"
            }],
            "total_entries": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let runs = client
        .list_dag_runs("etl", &ListOptions::limit(50).order_by("-start_date"))
        .await
        .unwrap();
    assert_eq!(runs.dag_runs.len(), 1);
    assert_eq!(runs.dag_runs[0].state.as_deref(), Some("running"));
    assert!(runs.dag_runs[0].end_date.is_none());
}

#[tokio::test]
async fn test_task_logs_render_and_default_try() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("GET"))
        .and(path(
            "/api/v2/dags/etl/dagRuns/r1/taskInstances/extract/logs/1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "event": "::group::Log message source details" },
                { "event": "Starting attempt 1 of 3", "timestamp": "2025-03-01T00:00:01Z" },
                { "event": "Task exited with return code 0", "timestamp": "2025-03-01T00:00:09Z" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let logs = client.task_logs("etl", "r1", "extract", 0).await.unwrap();
    insta::assert_snapshot!(logs, @r"
    ::group::Log message source details
    [2025-03-01T00:00:01Z] Starting attempt 1 of 3
    [2025-03-01T00:00:09Z] Task exited with return code 0
    ");
}

#[tokio::test]
async fn test_dag_source_is_plain_text() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("GET"))
        .and(path("/api/v2/dagSources/etl"))
        .and(header("accept", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from airflow import DAG\n"))
        .mount(&server)
        .await;

    let source = client.dag_source("etl").await.unwrap();
    assert_eq!(source, "from airflow import DAG\n");
}

#[tokio::test]
async fn test_set_paused_sends_patch_body() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("PATCH"))
        .and(path("/api/v2/dags/etl"))
        .and(body_json(json!({ "is_paused": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dag_id": "etl" })))
        .expect(1)
        .mount(&server)
        .await;

    client.set_paused("etl", true).await.unwrap();
}

#[tokio::test]
async fn test_trigger_posts_logical_date() {
    let (server, client) = setup(Credentials::StaticToken(SecretString::from("pat"))).await;

    Mock::given(method("POST"))
        .and(path("/api/v2/dags/etl/dagRuns"))
        .and(body_json(json!({ "logical_date": null, "conf": { "full": true } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dag_id": "etl",
            "dag_run_id": "manual__now",
            "state": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let run = client
        .trigger_dag_run(
            "etl",
            &TriggerDagRunRequest {
                logical_date: None,
                conf: Some(json!({ "full": true })),
            },
        )
        .await
        .unwrap();
    assert_eq!(run.dag_run_id, "manual__now");
}

#[tokio::test]
async fn test_base_path_prefix_is_preserved() {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/airflow/", server.uri())).unwrap();
    let client = FlowClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::StaticToken(SecretString::from("pat")),
    )
    .with_pacer(Pacer::new(Duration::ZERO));

    Mock::given(method("GET"))
        .and(path("/airflow/api/v2/variables"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "variables": [{ "key": "env", "value": "prod", "description": null }],
            "total_entries": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let vars = client.list_variables(&ListOptions::default()).await.unwrap();
    assert_eq!(vars.variables[0].key, "env");
}

// ── Pacing ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_every_call_waits_for_a_pacer_slot() {
    let server = MockServer::start().await;
    let client = FlowClient::with_client(
        reqwest::Client::new(),
        Url::parse(&server.uri()).unwrap(),
        Credentials::StaticToken(SecretString::from("pat")),
    )
    .with_pacer(Pacer::new(Duration::from_millis(100)));

    Mock::given(method("GET"))
        .and(path("/api/v2/dags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dags": [], "total_entries": 0 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/dags/etl/dagRuns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dag_id": "etl",
            "dag_run_id": "manual__now",
            "state": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v2/dags/etl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "dag_id": "etl" })))
        .expect(1)
        .mount(&server)
        .await;

    let start = Instant::now();
    client.list_dags(&ListOptions::default()).await.unwrap();
    client
        .trigger_dag_run(
            "etl",
            &TriggerDagRunRequest {
                logical_date: None,
                conf: None,
            },
        )
        .await
        .unwrap();
    client.set_paused("etl", true).await.unwrap();

    // First slot is free; the other two wait a full period each.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(200), "calls took {elapsed:?}");
}
