//! HTTP requests against the served application.
//!
//! Each test binds the same stack the server binary runs (`create_app`) to a local
//! port and talks to it over reqwest, so the timeout layers, CORS and tracing all
//! sit in the request path.

use reqwest::StatusCode;
use serde_json::{json, Value};
use server::{create_app, AppState};
use std::time::Duration;
use watcher_core::{config::AppConfig, runtime::WatcherRuntime, types::Network};

use crate::mock_infrastructure::{stalled_registry, upgrade_plan, RegistryMockBuilder};

fn build_runtime(config: AppConfig) -> WatcherRuntime {
    WatcherRuntime::builder()
        .with_config(config)
        .disable_cache_sweeper()
        .disable_startup_notifier()
        .build()
        .unwrap()
}

async fn serve(runtime: &WatcherRuntime, request_timeout: Duration) -> String {
    let app = create_app(AppState::from_runtime(runtime), request_timeout);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    base
}

async fn get(url: &str) -> (StatusCode, Option<String>, Value) {
    let response = reqwest::get(url).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);
    let bytes = response.bytes().await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, content_type, body)
}

#[tokio::test]
async fn test_upgrades_past_read_deadline_is_504_json() {
    let mut config = RegistryMockBuilder::config_for(&stalled_registry().await);
    config.fanout.read_deadline_seconds = 1;
    config.server.request_timeout_seconds = 3;
    let request_timeout = config.request_timeout();
    let runtime = build_runtime(config);
    runtime.engine().set_monitored_chains(vec!["osmosis".into(), "juno".into()]);
    let base = serve(&runtime, request_timeout).await;

    let (status, content_type, body) = get(&format!("{base}/api/v1/upgrades")).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({ "error": "request timeout" }));
}

#[tokio::test]
async fn test_request_timeout_is_504_json() {
    let mut config = RegistryMockBuilder::config_for(&stalled_registry().await);
    config.fanout.read_deadline_seconds = 5;
    let runtime = build_runtime(config);
    let base = serve(&runtime, Duration::from_millis(300)).await;

    let (status, content_type, body) = get(&format!("{base}/api/v1/chains/juno")).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, json!({ "error": "request timeout" }));
}

#[tokio::test]
async fn test_upgrades_within_deadline_are_listed() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("osmosis", Network::Mainnet)
        .await
        .mock_upgrade_plan("osmosis", Network::Mainnet, &upgrade_plan("v26", 22_000_000, 48))
        .await
        .mock_chain("juno", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("juno", Network::Mainnet)
        .await
        .mock_feed(&[], None)
        .await;
    let config = registry.config();
    let request_timeout = config.request_timeout();
    let runtime = build_runtime(config);
    runtime.engine().set_monitored_chains(vec!["osmosis".into(), "juno".into()]);
    let base = serve(&runtime, request_timeout).await;

    let (status, _, body) = get(&format!("{base}/api/v1/upgrades")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["upgrades"][0]["chain_name"], "osmosis");
}
