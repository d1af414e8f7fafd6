//! Runtime lifecycle against a mock registry.
//!
//! Verifies that startup loads the chain list, that each job does its work when
//! triggered, that upgrades are announced once, and that shutdown is idempotent.
//!
//! Every periodic job is disabled so runs happen only through `run_now`; tests that
//! wait on background work use `tokio::time::timeout` to avoid hanging on failure.

use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, timeout};
use watcher_core::{
    config::AppConfig,
    runtime::{builder::RuntimeError, WatcherRuntime},
    types::Network,
};

use crate::mock_infrastructure::{chains_file, upgrade_plan, RecordingSink, RegistryMockBuilder};

fn build_runtime(
    config: AppConfig,
    sink: &Arc<RecordingSink>,
    startup_notifier: bool,
) -> WatcherRuntime {
    let builder = WatcherRuntime::builder()
        .with_config(config)
        .with_notifier(sink.clone())
        .disable_cache_sweeper();
    let builder = if startup_notifier { builder } else { builder.disable_startup_notifier() };
    builder.build().unwrap()
}

fn config_with_chains(registry: &RegistryMockBuilder, file: &tempfile::NamedTempFile) -> AppConfig {
    let mut config = registry.config();
    config.chains_file = file.path().to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn test_start_loads_monitored_chains() {
    let registry = RegistryMockBuilder::new().await;
    let file = chains_file(&["osmosis", "juno"], &["osmosistestnet"]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, false);

    runtime.start().await.unwrap();

    assert_eq!(runtime.engine().monitored_chains(), ["osmosis", "juno", "osmosistestnet"]);
    assert!(runtime.scheduler().is_running());
    assert_eq!(runtime.engine().store().stats().descriptors_present, 0);

    runtime.shutdown().await;
    assert!(!runtime.scheduler().is_running());
}

#[tokio::test]
async fn test_start_fails_on_missing_chain_list() {
    let registry = RegistryMockBuilder::new().await;
    let mut config = registry.config();
    config.chains_file = "does/not/exist.yaml".to_string();
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config, &sink, false);

    let result = runtime.start().await;

    assert!(matches!(result, Err(RuntimeError::Initialization(_))));
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_load_chains_job_reloads_edited_list() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("osmosis", Network::Mainnet)
        .await
        .mock_chain("akash", Network::Mainnet)
        .await
        .mock_no_upgrade_plans()
        .await
        .mock_feed(&[], None)
        .await;
    let file = chains_file(&["osmosis"], &[]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, false);
    runtime.start().await.unwrap();

    std::fs::write(file.path(), "mainnet:\n  - name: osmosis\n  - name: akash\ntestnet: []\n")
        .unwrap();
    let status = runtime.scheduler().run_now("load-chains").await.unwrap();

    assert_eq!(status.run_count, 1);
    assert_eq!(status.failure_count, 0);
    assert_eq!(runtime.engine().monitored_chains(), ["osmosis", "akash"]);
    assert_eq!(runtime.engine().store().stats().descriptors_present, 2);
    assert!(runtime.engine().is_upgrade_cached("akash"));
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_upgrade_checker_announces_once() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("osmosis", Network::Mainnet)
        .await
        .mock_upgrade_plan("osmosis", Network::Mainnet, &upgrade_plan("v26", 22_000_000, 72))
        .await
        .mock_chain("juno", Network::Mainnet)
        .await
        .mock_no_upgrade_plan("juno", Network::Mainnet)
        .await
        .mock_feed(&[], None)
        .await;
    let file = chains_file(&["osmosis", "juno"], &[]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, false);
    runtime.start().await.unwrap();

    let first = runtime.scheduler().run_now("upgrade-checker").await.unwrap();
    let second = runtime.scheduler().run_now("upgrade-checker").await.unwrap();

    assert_eq!(first.run_count, 1);
    assert_eq!(second.run_count, 2);
    assert_eq!(second.failure_count, 0);
    assert!(second.last_error.is_none());

    let notified = sink.records();
    assert_eq!(notified.len(), 1);
    assert_eq!(notified[0].chain_name, "osmosis");
    assert_eq!(notified[0].target_height, 22_000_000);
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_registry_poller_records_partial_failure() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("osmosis", Network::Mainnet)
        .await
        .mock_probe("broken", Network::Mainnet, 503, None)
        .await
        .mock_no_upgrade_plans()
        .await
        .mock_feed(&[], None)
        .await;
    let file = chains_file(&["osmosis", "broken"], &[]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, false);
    runtime.start().await.unwrap();

    let status = runtime.scheduler().run_now("registry-poller").await.unwrap();

    assert_eq!(status.run_count, 1);
    assert_eq!(status.failure_count, 1);
    assert!(status.last_error.is_some());
    assert!(runtime.engine().store().identity("osmosis").is_some());
    assert!(runtime.engine().store().identity("broken").is_none());
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_unknown_job_is_rejected() {
    let registry = RegistryMockBuilder::new().await;
    let file = chains_file(&[], &[]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, false);

    assert!(runtime.scheduler().run_now("nightly-backup").await.is_err());
    assert!(runtime.scheduler().job_status("nightly-backup").is_none());
    assert_eq!(runtime.scheduler().list_jobs().len(), 3);
}

#[tokio::test]
async fn test_startup_notifier_announces_after_delay() {
    let mut registry = RegistryMockBuilder::new().await;
    registry
        .mock_chain("akash", Network::Mainnet)
        .await
        .mock_upgrade_plan("akash", Network::Mainnet, &upgrade_plan("v0.38", 15_000_000, 24))
        .await
        .mock_feed(&[], None)
        .await;
    let file = chains_file(&["akash"], &[]);
    let mut config = config_with_chains(&registry, &file);
    config.notifications.notify_on_startup = true;
    config.notifications.startup_delay_seconds = 0;
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config, &sink, true);

    runtime.start().await.unwrap();
    timeout(Duration::from_secs(5), async {
        while sink.records().is_empty() {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();

    // The scheduled checker must not announce the same upgrade again.
    runtime.scheduler().run_now("upgrade-checker").await.unwrap();
    assert_eq!(sink.records().len(), 1);
    assert_eq!(sink.records()[0].upgrade_name, "v0.38");
    runtime.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let registry = RegistryMockBuilder::new().await;
    let file = chains_file(&["osmosis"], &[]);
    let sink = Arc::new(RecordingSink::new());
    let runtime = build_runtime(config_with_chains(&registry, &file), &sink, true);
    runtime.start().await.unwrap();

    timeout(Duration::from_secs(2), runtime.shutdown()).await.unwrap();
    timeout(Duration::from_secs(2), runtime.shutdown()).await.unwrap();
    assert!(!runtime.scheduler().is_running());
}
