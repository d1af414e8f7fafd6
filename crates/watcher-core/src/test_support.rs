//! Shared fixtures for unit tests that need an engine wired to a mock registry.

use serde_json::json;
use std::{sync::Arc, time::Duration};

use crate::{
    cache::ChainStore,
    engine::{ChainEngine, EngineSettings},
    registry::{IdentityResolver, MetadataFetcher, RegistryClient, RegistryClientConfig, RegistryLayout},
    types::{Network, UpgradeRecord, UpgradeSource},
    upgrades::UpgradeSourceMerger,
};

pub(crate) const FEED_PATH: &str = "/api/v2/chain_upgrades";

/// Engine whose registry and feed both point at `server`.
pub(crate) fn engine_for(server: &mockito::Server, ttl: Duration) -> Arc<ChainEngine> {
    let client = Arc::new(RegistryClient::new(RegistryClientConfig::default()).unwrap());
    let layout = RegistryLayout::new(&server.url(), "", "testnets");
    let feed = format!("{}{FEED_PATH}", server.url());
    Arc::new(ChainEngine::new(
        Arc::new(ChainStore::new(ttl)),
        IdentityResolver::new(client.clone(), layout.clone()),
        MetadataFetcher::new(client.clone(), layout.clone()),
        UpgradeSourceMerger::standard(client, layout, Some(&feed)),
        EngineSettings::default(),
    ))
}

pub(crate) fn chain_json(name: &str) -> String {
    json!({
        "chain_name": name,
        "chain_id": format!("{name}-1"),
        "codebase": {"recommended_version": "v1.0.0"},
        "apis": {"rpc": [{"address": format!("https://rpc.{name}.example")}]}
    })
    .to_string()
}

/// Mocks a mainnet chain whose descriptor resolves and whose registry plan is missing.
pub(crate) async fn mock_mainnet_chain(server: &mut mockito::Server, name: &str) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("HEAD", format!("/{name}/chain.json").as_str())
            .with_status(200)
            .create_async()
            .await,
        server
            .mock("GET", format!("/{name}/chain.json").as_str())
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(chain_json(name))
            .create_async()
            .await,
        server
            .mock("GET", format!("/{name}/upgrades.json").as_str())
            .with_status(404)
            .create_async()
            .await,
    ]
}

/// Feed entry for `name` with an upgrade at `height`, `hours_ahead` from now.
pub(crate) fn feed_entry(name: &str, height: i64, hours_ahead: i64) -> serde_json::Value {
    let when = chrono::Utc::now() + chrono::TimeDelta::hours(hours_ahead);
    json!({
        "network": name,
        "chain_name": name,
        "repo": format!("https://github.com/example/{name}"),
        "node_version": "v2.0.0",
        "cosmovisor_folder": "v2",
        "git_hash": "abc123",
        "proposal": 42,
        "block": height,
        "block_link": format!("https://www.mintscan.io/{name}/blocks/{height}"),
        "estimated_upgrade_time": when.to_rfc3339(),
        "guide": "https://docs.example/upgrade"
    })
}

/// A pending feed-sourced record `hours_ahead` from now.
pub(crate) fn upgrade_record(chain: &str, hours_ahead: i64) -> UpgradeRecord {
    UpgradeRecord {
        chain_name: chain.to_string(),
        upgrade_name: "v2".to_string(),
        network: Network::Mainnet,
        target_height: 1_000,
        target_time: chrono::Utc::now() + chrono::TimeDelta::hours(hours_ahead),
        source: UpgradeSource::UpgradeFeed,
        version_label: "v2.0.0".to_string(),
        estimated: true,
        info: String::new(),
        guide: String::new(),
        proposal_link: None,
        block_explorer_link: None,
        cosmovisor_folder: None,
        repository: None,
        git_hash: None,
        rpc_endpoint: None,
        api_endpoint: None,
    }
}
