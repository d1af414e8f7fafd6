//! Test Helper Functions and Utilities
//!
//! Registry documents, feed items, chain list files and a recording notification sink.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::io::Write;
use watcher_core::{
    notify::{NotificationSink, NotifyError},
    types::UpgradeRecord,
};

/// Creates a registry-style `chain.json` document.
#[must_use]
pub fn chain_document(name: &str) -> Value {
    json!({
        "chain_name": name,
        "chain_id": format!("{name}-1"),
        "pretty_name": format!("{name} Network"),
        "codebase": {"recommended_version": "v1.0.0"},
        "apis": {
            "rpc": [{"address": format!("https://rpc.{name}.example")}],
            "rest": [{"address": format!("https://api.{name}.example")}]
        },
        "explorers": [{"kind": "mintscan", "url": format!("https://www.mintscan.io/{name}")}]
    })
}

/// Creates a single-entry `upgrades.json` document `hours_ahead` from now.
#[must_use]
pub fn upgrade_plan(name: &str, height: i64, hours_ahead: i64) -> Value {
    json!({
        "name": name,
        "height": height.to_string(),
        "info": format!("https://github.com/example/releases/{name}"),
        "time": (Utc::now() + TimeDelta::hours(hours_ahead)).to_rfc3339(),
        "version": format!("{name}.0.0")
    })
}

/// Creates one upgrade feed item keyed by `network_key`.
#[must_use]
pub fn feed_item(network_key: &str, height: i64, hours_ahead: i64) -> Value {
    json!({
        "network": network_key,
        "chain_name": network_key,
        "repo": format!("https://github.com/example/{network_key}"),
        "node_version": "v3.0.0",
        "cosmovisor_folder": "v3",
        "git_hash": "0123abcd",
        "proposal": 17,
        "block": height,
        "estimated_upgrade_time": (Utc::now() + TimeDelta::hours(hours_ahead)).to_rfc3339(),
        "guide": "https://docs.example/upgrade"
    })
}

/// Writes a chain list YAML file.
///
/// # Panics
///
/// Panics if the temporary file cannot be written.
#[must_use]
pub fn chains_file(mainnet: &[&str], testnet: &[&str]) -> tempfile::NamedTempFile {
    let section = |names: &[&str]| -> String {
        if names.is_empty() {
            " []\n".to_string()
        } else {
            names.iter().map(|n| format!("\n  - name: {n}")).collect::<String>() + "\n"
        }
    };
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().expect("temp file");
    write!(file, "mainnet:{}testnet:{}", section(mainnet), section(testnet)).expect("write chains");
    file
}

/// Notification sink that keeps every record it is handed.
#[derive(Default)]
pub struct RecordingSink {
    records: Mutex<Vec<UpgradeRecord>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn records(&self) -> Vec<UpgradeRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn notify_upgrade(&self, record: &UpgradeRecord) -> Result<(), NotifyError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Starts a registry stand-in that accepts connections and never answers.
///
/// # Panics
///
/// Panics if no local port can be bound.
pub async fn stalled_registry() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let url = format!("http://{}", listener.local_addr().expect("local addr"));
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    url
}
