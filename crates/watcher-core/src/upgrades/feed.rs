use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::{
    registry::{RegistryClient, RegistryError},
    types::{ChainDescriptor, UpgradeRecord, UpgradeSource},
    upgrades::UpgradeProvider,
    utils::{deserialize_height, parse_timestamp_or_now},
};

/// One item of the shared upcoming-upgrades feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub network: String,
    #[serde(default)]
    pub chain_name: String,
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub node_version: String,
    #[serde(default)]
    pub cosmovisor_folder: Option<String>,
    #[serde(default)]
    pub git_hash: Option<String>,
    #[serde(default)]
    pub proposal: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_height")]
    pub block: i64,
    #[serde(default)]
    pub block_link: Option<String>,
    #[serde(default)]
    pub estimated_upgrade_time: Option<String>,
    #[serde(default)]
    pub guide: Option<String>,
    #[serde(default)]
    pub rpc: Option<String>,
    #[serde(default)]
    pub api: Option<String>,
}

/// The feed answers with either a bare array or an object wrapping it in `data`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum FeedResponse {
    List(Vec<FeedEntry>),
    Wrapped { data: Vec<FeedEntry> },
}

impl FeedResponse {
    #[must_use]
    pub fn into_entries(self) -> Vec<FeedEntry> {
        match self {
            Self::List(entries) | Self::Wrapped { data: entries } => entries,
        }
    }
}

/// Decodes a raw feed body.
///
/// # Errors
///
/// Returns [`RegistryError::Decode`] for HTML pages (the feed's error responses) and
/// for bodies that match neither accepted shape.
pub fn decode_feed(body: &[u8]) -> Result<Vec<FeedEntry>, RegistryError> {
    if body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'<') {
        return Err(RegistryError::Decode("upgrade feed returned HTML".to_string()));
    }
    let response: FeedResponse = serde_json::from_slice(body)
        .map_err(|e| RegistryError::Decode(format!("upgrade feed: {e}")))?;
    Ok(response.into_entries())
}

/// Finds the entry for a chain, trying exact matches before case-insensitive ones.
///
/// Every candidate name is compared against both the entry's `network` key and its
/// display `chain_name`.
#[must_use]
pub fn find_entry<'a>(entries: &'a [FeedEntry], candidates: &[&str]) -> Option<&'a FeedEntry> {
    let candidates: Vec<&str> =
        candidates.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect();

    entries
        .iter()
        .find(|e| candidates.iter().any(|c| e.network == *c || e.chain_name == *c))
        .or_else(|| {
            entries.iter().find(|e| {
                candidates.iter().any(|c| {
                    e.network.eq_ignore_ascii_case(c) || e.chain_name.eq_ignore_ascii_case(c)
                })
            })
        })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl FeedEntry {
    /// Converts the feed item into the canonical record.
    #[must_use]
    pub fn into_record(self, descriptor: &ChainDescriptor) -> UpgradeRecord {
        let guide = self.guide.unwrap_or_default();
        UpgradeRecord {
            chain_name: descriptor.name.clone(),
            upgrade_name: self.node_version.clone(),
            network: descriptor.network,
            target_height: self.block,
            target_time: parse_timestamp_or_now(
                self.estimated_upgrade_time.as_deref(),
                &descriptor.name,
            ),
            source: UpgradeSource::UpgradeFeed,
            version_label: self.node_version,
            estimated: true,
            info: guide.clone(),
            guide,
            proposal_link: self.proposal.as_ref().and_then(value_to_string),
            block_explorer_link: non_empty(self.block_link),
            cosmovisor_folder: non_empty(self.cosmovisor_folder),
            repository: non_empty(self.repo),
            git_hash: non_empty(self.git_hash),
            rpc_endpoint: non_empty(self.rpc),
            api_endpoint: non_empty(self.api),
        }
    }
}

/// Reads the shared multi-chain upgrade feed.
pub struct UpgradeFeedProvider {
    client: Arc<RegistryClient>,
    feed_url: String,
}

impl UpgradeFeedProvider {
    #[must_use]
    pub fn new(client: Arc<RegistryClient>, feed_url: impl Into<String>) -> Self {
        Self { client, feed_url: feed_url.into() }
    }
}

#[async_trait]
impl UpgradeProvider for UpgradeFeedProvider {
    fn origin(&self) -> UpgradeSource {
        UpgradeSource::UpgradeFeed
    }

    async fn fetch_upgrade(
        &self,
        canonical_name: &str,
        descriptor: &ChainDescriptor,
    ) -> Result<Option<UpgradeRecord>, RegistryError> {
        let body = self.client.get_bytes(&self.feed_url).await?;
        let entries = decode_feed(&body)?;

        let mut candidates = vec![canonical_name, descriptor.name.as_str()];
        if let Some(pretty) = descriptor.pretty_name.as_deref() {
            candidates.push(pretty);
        }

        Ok(find_entry(&entries, &candidates).cloned().map(|entry| entry.into_record(descriptor)))
    }
}
