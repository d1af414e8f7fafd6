//! Canonical data shapes shared by the resolver, the upgrade merger and the API layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Registry partition a chain was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" | "testnets" => Ok(Self::Testnet),
            other => Err(format!("unknown network: {other}")),
        }
    }
}

/// RPC and REST addresses published for a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoints {
    #[serde(default)]
    pub rpc: Vec<String>,
    #[serde(default)]
    pub rest: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explorer {
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_page: Option<String>,
}

/// Resolved, cached facts about one chain.
///
/// Instances are shared behind `Arc` once cached and never mutated afterwards, so
/// `name` and `network` only change when a forced refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub name: String,
    pub network: Network,
    pub chain_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pretty_name: Option<String>,
    pub current_version: String,
    pub current_height: i64,
    pub api_endpoints: ApiEndpoints,
    pub explorers: Vec<Explorer>,
    pub last_resolved_at: DateTime<Utc>,
}

impl ChainDescriptor {
    #[must_use]
    pub fn primary_rpc(&self) -> Option<&str> {
        self.api_endpoints.rpc.first().map(String::as_str)
    }

    #[must_use]
    pub fn primary_rest(&self) -> Option<&str> {
        self.api_endpoints.rest.first().map(String::as_str)
    }
}

/// Upstream provider an [`UpgradeRecord`] was converted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeSource {
    /// Per-chain `upgrades.json` hosted next to the chain descriptor.
    RegistryPlan,
    /// Shared multi-chain upcoming-upgrades feed.
    UpgradeFeed,
}

impl UpgradeSource {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistryPlan => "registry_plan",
            Self::UpgradeFeed => "upgrade_feed",
        }
    }
}

/// Canonical, source-agnostic upgrade fact for one chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeRecord {
    pub chain_name: String,
    pub upgrade_name: String,
    pub network: Network,
    pub target_height: i64,
    pub target_time: DateTime<Utc>,
    pub source: UpgradeSource,
    pub version_label: String,
    /// Neither upstream guarantees finality, so this is always `true` today.
    pub estimated: bool,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub guide: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposal_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorer_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cosmovisor_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
}

impl UpgradeRecord {
    /// Returns `true` if the record describes a real upgrade.
    ///
    /// Records without a positive target height or a version label are placeholders
    /// and must never be reported or notified as pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.target_height > 0 && !self.version_label.trim().is_empty()
    }
}
