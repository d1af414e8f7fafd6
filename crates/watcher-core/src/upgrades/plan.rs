use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    registry::{RegistryClient, RegistryError, RegistryLayout},
    types::{ChainDescriptor, UpgradeRecord, UpgradeSource},
    upgrades::UpgradeProvider,
    utils::{deserialize_height, parse_timestamp_or_now},
};

/// One entry of a per-chain `upgrades.json` document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpgradePlan {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_height")]
    pub height: i64,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub proposal_link: Option<String>,
    #[serde(default)]
    pub guide: Option<String>,
    #[serde(default)]
    pub cosmovisor_folder: Option<String>,
}

/// `upgrades.json` is either a single plan or a list of plans.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PlanDocument {
    Single(UpgradePlan),
    List(Vec<UpgradePlan>),
}

impl PlanDocument {
    /// Picks the plan to report: the single entry, or the highest-height entry of a list.
    #[must_use]
    pub fn into_latest(self) -> Option<UpgradePlan> {
        match self {
            Self::Single(plan) => Some(plan),
            Self::List(plans) => plans.into_iter().max_by_key(|p| p.height),
        }
    }
}

impl UpgradePlan {
    /// Converts the plan into the canonical record.
    #[must_use]
    pub fn into_record(self, descriptor: &ChainDescriptor) -> UpgradeRecord {
        let version_label = self
            .version
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| self.name.clone());
        let cosmovisor_folder = self
            .cosmovisor_folder
            .filter(|f| !f.trim().is_empty())
            .or_else(|| (!self.name.is_empty()).then(|| format!("upgrades/{}", self.name)));

        UpgradeRecord {
            chain_name: descriptor.name.clone(),
            upgrade_name: self.name,
            network: descriptor.network,
            target_height: self.height,
            target_time: parse_timestamp_or_now(self.time.as_deref(), &descriptor.name),
            source: UpgradeSource::RegistryPlan,
            version_label,
            estimated: true,
            guide: self.guide.unwrap_or_else(|| self.info.clone()),
            info: self.info,
            proposal_link: self.proposal_link.filter(|l| !l.is_empty()),
            block_explorer_link: None,
            cosmovisor_folder,
            repository: None,
            git_hash: None,
            rpc_endpoint: None,
            api_endpoint: None,
        }
    }
}

/// Reads the upgrade plan hosted next to each chain descriptor.
pub struct RegistryPlanProvider {
    client: Arc<RegistryClient>,
    layout: RegistryLayout,
}

impl RegistryPlanProvider {
    #[must_use]
    pub fn new(client: Arc<RegistryClient>, layout: RegistryLayout) -> Self {
        Self { client, layout }
    }
}

#[async_trait]
impl UpgradeProvider for RegistryPlanProvider {
    fn origin(&self) -> UpgradeSource {
        UpgradeSource::RegistryPlan
    }

    async fn fetch_upgrade(
        &self,
        canonical_name: &str,
        descriptor: &ChainDescriptor,
    ) -> Result<Option<UpgradeRecord>, RegistryError> {
        let url = self.layout.upgrade_plan_url(canonical_name, descriptor.network);
        let document: PlanDocument = self.client.get_json(&url).await?;
        Ok(document.into_latest().map(|plan| plan.into_record(descriptor)))
    }
}
