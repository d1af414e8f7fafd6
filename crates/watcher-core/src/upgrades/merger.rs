use std::sync::Arc;

use crate::{
    registry::{RegistryClient, RegistryLayout},
    types::{ChainDescriptor, UpgradeRecord},
    upgrades::{RegistryPlanProvider, UpgradeFeedProvider, UpgradeProvider},
};

/// Block explorer used when a source does not supply a block link.
const DEFAULT_BLOCK_EXPLORER: &str = "https://www.mintscan.io";

/// Consults upgrade providers in priority order; the first usable answer wins.
///
/// Provider errors never escape: they are logged and the next provider is tried.
/// "No known upgrade" is reported as `None`.
pub struct UpgradeSourceMerger {
    providers: Vec<Arc<dyn UpgradeProvider>>,
}

impl UpgradeSourceMerger {
    /// Creates a merger over an explicit, ordered list of providers.
    #[must_use]
    pub fn new(providers: Vec<Arc<dyn UpgradeProvider>>) -> Self {
        Self { providers }
    }

    /// Creates the standard merger: registry plan first, then the shared feed.
    #[must_use]
    pub fn standard(
        client: Arc<RegistryClient>,
        layout: RegistryLayout,
        feed_url: Option<&str>,
    ) -> Self {
        let mut providers: Vec<Arc<dyn UpgradeProvider>> =
            vec![Arc::new(RegistryPlanProvider::new(client.clone(), layout))];
        if let Some(url) = feed_url.filter(|u| !u.is_empty()) {
            providers.push(Arc::new(UpgradeFeedProvider::new(client, url)));
        }
        Self::new(providers)
    }

    /// Resolves the upgrade for a chain whose descriptor has already been fetched.
    pub async fn resolve_upgrade(
        &self,
        canonical_name: &str,
        descriptor: &ChainDescriptor,
    ) -> Option<UpgradeRecord> {
        for provider in &self.providers {
            let origin = provider.origin().as_str();
            match provider.fetch_upgrade(canonical_name, descriptor).await {
                Ok(Some(record)) => {
                    let record = finish_record(record, descriptor);
                    if record.is_pending() {
                        tracing::debug!(
                            chain = %canonical_name,
                            source = origin,
                            height = record.target_height,
                            version = %record.version_label,
                            "upgrade resolved"
                        );
                        return Some(record);
                    }
                    tracing::debug!(
                        chain = %canonical_name,
                        source = origin,
                        height = record.target_height,
                        "ignoring upgrade without height or version"
                    );
                }
                Ok(None) => {
                    tracing::trace!(chain = %canonical_name, source = origin, "no upgrade listed");
                }
                Err(e) => {
                    tracing::debug!(
                        chain = %canonical_name,
                        source = origin,
                        error = %e,
                        "upgrade source failed, trying next"
                    );
                }
            }
        }
        None
    }
}

/// Fills gaps a source left open from the descriptor.
fn finish_record(mut record: UpgradeRecord, descriptor: &ChainDescriptor) -> UpgradeRecord {
    record.estimated = true;
    record.network = descriptor.network;
    if record.block_explorer_link.is_none() && record.target_height > 0 {
        record.block_explorer_link = Some(format!(
            "{DEFAULT_BLOCK_EXPLORER}/{}/blocks/{}",
            record.chain_name, record.target_height
        ));
    }
    if record.rpc_endpoint.is_none() {
        record.rpc_endpoint = descriptor.primary_rpc().map(str::to_string);
    }
    if record.api_endpoint.is_none() {
        record.api_endpoint = descriptor.primary_rest().map(str::to_string);
    }
    record
}
