//! Upgrade information sources and their reconciliation.
//!
//! Two upstreams publish upgrade facts in unrelated shapes:
//!
//! - [`RegistryPlanProvider`]: per-chain `upgrades.json` next to the chain descriptor
//! - [`UpgradeFeedProvider`]: one shared feed listing upcoming upgrades for many chains
//!
//! [`UpgradeSourceMerger`] queries them in priority order and converts the first usable
//! answer into an [`UpgradeRecord`](crate::types::UpgradeRecord).

pub mod feed;
pub mod merger;
pub mod plan;

use async_trait::async_trait;

use crate::{
    registry::RegistryError,
    types::{ChainDescriptor, UpgradeRecord, UpgradeSource},
};

pub use feed::UpgradeFeedProvider;
pub use merger::UpgradeSourceMerger;
pub use plan::RegistryPlanProvider;

/// A single upstream that can report a chain's next upgrade.
#[async_trait]
pub trait UpgradeProvider: Send + Sync {
    /// Identifies the provider in records and logs.
    fn origin(&self) -> UpgradeSource;

    /// Looks up the upgrade for one chain.
    ///
    /// `Ok(None)` means the provider has nothing for this chain.
    ///
    /// # Errors
    ///
    /// Any transport, status or decode failure. The merger swallows these.
    async fn fetch_upgrade(
        &self,
        canonical_name: &str,
        descriptor: &ChainDescriptor,
    ) -> Result<Option<UpgradeRecord>, RegistryError>;
}
