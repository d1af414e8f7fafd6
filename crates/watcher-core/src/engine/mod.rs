//! The chain identity and upgrade resolution engine.
//!
//! [`ChainEngine`] is the only component that talks to the registry and upgrade
//! sources. Everything else (API handlers, jobs, the CLI) goes through it.
//!
//! # Resolution Flow
//!
//! ```text
//! get_upgrade_info(name)
//!   │
//!   ├─ upgrade cache hit (present or absent) ──────────────► return
//!   │
//!   ├─ lock upgrade:<name>, re-check cache
//!   │
//!   ├─ get_chain_info(name)
//!   │    ├─ descriptor cache hit ──────────────────────────► descriptor / cached error
//!   │    ├─ lock chain:<name>, re-check cache
//!   │    ├─ identity index hit? skip probing : IdentityResolver::resolve
//!   │    └─ MetadataFetcher::fetch_descriptor ─► cache (positive or negative)
//!   │
//!   └─ UpgradeSourceMerger::resolve_upgrade ─► cache record or absence
//! ```
//!
//! Locks are per chain and per namespace, so different chains resolve concurrently
//! while concurrent callers for the same chain share one upstream round trip.

pub mod fanout;

use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::{
    cache::{ChainStore, Slot},
    config::AppConfig,
    registry::{
        normalize_chain_name, IdentityResolver, MetadataFetcher, RegistryClient,
        RegistryClientConfig, RegistryError, RegistryLayout,
    },
    types::{ChainDescriptor, Network, UpgradeRecord},
    upgrades::UpgradeSourceMerger,
};

pub use fanout::{fan_out, fan_out_with_deadline, FanOutSummary};

/// Concurrency policy for aggregate operations.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// In-flight cap for background refreshes (chain loading, polling, startup).
    pub background_concurrency: usize,
    /// In-flight cap for interactive aggregate reads.
    pub read_concurrency: usize,
    /// Deadline for interactive aggregate reads.
    pub read_deadline: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            background_concurrency: 5,
            read_concurrency: 10,
            read_deadline: Duration::from_secs(30),
        }
    }
}

/// A chain's descriptor together with its current upgrade, if any.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedChain {
    pub descriptor: Arc<ChainDescriptor>,
    pub upgrade: Option<Arc<UpgradeRecord>>,
}

/// Result of an aggregate upgrade read.
#[derive(Debug, Clone, Default)]
pub struct UpgradeReport {
    /// Pending upgrades sorted by chain name, then network.
    pub upgrades: Vec<Arc<UpgradeRecord>>,
    /// Chains that could not be resolved, with the error message.
    pub failed: Vec<(String, String)>,
}

pub struct ChainEngine {
    store: Arc<ChainStore>,
    resolver: IdentityResolver,
    fetcher: MetadataFetcher,
    merger: UpgradeSourceMerger,
    settings: EngineSettings,
}

fn descriptor_from_slot(
    slot: Slot<ChainDescriptor>,
    key: &str,
) -> Result<Arc<ChainDescriptor>, RegistryError> {
    match slot {
        Slot::Present(descriptor) => Ok(descriptor),
        Slot::Absent(Some(e)) => Err(e),
        Slot::Absent(None) => Err(RegistryError::NotFound(key.to_string())),
    }
}

fn upgrade_from_slot(slot: Slot<UpgradeRecord>) -> Option<Arc<UpgradeRecord>> {
    match slot {
        Slot::Present(record) => Some(record),
        Slot::Absent(_) => None,
    }
}

impl ChainEngine {
    #[must_use]
    pub fn new(
        store: Arc<ChainStore>,
        resolver: IdentityResolver,
        fetcher: MetadataFetcher,
        merger: UpgradeSourceMerger,
        settings: EngineSettings,
    ) -> Self {
        Self { store, resolver, fetcher, merger, settings }
    }

    /// Builds an engine and its HTTP client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, RegistryError> {
        let registry = &config.registry;
        let client = Arc::new(RegistryClient::new(RegistryClientConfig {
            probe_timeout: Duration::from_millis(registry.probe_timeout_ms),
            request_timeout: Duration::from_secs(registry.request_timeout_seconds),
            concurrent_limit: registry.max_concurrent_requests,
            user_agent: registry.user_agent.clone(),
        })?);
        let layout = RegistryLayout::new(
            &registry.base_url,
            &registry.mainnet_partition,
            &registry.testnet_partition,
        );

        Ok(Self::new(
            Arc::new(ChainStore::new(config.cache.ttl())),
            IdentityResolver::new(client.clone(), layout.clone()),
            MetadataFetcher::new(client.clone(), layout.clone()),
            UpgradeSourceMerger::standard(client, layout, registry.upgrade_feed_url.as_deref()),
            EngineSettings {
                background_concurrency: config.fanout.background_concurrency,
                read_concurrency: config.fanout.read_concurrency,
                read_deadline: Duration::from_secs(config.fanout.read_deadline_seconds),
            },
        ))
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ChainStore> {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Cache key for `name`: its canonical name once any spelling of it has resolved,
    /// the normalized name before that.
    fn cache_key(&self, name: &str) -> Result<String, RegistryError> {
        let key = normalize_chain_name(name);
        if key.is_empty() {
            return Err(RegistryError::InvalidName(name.to_string()));
        }
        Ok(self.store.identity(&key).map_or(key, |identity| identity.canonical_name))
    }

    /// Returns the descriptor for `name`, resolving it on a miss or when forced.
    ///
    /// # Errors
    ///
    /// Returns the resolution or fetch failure, possibly from a negative cache entry.
    pub async fn get_chain_info(
        &self,
        name: &str,
        force_refresh: bool,
    ) -> Result<Arc<ChainDescriptor>, RegistryError> {
        let key = self.cache_key(name)?;
        let descriptors = self.store.descriptors();

        if !force_refresh {
            if let Some(slot) = descriptors.get(&key) {
                return descriptor_from_slot(slot, &key);
            }
        }

        let requested_at = Instant::now();
        let _guard = self.store.descriptor_locks().acquire(&key).await;

        // Another task may have resolved this chain while we waited for the lock.
        let settled = if force_refresh {
            descriptors.get_written_since(&key, requested_at)
        } else {
            descriptors.get(&key)
        };
        if let Some(slot) = settled {
            tracing::trace!(chain = %key, "descriptor resolved by concurrent caller");
            return descriptor_from_slot(slot, &key);
        }

        self.resolve_descriptor(&key, force_refresh).await
    }

    async fn resolve_descriptor(
        &self,
        key: &str,
        force_refresh: bool,
    ) -> Result<Arc<ChainDescriptor>, RegistryError> {
        let known = if force_refresh { None } else { self.store.identity(key) };
        let identity = match known {
            Some(identity) => identity,
            None => match self.resolver.resolve(key).await {
                Ok(identity) => identity,
                Err(e) => return Err(self.remember_descriptor_failure(key, e)),
            },
        };

        let canonical = identity.canonical_name.clone();
        if canonical != key && !force_refresh {
            // Another spelling of this chain already holds the descriptor.
            if let Some(Slot::Present(descriptor)) = self.store.descriptors().get(&canonical) {
                self.store.record_identity(key, identity);
                return Ok(descriptor);
            }
        }

        match self.fetcher.fetch_descriptor(&canonical, identity.network).await {
            Ok(descriptor) => {
                if let Some(previous) = self.store.record_identity(key, identity.clone()) {
                    if previous.network != identity.network {
                        tracing::warn!(
                            chain = %key,
                            previous = %previous.network,
                            current = %identity.network,
                            "chain network changed on forced refresh"
                        );
                    }
                }
                if canonical != key {
                    self.store.record_identity(&canonical, identity);
                }
                Ok(self.store.descriptors().insert(&canonical, Arc::new(descriptor)))
            }
            Err(e) => Err(self.remember_descriptor_failure(key, e)),
        }
    }

    fn remember_descriptor_failure(&self, key: &str, error: RegistryError) -> RegistryError {
        if error.is_cacheable() {
            tracing::debug!(chain = %key, error = %error, "caching negative descriptor entry");
            self.store.descriptors().insert_absent(key, Some(error.clone()));
        } else {
            tracing::warn!(chain = %key, error = %error, "chain resolution failed, will retry");
        }
        error
    }

    /// Returns the pending upgrade for `name`, or `None` if no source lists one.
    ///
    /// # Errors
    ///
    /// Only descriptor failures propagate; upgrade-source failures become `None`.
    pub async fn get_upgrade_info(
        &self,
        name: &str,
        force_refresh: bool,
    ) -> Result<Option<Arc<UpgradeRecord>>, RegistryError> {
        let key = self.cache_key(name)?;
        let upgrades = self.store.upgrades();

        if !force_refresh {
            if let Some(slot) = upgrades.get(&key) {
                return Ok(upgrade_from_slot(slot));
            }
        }

        let requested_at = Instant::now();
        let _guard = self.store.upgrade_locks().acquire(&key).await;

        let settled = if force_refresh {
            upgrades.get_written_since(&key, requested_at)
        } else {
            upgrades.get(&key)
        };
        if let Some(slot) = settled {
            return Ok(upgrade_from_slot(slot));
        }

        let descriptor = self.get_chain_info(&key, force_refresh).await?;
        let canonical = self
            .store
            .identity(&key)
            .map_or_else(|| descriptor.name.clone(), |identity| identity.canonical_name);
        if canonical != key && !force_refresh {
            if let Some(slot) = upgrades.get(&canonical) {
                return Ok(upgrade_from_slot(slot));
            }
        }

        match self.merger.resolve_upgrade(&canonical, &descriptor).await {
            Some(record) => Ok(Some(upgrades.insert(&canonical, Arc::new(record)))),
            None => {
                upgrades.insert_absent(&canonical, None);
                Ok(None)
            }
        }
    }

    /// Resolves descriptor and upgrade for one chain, descriptor first.
    ///
    /// # Errors
    ///
    /// Returns the descriptor failure, if any.
    pub async fn resolve_chain(
        &self,
        name: &str,
        force_refresh: bool,
    ) -> Result<ResolvedChain, RegistryError> {
        let upgrade = self.get_upgrade_info(name, force_refresh).await?;
        let descriptor = self.get_chain_info(name, false).await?;
        Ok(ResolvedChain { descriptor, upgrade })
    }

    /// Returns the monitored chain names in order.
    #[must_use]
    pub fn monitored_chains(&self) -> Vec<String> {
        self.store.monitored()
    }

    /// Replaces the monitored set.
    pub fn set_monitored_chains(&self, names: Vec<String>) {
        let count = self.store.set_monitored(names);
        tracing::info!(count = count, "monitored chains updated");
    }

    /// Returns `true` if an upgrade lookup for `name` is cached, including a cached
    /// "no upgrade". Never triggers resolution.
    #[must_use]
    pub fn is_upgrade_cached(&self, name: &str) -> bool {
        self.cache_key(name).is_ok_and(|key| self.store.upgrades().contains_live(&key))
    }

    /// Resolves the given chains with the background concurrency cap and no deadline.
    pub async fn refresh_chains(
        self: &Arc<Self>,
        names: Vec<String>,
        force_refresh: bool,
    ) -> FanOutSummary<ResolvedChain> {
        let engine = Arc::clone(self);
        fan_out(names, self.settings.background_concurrency, move |name| {
            let engine = Arc::clone(&engine);
            async move { engine.resolve_chain(&name, force_refresh).await }
        })
        .await
    }

    /// Force-refreshes every monitored chain.
    pub async fn refresh_all(self: &Arc<Self>) -> FanOutSummary<ResolvedChain> {
        let summary = self.refresh_chains(self.monitored_chains(), true).await;
        if summary.is_complete_success() {
            tracing::debug!(refreshed = summary.succeeded.len(), "monitored chains refreshed");
        } else {
            tracing::warn!(
                refreshed = summary.succeeded.len(),
                failed = summary.failed.len(),
                failed_chains = ?summary.failed_names(),
                "monitored chain refresh finished with failures"
            );
        }
        summary
    }

    /// Collects pending upgrades across the monitored set for interactive reads.
    ///
    /// Uses the read concurrency cap and the read deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Timeout`] if the deadline passes before every chain
    /// finishes. Individual chain failures are reported in the result instead.
    pub async fn collect_upgrades(
        self: &Arc<Self>,
        network: Option<Network>,
    ) -> Result<UpgradeReport, RegistryError> {
        let engine = Arc::clone(self);
        let summary = fan_out_with_deadline(
            self.monitored_chains(),
            self.settings.read_concurrency,
            self.settings.read_deadline,
            move |name| {
                let engine = Arc::clone(&engine);
                async move { engine.get_upgrade_info(&name, false).await }
            },
        )
        .await?;

        let mut upgrades: Vec<Arc<UpgradeRecord>> = summary
            .succeeded
            .into_iter()
            .filter_map(|(_, record)| record)
            .filter(|record| record.is_pending())
            .filter(|record| network.map_or(true, |n| record.network == n))
            .collect();
        upgrades.sort_by(|a, b| {
            a.chain_name.cmp(&b.chain_name).then_with(|| a.network.cmp(&b.network))
        });

        let failed: Vec<(String, String)> =
            summary.failed.into_iter().map(|(name, e)| (name, e.to_string())).collect();
        if !failed.is_empty() {
            tracing::warn!(failed = failed.len(), "some chains could not be read");
        }

        Ok(UpgradeReport { upgrades, failed })
    }
}
