use parking_lot::RwLock;
use serde::Serialize;
use std::{collections::HashMap, time::Duration};

use crate::{
    cache::{ResolutionLocks, TtlCache},
    registry::ResolvedIdentity,
    types::{ChainDescriptor, UpgradeRecord},
};

/// Monitored chains plus the identity index, kept under one lock.
#[derive(Debug, Default)]
struct ChainIndex {
    monitored: Vec<String>,
    identities: HashMap<String, ResolvedIdentity>,
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StoreStats {
    pub descriptors_present: usize,
    pub descriptors_absent: usize,
    pub upgrades_present: usize,
    pub upgrades_absent: usize,
    pub identities: usize,
    pub monitored: usize,
}

/// All volatile engine state: both caches, the identity index, the monitored set and
/// the resolution locks.
///
/// Created once per process and shared via `Arc`. Descriptor and upgrade entries live
/// in separate namespaces so a present descriptor can coexist with an absent upgrade.
#[derive(Debug)]
pub struct ChainStore {
    descriptors: TtlCache<ChainDescriptor>,
    upgrades: TtlCache<UpgradeRecord>,
    index: RwLock<ChainIndex>,
    descriptor_locks: ResolutionLocks,
    upgrade_locks: ResolutionLocks,
}

impl ChainStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            descriptors: TtlCache::new("chain_info", ttl),
            upgrades: TtlCache::new("upgrade_info", ttl),
            index: RwLock::new(ChainIndex::default()),
            descriptor_locks: ResolutionLocks::new(),
            upgrade_locks: ResolutionLocks::new(),
        }
    }

    #[must_use]
    pub fn descriptors(&self) -> &TtlCache<ChainDescriptor> {
        &self.descriptors
    }

    #[must_use]
    pub fn upgrades(&self) -> &TtlCache<UpgradeRecord> {
        &self.upgrades
    }

    #[must_use]
    pub fn descriptor_locks(&self) -> &ResolutionLocks {
        &self.descriptor_locks
    }

    #[must_use]
    pub fn upgrade_locks(&self) -> &ResolutionLocks {
        &self.upgrade_locks
    }

    /// Returns the monitored chain names in their configured order.
    #[must_use]
    pub fn monitored(&self) -> Vec<String> {
        self.index.read().monitored.clone()
    }

    /// Replaces the monitored set, dropping blanks and duplicates while keeping order.
    pub fn set_monitored(&self, names: Vec<String>) -> usize {
        let mut seen = std::collections::HashSet::with_capacity(names.len());
        let cleaned: Vec<String> = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty() && seen.insert(n.clone()))
            .collect();
        let count = cleaned.len();
        self.index.write().monitored = cleaned;
        count
    }

    /// Returns the identity recorded for a normalized name, if it ever resolved.
    #[must_use]
    pub fn identity(&self, key: &str) -> Option<ResolvedIdentity> {
        self.index.read().identities.get(key).cloned()
    }

    /// Records the identity for a normalized name and returns the previous one.
    pub fn record_identity(&self, key: &str, identity: ResolvedIdentity) -> Option<ResolvedIdentity> {
        self.index.write().identities.insert(key.to_string(), identity)
    }

    /// Evicts expired cache entries and idle locks. Returns the number of evicted entries.
    pub fn sweep(&self) -> usize {
        let evicted = self.descriptors.purge_expired() + self.upgrades.purge_expired();
        self.descriptor_locks.prune_idle();
        self.upgrade_locks.prune_idle();
        evicted
    }

    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let (descriptors_present, descriptors_absent) = self.descriptors.live_counts();
        let (upgrades_present, upgrades_absent) = self.upgrades.live_counts();
        let index = self.index.read();
        StoreStats {
            descriptors_present,
            descriptors_absent,
            upgrades_present,
            upgrades_absent,
            identities: index.identities.len(),
            monitored: index.monitored.len(),
        }
    }
}
