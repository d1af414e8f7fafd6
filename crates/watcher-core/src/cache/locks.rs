use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-key async locks that serialize resolutions of the same chain.
///
/// Holding the guard across network I/O is the point: a second caller for the same
/// key waits here instead of issuing duplicate upstream requests, while callers for
/// other keys proceed in parallel.
#[derive(Debug, Default)]
pub struct ResolutionLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive right to resolve one key. Released on drop.
#[derive(Debug)]
pub struct ResolutionGuard {
    _guard: OwnedMutexGuard<()>,
}

impl ResolutionLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn acquire(&self, key: &str) -> ResolutionGuard {
        // Clone the Arc out of the map so no shard lock is held while waiting.
        let lock = self.locks.entry(key.to_string()).or_default().clone();
        ResolutionGuard { _guard: lock.lock_owned().await }
    }

    /// Returns `true` if some task currently holds the lock for `key`.
    #[must_use]
    pub fn is_locked(&self, key: &str) -> bool {
        self.locks.get(key).is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Drops lock entries nobody holds or waits on.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        before - self.locks.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
