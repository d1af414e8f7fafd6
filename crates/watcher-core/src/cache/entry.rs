use parking_lot::RwLock;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::time::Instant;

use crate::registry::RegistryError;

/// Contents of a cache slot.
#[derive(Debug)]
pub enum Slot<T> {
    /// A resolved value.
    Present(Arc<T>),
    /// A confirmed absence. Descriptor lookups keep the error that caused it so a
    /// cached failure reports the same outcome as the live one.
    Absent(Option<RegistryError>),
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Present(value) => Self::Present(Arc::clone(value)),
            Self::Absent(reason) => Self::Absent(reason.clone()),
        }
    }
}

impl<T> Slot<T> {
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// A time-bounded slot.
#[derive(Debug)]
pub struct CacheEntry<T> {
    slot: Slot<T>,
    created_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(slot: Slot<T>, ttl: Duration) -> Self {
        Self { slot, created_at: Instant::now(), ttl }
    }

    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) >= self.ttl
    }

    #[must_use]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    #[must_use]
    pub fn slot(&self) -> &Slot<T> {
        &self.slot
    }
}

/// Key/value store whose entries expire after a fixed TTL.
///
/// Expired entries are invisible to readers immediately and physically removed by
/// [`purge_expired`](Self::purge_expired). The lock is never held across an await.
#[derive(Debug)]
pub struct TtlCache<T> {
    namespace: &'static str,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry<T>>>,
}

impl<T> TtlCache<T> {
    #[must_use]
    pub fn new(namespace: &'static str, ttl: Duration) -> Self {
        Self { namespace, ttl, entries: RwLock::new(HashMap::new()) }
    }

    #[must_use]
    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live slot for `key`, or `None` on a miss or an expired entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Slot<T>> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries.get(key).filter(|entry| !entry.is_expired(now)).map(|entry| entry.slot.clone())
    }

    /// Returns the live slot for `key` only if it was written at or after `since`.
    ///
    /// Used after waiting on a resolution lock to pick up a result another task
    /// produced while this one was queued.
    #[must_use]
    pub fn get_written_since(&self, key: &str, since: Instant) -> Option<Slot<T>> {
        let now = Instant::now();
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now) && entry.created_at >= since)
            .map(|entry| entry.slot.clone())
    }

    /// Returns `true` if `key` holds a live, present value.
    #[must_use]
    pub fn contains_present(&self, key: &str) -> bool {
        self.get(key).is_some_and(|slot| slot.is_present())
    }

    /// Returns `true` if `key` holds any live entry, including a negative one.
    #[must_use]
    pub fn contains_live(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores a value, replacing any previous entry.
    pub fn insert(&self, key: &str, value: Arc<T>) -> Arc<T> {
        self.entries
            .write()
            .insert(key.to_string(), CacheEntry::new(Slot::Present(Arc::clone(&value)), self.ttl));
        value
    }

    /// Stores a negative entry with the same TTL as positive ones.
    pub fn insert_absent(&self, key: &str, reason: Option<RegistryError>) {
        self.entries.write().insert(key.to_string(), CacheEntry::new(Slot::Absent(reason), self.ttl));
    }

    /// Removes every expired entry and returns how many were evicted.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included until the next purge.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Counts live entries as `(present, absent)`.
    #[must_use]
    pub fn live_counts(&self) -> (usize, usize) {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .fold((0, 0), |(present, absent), entry| {
                if entry.slot.is_present() {
                    (present + 1, absent)
                } else {
                    (present, absent + 1)
                }
            })
    }
}
