//! In-memory caching of resolved chain state.
//!
//! # Layout
//!
//! ```text
//! ChainStore
//! ├── descriptors : TtlCache<ChainDescriptor>   ("chain_info" namespace)
//! ├── upgrades    : TtlCache<UpgradeRecord>     ("upgrade_info" namespace)
//! ├── index       : RwLock<monitored set + identity index>
//! └── locks       : one async mutex per chain and namespace
//! ```
//!
//! Both caches store negative entries with the same TTL as positive ones, so a chain
//! that keeps failing is looked up at most once per TTL window. Nothing here persists
//! across restarts.

pub mod entry;
pub mod locks;
pub mod store;
pub mod sweeper;

pub use entry::{CacheEntry, Slot, TtlCache};
pub use locks::{ResolutionGuard, ResolutionLocks};
pub use store::{ChainStore, StoreStats};
pub use sweeper::spawn_cache_sweeper;
