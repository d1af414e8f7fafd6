//! Background eviction of expired cache entries.
//!
//! Readers already treat expired entries as misses, so the sweeper only bounds memory:
//! it removes dead entries and idle per-chain locks on a fixed interval until the
//! shutdown signal arrives.

use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, trace};

use crate::cache::ChainStore;

/// Spawns the sweeper task.
pub fn spawn_cache_sweeper(
    store: Arc<ChainStore>,
    sweep_interval: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    debug!("cache sweeper received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    let evicted = store.sweep();
                    if evicted > 0 {
                        debug!(evicted = evicted, "expired cache entries evicted");
                    } else {
                        trace!("cache sweep found nothing to evict");
                    }
                }
            }
        }
    })
}
