use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::{collections::HashMap, sync::Arc};

use super::{Job, JobError, JobKind};
use crate::{engine::ChainEngine, notify::NotificationSink, types::UpgradeRecord};

/// Last notified target time per chain.
///
/// Shared between the scheduled checker and the startup notifier so one upgrade is
/// announced once, whichever finds it first.
#[derive(Debug, Default)]
pub struct NotificationLedger {
    notified: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl NotificationLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `record` as announced. Returns `false` if this chain and target time were
    /// already recorded.
    pub fn claim(&self, record: &UpgradeRecord) -> bool {
        let mut notified = self.notified.lock();
        if notified.get(&record.chain_name) == Some(&record.target_time) {
            return false;
        }
        notified.insert(record.chain_name.clone(), record.target_time);
        true
    }

    #[must_use]
    pub fn last_notified(&self, chain: &str) -> Option<DateTime<Utc>> {
        self.notified.lock().get(chain).copied()
    }
}

/// Sends `record` through `sink` if the ledger has not seen it yet.
///
/// The ledger entry is written before delivery, so a failed delivery is not retried.
pub(crate) async fn announce(
    ledger: &NotificationLedger,
    sink: Option<&dyn NotificationSink>,
    record: &UpgradeRecord,
) -> bool {
    if !ledger.claim(record) {
        tracing::debug!(chain = %record.chain_name, "upgrade already announced");
        return false;
    }

    tracing::info!(
        chain = %record.chain_name,
        upgrade = %record.upgrade_name,
        height = record.target_height,
        network = %record.network,
        time = %record.target_time.to_rfc3339(),
        "new upgrade found"
    );

    match sink {
        Some(sink) => {
            if let Err(e) = sink.notify_upgrade(record).await {
                tracing::error!(
                    chain = %record.chain_name,
                    sink = sink.name(),
                    error = %e,
                    "failed to deliver upgrade notification"
                );
            }
        }
        None => tracing::debug!(chain = %record.chain_name, "no notification sink configured"),
    }
    true
}

/// Announces each pending upgrade once per distinct target time.
pub struct UpgradeChecker {
    engine: Arc<ChainEngine>,
    sink: Option<Arc<dyn NotificationSink>>,
    ledger: Arc<NotificationLedger>,
}

impl UpgradeChecker {
    #[must_use]
    pub fn new(
        engine: Arc<ChainEngine>,
        sink: Option<Arc<dyn NotificationSink>>,
        ledger: Arc<NotificationLedger>,
    ) -> Self {
        Self { engine, sink, ledger }
    }
}

#[async_trait]
impl Job for UpgradeChecker {
    fn kind(&self) -> JobKind {
        JobKind::CheckUpgrades
    }

    async fn run(&self) -> Result<(), JobError> {
        let chains = self.engine.monitored_chains();
        let total = chains.len();
        let summary = self.engine.refresh_chains(chains, false).await;

        let mut announced = 0usize;
        for (_, resolved) in &summary.succeeded {
            let Some(record) = resolved.upgrade.as_ref().filter(|u| u.is_pending()) else {
                continue;
            };
            if announce(&self.ledger, self.sink.as_deref(), record).await {
                announced += 1;
            }
        }
        for (name, error) in &summary.failed {
            tracing::warn!(chain = %name, error = %error, "failed to check chain for upgrades");
        }

        tracing::info!(checked = total, announced = announced, "upgrade check complete");
        if summary.is_complete_success() {
            Ok(())
        } else {
            Err(JobError::PartialFailure { failed: summary.failed.len(), total })
        }
    }
}
