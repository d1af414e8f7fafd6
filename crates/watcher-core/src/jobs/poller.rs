use async_trait::async_trait;
use std::sync::Arc;

use super::{Job, JobError, JobKind};
use crate::engine::ChainEngine;

/// Keeps descriptors and upgrades fresh for every monitored chain.
///
/// Each cycle force-refreshes the whole monitored set. A cycle that finds nothing to
/// poll succeeds immediately.
pub struct RegistryPoller {
    engine: Arc<ChainEngine>,
}

impl RegistryPoller {
    #[must_use]
    pub fn new(engine: Arc<ChainEngine>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Job for RegistryPoller {
    fn kind(&self) -> JobKind {
        JobKind::RefreshRegistry
    }

    async fn run(&self) -> Result<(), JobError> {
        let total = self.engine.monitored_chains().len();
        if total == 0 {
            tracing::debug!("no monitored chains to poll");
            return Ok(());
        }

        let summary = self.engine.refresh_all().await;
        let pending = summary
            .succeeded
            .iter()
            .filter(|(_, chain)| chain.upgrade.as_ref().is_some_and(|u| u.is_pending()))
            .count();
        tracing::info!(
            polled = total,
            pending_upgrades = pending,
            failed = summary.failed.len(),
            "registry poll complete"
        );

        if summary.is_complete_success() {
            Ok(())
        } else {
            Err(JobError::PartialFailure { failed: summary.failed.len(), total })
        }
    }
}
