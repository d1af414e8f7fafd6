use async_trait::async_trait;
use std::{path::PathBuf, sync::Arc};

use super::{Job, JobError, JobKind};
use crate::{config::ChainsConfig, engine::ChainEngine};

/// Reloads the monitored chain list and primes the cache with a forced refresh.
pub struct LoadChainsJob {
    engine: Arc<ChainEngine>,
    chains_file: PathBuf,
}

impl LoadChainsJob {
    #[must_use]
    pub fn new(engine: Arc<ChainEngine>, chains_file: impl Into<PathBuf>) -> Self {
        Self { engine, chains_file: chains_file.into() }
    }

    /// Reads the chain list and replaces the monitored set without fetching anything.
    ///
    /// # Errors
    ///
    /// Returns [`JobError::ChainList`] if the file is missing or malformed. The
    /// monitored set is left unchanged in that case.
    pub fn load_chain_list(&self) -> Result<usize, JobError> {
        let chains = ChainsConfig::from_file(&self.chains_file).map_err(|e| {
            JobError::ChainList(format!("{}: {e}", self.chains_file.display()))
        })?;

        let mainnet: Vec<&str> = chains.mainnet.iter().map(|c| c.name.as_str()).collect();
        let testnet: Vec<&str> = chains.testnet.iter().map(|c| c.name.as_str()).collect();
        tracing::info!(
            mainnet = ?mainnet,
            testnet = ?testnet,
            "loaded chain list"
        );

        self.engine.set_monitored_chains(chains.names());
        Ok(self.engine.monitored_chains().len())
    }
}

#[async_trait]
impl Job for LoadChainsJob {
    fn kind(&self) -> JobKind {
        JobKind::LoadChains
    }

    async fn run(&self) -> Result<(), JobError> {
        let total = self.load_chain_list()?;
        let summary = self.engine.refresh_chains(self.engine.monitored_chains(), true).await;

        for (name, error) in &summary.failed {
            tracing::warn!(chain = %name, error = %error, "failed to prime chain");
        }
        tracing::info!(
            total = total,
            primed = summary.succeeded.len(),
            failed = summary.failed.len(),
            "chain cache primed"
        );

        if summary.is_complete_success() {
            Ok(())
        } else {
            Err(JobError::PartialFailure { failed: summary.failed.len(), total })
        }
    }
}
