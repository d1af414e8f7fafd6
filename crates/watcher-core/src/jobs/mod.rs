//! Periodic jobs run by the [`Scheduler`](crate::scheduler::Scheduler).
//!
//! | Kind               | Job                 | What it does                                        |
//! |--------------------|---------------------|-----------------------------------------------------|
//! | `load-chains`      | [`LoadChainsJob`]   | reload the chain list, force-refresh every chain    |
//! | `refresh-registry` | [`RegistryPoller`]  | force-refresh descriptor and upgrade per chain      |
//! | `check-upgrades`   | [`UpgradeChecker`]  | notify once per chain and target time               |
//!
//! [`StartupNotifier`] is not scheduled; the runtime spawns it once after boot.

pub mod load_chains;
pub mod poller;
pub mod startup;
pub mod upgrade_checker;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use load_chains::LoadChainsJob;
pub use poller::RegistryPoller;
pub use startup::StartupNotifier;
pub use upgrade_checker::{NotificationLedger, UpgradeChecker};

/// Task kinds a job definition can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    LoadChains,
    RefreshRegistry,
    CheckUpgrades,
}

impl JobKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LoadChains => "load-chains",
            Self::RefreshRegistry => "refresh-registry",
            Self::CheckUpgrades => "check-upgrades",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum JobError {
    #[error("Failed to load chain list: {0}")]
    ChainList(String),

    #[error("{failed} of {total} chains failed")]
    PartialFailure { failed: usize, total: usize },
}

impl JobError {
    /// Partial failures are expected while some chains are unreachable.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::PartialFailure { .. })
    }
}

/// A unit of periodic work.
#[async_trait]
pub trait Job: Send + Sync {
    fn kind(&self) -> JobKind;

    async fn run(&self) -> Result<(), JobError>;
}
