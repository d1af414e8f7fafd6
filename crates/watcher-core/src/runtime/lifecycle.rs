//! Runtime lifecycle: startup sequencing and graceful shutdown.

use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};

use super::builder::{RuntimeError, WatcherRuntimeBuilder};
use crate::{
    config::AppConfig,
    engine::ChainEngine,
    jobs::{LoadChainsJob, NotificationLedger, StartupNotifier},
    notify::NotificationSink,
    scheduler::Scheduler,
};

pub(super) struct RuntimeParts {
    pub(super) config: AppConfig,
    pub(super) engine: Arc<ChainEngine>,
    pub(super) scheduler: Arc<Scheduler>,
    pub(super) loader: Arc<LoadChainsJob>,
    pub(super) notifier: Option<Arc<dyn NotificationSink>>,
    pub(super) ledger: Arc<NotificationLedger>,
    pub(super) shutdown_tx: broadcast::Sender<()>,
    pub(super) sweeper_task: Option<JoinHandle<()>>,
    pub(super) startup_enabled: bool,
}

/// Owns the engine, the scheduler and every background task.
///
/// `shutdown()` broadcasts to the background tasks, stops the scheduler (draining
/// in-flight job runs) and waits for the sweeper. It is safe to call more than once.
pub struct WatcherRuntime {
    config: AppConfig,
    engine: Arc<ChainEngine>,
    scheduler: Arc<Scheduler>,
    loader: Arc<LoadChainsJob>,
    notifier: Option<Arc<dyn NotificationSink>>,
    ledger: Arc<NotificationLedger>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Mutex<Vec<(&'static str, JoinHandle<()>)>>,
    startup_enabled: bool,
    shutdown_initiated: AtomicBool,
}

impl WatcherRuntime {
    #[must_use]
    pub fn builder() -> WatcherRuntimeBuilder {
        WatcherRuntimeBuilder::new()
    }

    pub(super) fn new(parts: RuntimeParts) -> Self {
        let mut tasks = Vec::new();
        if let Some(sweeper) = parts.sweeper_task {
            debug!("cache sweeper task started");
            tasks.push(("cache sweeper", sweeper));
        }
        Self {
            config: parts.config,
            engine: parts.engine,
            scheduler: parts.scheduler,
            loader: parts.loader,
            notifier: parts.notifier,
            ledger: parts.ledger,
            shutdown_tx: parts.shutdown_tx,
            tasks: Mutex::new(tasks),
            startup_enabled: parts.startup_enabled,
            shutdown_initiated: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub fn engine(&self) -> &Arc<ChainEngine> {
        &self.engine
    }

    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    #[must_use]
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Loads the chain list, starts the scheduler and arms the startup notifier.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Initialization`] if the chain list cannot be read or
    /// the scheduler cannot start.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let monitored = self
            .loader
            .load_chain_list()
            .map_err(|e| RuntimeError::Initialization(e.to_string()))?;
        info!(monitored = monitored, "monitored chains loaded");

        self.scheduler
            .start()
            .await
            .map_err(|e| RuntimeError::Initialization(format!("Scheduler: {e}")))?;

        if self.startup_enabled {
            let notifier = StartupNotifier::new(
                self.engine.clone(),
                self.notifier.clone(),
                self.ledger.clone(),
                self.config.notifications.startup_delay(),
            );
            let handle = notifier.spawn(self.shutdown_tx.subscribe());
            self.tasks.lock().push(("startup notifier", handle));
            debug!(
                delay_seconds = self.config.notifications.startup_delay_seconds,
                "startup notifier armed"
            );
        }
        Ok(())
    }

    /// Stops the scheduler and all background tasks. Idempotent.
    pub async fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("shutdown already initiated, ignoring duplicate call");
            return;
        }

        info!("initiating watcher runtime shutdown");
        if self.shutdown_tx.send(()).is_err() {
            debug!("no background tasks listening for shutdown");
        }

        self.scheduler.stop().await;

        let tasks = std::mem::take(&mut *self.tasks.lock());
        for (name, handle) in tasks {
            match handle.await {
                Ok(()) => debug!(task = name, "background task completed"),
                Err(e) if e.is_cancelled() => debug!(task = name, "background task cancelled"),
                Err(e) => error!(task = name, error = %e, "background task failed"),
            }
        }

        info!("watcher runtime shutdown complete");
    }
}
