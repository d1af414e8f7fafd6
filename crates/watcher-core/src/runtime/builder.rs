//! Builder for assembling the watcher runtime from configuration.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::lifecycle::{RuntimeParts, WatcherRuntime};
use crate::{
    cache::spawn_cache_sweeper,
    config::AppConfig,
    engine::ChainEngine,
    jobs::{LoadChainsJob, NotificationLedger, RegistryPoller, UpgradeChecker},
    notify::{NotificationSink, SlackNotifier},
    scheduler::Scheduler,
};

/// Errors that can occur during runtime initialization.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    #[error("Runtime initialization failed: {0}")]
    Initialization(String),
}

#[derive(Clone)]
struct RuntimeOptions {
    enable_cache_sweeper: bool,
    enable_startup_notifier: bool,
    shutdown_channel_capacity: usize,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self { enable_cache_sweeper: true, enable_startup_notifier: true, shutdown_channel_capacity: 16 }
    }
}

/// Builder for [`WatcherRuntime`].
///
/// ```no_run
/// # use watcher_core::{config::AppConfig, runtime::WatcherRuntime};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = WatcherRuntime::builder().with_config(AppConfig::load()?).build()?;
/// runtime.start().await?;
/// // ... serve ...
/// runtime.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct WatcherRuntimeBuilder {
    config: Option<AppConfig>,
    engine: Option<Arc<ChainEngine>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    options: RuntimeOptions,
}

impl WatcherRuntimeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { config: None, engine: None, notifier: None, options: RuntimeOptions::default() }
    }

    #[must_use]
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Uses a pre-built engine instead of building one from the registry config.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<ChainEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Overrides the notification sink. Without one, a Slack notifier is built when a
    /// webhook is configured.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn disable_cache_sweeper(mut self) -> Self {
        self.options.enable_cache_sweeper = false;
        self
    }

    #[must_use]
    pub fn disable_startup_notifier(mut self) -> Self {
        self.options.enable_startup_notifier = false;
        self
    }

    fn resolve_notifier(
        notifier: Option<Arc<dyn NotificationSink>>,
        config: &AppConfig,
    ) -> Result<Option<Arc<dyn NotificationSink>>, RuntimeError> {
        if notifier.is_some() {
            return Ok(notifier);
        }
        match config.notifications.slack_webhook() {
            Some(webhook) => {
                let slack = SlackNotifier::new(webhook)
                    .map_err(|e| RuntimeError::Initialization(format!("Slack notifier: {e}")))?;
                debug!("slack notifier initialized");
                Ok(Some(Arc::new(slack)))
            }
            None => {
                warn!("no slack webhook configured, upgrade notifications will only be logged");
                Ok(None)
            }
        }
    }

    /// Builds the runtime. Must be called from within a tokio runtime when the cache
    /// sweeper is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError`] if configuration is missing or invalid, or a component
    /// fails to initialize.
    pub fn build(self) -> Result<WatcherRuntime, RuntimeError> {
        let config = self.config.ok_or_else(|| {
            RuntimeError::ConfigValidation("No configuration provided".to_string())
        })?;
        config.validate().map_err(RuntimeError::ConfigValidation)?;

        info!(
            jobs = config.jobs.predefined.len(),
            cache_ttl_seconds = config.cache.ttl_seconds,
            sweeper_enabled = self.options.enable_cache_sweeper,
            startup_notifier_enabled = self.options.enable_startup_notifier,
            "initializing watcher runtime"
        );

        let (shutdown_tx, _) = broadcast::channel::<()>(self.options.shutdown_channel_capacity);

        let engine = match self.engine {
            Some(engine) => engine,
            None => Arc::new(
                ChainEngine::from_config(&config)
                    .map_err(|e| RuntimeError::Initialization(format!("Chain engine: {e}")))?,
            ),
        };
        debug!("chain engine initialized");

        let notifier = Self::resolve_notifier(self.notifier, &config)?;
        let ledger = Arc::new(NotificationLedger::new());
        let loader = Arc::new(LoadChainsJob::new(engine.clone(), &config.chains_file));

        let mut scheduler = Scheduler::new(&config.jobs);
        scheduler.register(loader.clone());
        scheduler.register(Arc::new(RegistryPoller::new(engine.clone())));
        scheduler.register(Arc::new(UpgradeChecker::new(
            engine.clone(),
            notifier.clone(),
            ledger.clone(),
        )));
        debug!("scheduler initialized");

        let sweeper_task = self.options.enable_cache_sweeper.then(|| {
            spawn_cache_sweeper(
                engine.store().clone(),
                config.cache.sweep_interval(),
                shutdown_tx.subscribe(),
            )
        });

        let startup_enabled =
            self.options.enable_startup_notifier && config.notifications.notify_on_startup;

        info!("watcher runtime initialization complete");
        Ok(WatcherRuntime::new(RuntimeParts {
            config,
            engine,
            scheduler: Arc::new(scheduler),
            loader,
            notifier,
            ledger,
            shutdown_tx,
            sweeper_task,
            startup_enabled,
        }))
    }
}

impl Default for WatcherRuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
