use std::{sync::Arc, time::Duration};
use tokio::{sync::broadcast, task::JoinHandle};

use super::upgrade_checker::{announce, NotificationLedger};
use crate::{engine::fan_out, engine::ChainEngine, notify::NotificationSink};

/// One-shot check of every monitored chain shortly after boot.
///
/// Chains whose upgrade lookup is already cached are skipped: something else resolved
/// them first.
pub struct StartupNotifier {
    engine: Arc<ChainEngine>,
    sink: Option<Arc<dyn NotificationSink>>,
    ledger: Arc<NotificationLedger>,
    delay: Duration,
}

impl StartupNotifier {
    #[must_use]
    pub fn new(
        engine: Arc<ChainEngine>,
        sink: Option<Arc<dyn NotificationSink>>,
        ledger: Arc<NotificationLedger>,
        delay: Duration,
    ) -> Self {
        Self { engine, sink, ledger, delay }
    }

    /// Runs the check once and returns how many upgrades were announced.
    pub async fn run(&self) -> usize {
        let engine = Arc::clone(&self.engine);
        let chains = engine.monitored_chains();
        let limit = engine.settings().background_concurrency;

        let summary = fan_out(chains, limit, move |name| {
            let engine = Arc::clone(&engine);
            async move {
                if engine.is_upgrade_cached(&name) {
                    tracing::debug!(chain = %name, "skipping startup check, already cached");
                    return Ok(None);
                }
                engine.get_upgrade_info(&name, false).await
            }
        })
        .await;

        for (name, error) in &summary.failed {
            tracing::warn!(chain = %name, error = %error, "startup upgrade check failed");
        }

        let mut announced = 0;
        for (_, record) in &summary.succeeded {
            let Some(record) = record.as_ref().filter(|r| r.is_pending()) else {
                continue;
            };
            if announce(&self.ledger, self.sink.as_deref(), record).await {
                announced += 1;
            }
        }

        tracing::info!(
            checked = summary.total(),
            announced = announced,
            "startup upgrade check complete"
        );
        announced
    }

    /// Waits out the startup delay, then runs once. Shutdown during the delay cancels it.
    pub fn spawn(self, mut shutdown_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    tracing::debug!("startup notifier cancelled");
                }

                () = tokio::time::sleep(self.delay) => {
                    self.run().await;
                }
            }
        })
    }
}
