//! Bounded fan-out over a list of chains.
//!
//! One task is spawned per chain, but a counting semaphore admits at most `limit` of
//! them into their network phase at once. Failures are recorded per chain and never
//! cancel siblings.
//!
//! ```text
//! Idle ─► FanningOut ─► (per chain: Pending ─► Running ─► Succeeded | Failed)
//!                   └─► Draining ─► Completed
//! ```
//!
//! The deadline variant stops waiting when the deadline fires and reports
//! [`RegistryError::Timeout`]. Tasks still in flight are detached, not aborted; their
//! results are discarded, though any cache writes they make still land.

use futures::future::join_all;
use parking_lot::Mutex;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{sync::Semaphore, task::JoinHandle};

use crate::registry::RegistryError;

/// Outcome of a fan-out: per-chain successes and failures.
#[derive(Debug)]
pub struct FanOutSummary<T> {
    pub succeeded: Vec<(String, T)>,
    pub failed: Vec<(String, RegistryError)>,
}

impl<T> Default for FanOutSummary<T> {
    fn default() -> Self {
        Self { succeeded: Vec::new(), failed: Vec::new() }
    }
}

impl<T> FanOutSummary<T> {
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    #[must_use]
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(name, _)| name.as_str()).collect()
    }
}

type Accumulator<T> = Arc<Mutex<FanOutSummary<T>>>;

fn launch<T, F, Fut>(
    items: Vec<String>,
    limit: usize,
    unit: F,
) -> (Accumulator<T>, Vec<(String, JoinHandle<()>)>)
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RegistryError>> + Send + 'static,
{
    let gate = Arc::new(Semaphore::new(limit.max(1)));
    let accumulator: Accumulator<T> = Arc::new(Mutex::new(FanOutSummary::default()));
    let unit = Arc::new(unit);

    let handles = items
        .into_iter()
        .map(|item| {
            let gate = Arc::clone(&gate);
            let accumulator = Arc::clone(&accumulator);
            let unit = Arc::clone(&unit);
            let name = item.clone();

            let handle = tokio::spawn(async move {
                // The gate is owned by this fan-out and never closed.
                let Ok(_permit) = gate.acquire_owned().await else {
                    return;
                };
                let outcome = unit(item.clone()).await;
                let mut summary = accumulator.lock();
                match outcome {
                    Ok(value) => summary.succeeded.push((item, value)),
                    Err(e) => summary.failed.push((item, e)),
                }
            });
            (name, handle)
        })
        .collect();

    (accumulator, handles)
}

async fn drain(handles: Vec<(String, JoinHandle<()>)>) {
    let (names, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    for (name, result) in names.iter().zip(join_all(handles).await) {
        if let Err(e) = result {
            tracing::error!(chain = %name, error = %e, "fan-out unit terminated abnormally");
        }
    }
}

fn take_summary<T>(accumulator: &Accumulator<T>) -> FanOutSummary<T> {
    std::mem::take(&mut *accumulator.lock())
}

/// Runs `unit` once per item with at most `limit` units in flight and waits for all
/// of them.
pub async fn fan_out<T, F, Fut>(items: Vec<String>, limit: usize, unit: F) -> FanOutSummary<T>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RegistryError>> + Send + 'static,
{
    let total = items.len();
    tracing::debug!(total = total, limit = limit, "fan-out started");

    let (accumulator, handles) = launch(items, limit, unit);
    drain(handles).await;
    let summary = take_summary(&accumulator);

    tracing::debug!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "fan-out completed"
    );
    summary
}

/// Like [`fan_out`], but gives up on the whole operation after `deadline`.
///
/// # Errors
///
/// Returns [`RegistryError::Timeout`] if not every unit finished in time. No partial
/// result is returned.
pub async fn fan_out_with_deadline<T, F, Fut>(
    items: Vec<String>,
    limit: usize,
    deadline: Duration,
    unit: F,
) -> Result<FanOutSummary<T>, RegistryError>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, RegistryError>> + Send + 'static,
{
    let total = items.len();
    let (accumulator, handles) = launch(items, limit, unit);

    if tokio::time::timeout(deadline, drain(handles)).await.is_err() {
        let finished = accumulator.lock().total();
        tracing::warn!(
            total = total,
            finished = finished,
            deadline_ms = deadline.as_millis() as u64,
            "fan-out deadline exceeded, discarding results"
        );
        return Err(RegistryError::Timeout);
    }

    Ok(take_summary(&accumulator))
}
