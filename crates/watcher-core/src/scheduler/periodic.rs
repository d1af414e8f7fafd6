//! The per-job periodic loop.
//!
//! Each enabled job gets one task that ticks on its interval and runs the job inline,
//! so a job never overlaps itself. Shutdown is only observed between runs, which lets
//! an in-flight run finish before the task exits.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{sync::broadcast, task::JoinHandle, time::MissedTickBehavior};

use crate::{config::JobDefinition, jobs::Job};

/// Point-in-time view of one job.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JobStatus {
    pub name: String,
    pub task: String,
    pub interval_seconds: u64,
    pub enabled: bool,
    pub description: String,
    pub running: bool,
    pub run_count: u64,
    pub failure_count: u64,
    pub skipped_count: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_duration_ms: Option<u64>,
    pub last_error: Option<String>,
}

impl JobStatus {
    pub(crate) fn from_definition(definition: &JobDefinition) -> Self {
        Self {
            name: definition.name.clone(),
            task: definition.task.to_string(),
            interval_seconds: definition.interval_seconds,
            enabled: definition.enabled,
            description: definition.description.clone(),
            running: false,
            run_count: 0,
            failure_count: 0,
            skipped_count: 0,
            last_run: None,
            last_duration_ms: None,
            last_error: None,
        }
    }
}

/// Counts running jobs across the scheduler and refuses entry past the cap.
#[derive(Debug)]
pub(crate) struct ConcurrencyGate {
    active: AtomicUsize,
    max: usize,
}

impl ConcurrencyGate {
    pub(crate) fn new(max: usize) -> Self {
        Self { active: AtomicUsize::new(0), max: max.max(1) }
    }

    pub(crate) fn try_enter(self: &Arc<Self>) -> Option<GatePass> {
        self.active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < self.max).then_some(n + 1))
            .ok()
            .map(|_| GatePass { gate: Arc::clone(self) })
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }
}

pub(crate) struct GatePass {
    gate: Arc<ConcurrencyGate>,
}

impl Drop for GatePass {
    fn drop(&mut self) {
        self.gate.active.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Holds a job's `running` flag up until dropped, so a panicking or cancelled run
/// still clears it.
struct RunningFlag<'a>(&'a Mutex<JobStatus>);

impl<'a> RunningFlag<'a> {
    fn raise(status: &'a Mutex<JobStatus>) -> Self {
        status.lock().running = true;
        Self(status)
    }
}

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.lock().running = false;
    }
}

/// Everything one job loop needs.
pub(crate) struct JobSlot {
    pub(crate) name: String,
    pub(crate) interval: Duration,
    pub(crate) job: Arc<dyn Job>,
    pub(crate) status: Arc<Mutex<JobStatus>>,
    pub(crate) gate: Arc<ConcurrencyGate>,
}

impl JobSlot {
    /// Runs the job once, honoring the concurrency cap, and records the outcome.
    pub(crate) async fn run_once(&self) {
        let Some(_pass) = self.gate.try_enter() else {
            self.status.lock().skipped_count += 1;
            tracing::warn!(
                job = %self.name,
                active = self.gate.active(),
                "max concurrent jobs reached, skipping run"
            );
            return;
        };

        let running = RunningFlag::raise(&self.status);
        tracing::info!(job = %self.name, task = %self.job.kind(), "job started");
        let started = tokio::time::Instant::now();
        let result = self.job.run().await;
        let elapsed = started.elapsed();
        drop(running);

        let mut status = self.status.lock();
        status.run_count += 1;
        status.last_run = Some(Utc::now());
        status.last_duration_ms = Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
        match result {
            Ok(()) => {
                status.last_error = None;
                tracing::info!(job = %self.name, duration_ms = elapsed.as_millis() as u64, "job completed");
            }
            Err(e) => {
                status.failure_count += 1;
                status.last_error = Some(e.to_string());
                if e.is_partial() {
                    tracing::warn!(job = %self.name, error = %e, "job completed with failures");
                } else {
                    tracing::error!(job = %self.name, error = %e, "job failed");
                }
            }
        }
    }
}

/// Spawns the loop for one job. The first run happens on the first tick.
pub(crate) fn spawn_job_loop(
    slot: JobSlot,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(slot.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.recv() => {
                    tracing::debug!(job = %slot.name, "job loop received shutdown signal");
                    break;
                }

                _ = interval.tick() => {
                    slot.run_once().await;
                }
            }
        }
    })
}
