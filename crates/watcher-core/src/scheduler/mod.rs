//! Interval scheduler for the configured jobs.
//!
//! # Lifecycle
//!
//! ```text
//! Scheduler::new(jobs config)
//!     └─ register(job) for each task kind
//!
//! start() ──► one periodic task per enabled job ──► stop() signals and drains them
//!    ▲                                                 │
//!    └──────────────── may be started again ◄──────────┘
//! ```
//!
//! `start()` and `stop()` are idempotent. Disabled jobs are listed but never run.

pub mod periodic;

use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    config::{JobDefinition, JobsConfig},
    jobs::{Job, JobKind},
};
use periodic::{spawn_job_loop, ConcurrencyGate, JobSlot};

pub use periodic::JobStatus;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchedulerError {
    #[error("Job {job} uses task {task}, which is not registered")]
    TaskNotRegistered { job: String, task: JobKind },

    #[error("Unknown job: {0}")]
    UnknownJob(String),
}

struct RunningJobs {
    shutdown_tx: broadcast::Sender<()>,
    handles: Vec<(String, JoinHandle<()>)>,
}

pub struct Scheduler {
    definitions: Vec<JobDefinition>,
    tasks: HashMap<JobKind, Arc<dyn Job>>,
    statuses: HashMap<String, Arc<Mutex<JobStatus>>>,
    gate: Arc<ConcurrencyGate>,
    running: tokio::sync::Mutex<Option<RunningJobs>>,
    started: AtomicBool,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &JobsConfig) -> Self {
        let statuses = config
            .predefined
            .iter()
            .map(|d| (d.name.clone(), Arc::new(Mutex::new(JobStatus::from_definition(d)))))
            .collect();
        Self {
            definitions: config.predefined.clone(),
            tasks: HashMap::new(),
            statuses,
            gate: Arc::new(ConcurrencyGate::new(config.max_concurrent)),
            running: tokio::sync::Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Registers the implementation for a task kind, replacing any earlier one.
    pub fn register(&mut self, job: Arc<dyn Job>) {
        self.tasks.insert(job.kind(), job);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Statuses of every configured job, in configuration order.
    #[must_use]
    pub fn list_jobs(&self) -> Vec<JobStatus> {
        self.definitions
            .iter()
            .filter_map(|d| self.statuses.get(&d.name))
            .map(|status| status.lock().clone())
            .collect()
    }

    #[must_use]
    pub fn job_status(&self, name: &str) -> Option<JobStatus> {
        self.statuses.get(name).map(|status| status.lock().clone())
    }

    fn slot_for(&self, definition: &JobDefinition) -> Result<JobSlot, SchedulerError> {
        let job = self.tasks.get(&definition.task).cloned().ok_or_else(|| {
            SchedulerError::TaskNotRegistered { job: definition.name.clone(), task: definition.task }
        })?;
        let status = self
            .statuses
            .get(&definition.name)
            .cloned()
            .ok_or_else(|| SchedulerError::UnknownJob(definition.name.clone()))?;
        Ok(JobSlot {
            name: definition.name.clone(),
            interval: definition.interval(),
            job,
            status,
            gate: Arc::clone(&self.gate),
        })
    }

    /// Starts one periodic task per enabled job. Does nothing if already running.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::TaskNotRegistered`] if an enabled job names a task
    /// kind with no registered implementation. Nothing is started in that case.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            tracing::debug!("scheduler already running");
            return Ok(());
        }

        let mut slots = Vec::new();
        for definition in &self.definitions {
            if !definition.enabled {
                tracing::info!(job = %definition.name, "skipping disabled job");
                continue;
            }
            slots.push(self.slot_for(definition)?);
        }

        let (shutdown_tx, _) = broadcast::channel(1);
        let handles = slots
            .into_iter()
            .map(|slot| {
                tracing::info!(
                    job = %slot.name,
                    task = %slot.job.kind(),
                    interval_seconds = slot.interval.as_secs(),
                    "job scheduled"
                );
                let name = slot.name.clone();
                (name, spawn_job_loop(slot, shutdown_tx.subscribe()))
            })
            .collect::<Vec<_>>();

        tracing::info!(jobs = handles.len(), "scheduler started");
        *running = Some(RunningJobs { shutdown_tx, handles });
        self.started.store(true, Ordering::Release);
        Ok(())
    }

    /// Stops every job task and waits for in-flight runs to finish. Does nothing if
    /// not running.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;
        let Some(jobs) = running.take() else {
            tracing::debug!("scheduler not running");
            return;
        };
        self.started.store(false, Ordering::Release);

        if jobs.shutdown_tx.send(()).is_err() {
            tracing::debug!("all job loops already exited");
        }
        for (name, handle) in jobs.handles {
            if let Err(e) = handle.await {
                tracing::error!(job = %name, error = %e, "job loop terminated abnormally");
            }
        }
        tracing::info!("scheduler stopped");
    }

    /// Runs a job immediately, outside its schedule, and returns its updated status.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::UnknownJob`] for an unconfigured name and
    /// [`SchedulerError::TaskNotRegistered`] if its task has no implementation.
    pub async fn run_now(&self, name: &str) -> Result<JobStatus, SchedulerError> {
        let definition = self
            .definitions
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| SchedulerError::UnknownJob(name.to_string()))?;
        let slot = self.slot_for(definition)?;
        slot.run_once().await;
        let status = slot.status.lock().clone();
        Ok(status)
    }
}
