//! Fan-out/fan-in over all registered jobs.
//!
//! Every job is spawned at once on tokio's blocking pool; the fan-in loop
//! stores each `(index, outcome)` in that job's slot. When the run's
//! cancellation token fires, waiting stops: unreported jobs are recorded as
//! cancelled and their tasks are detached to finish on their own.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tokio::task::JoinSet;

use crate::control::CancellationToken;
use crate::job::JobId;
use crate::registry::{JobRegistry, RegisteredJob};
use crate::resolver::Resolver;

use super::config::PipelineConfig;
use super::report::{JobError, JobFailure, JobResult, RunReport};
use super::step::{run_job, JobContext};

type Outcome = Result<JobResult, JobError>;

/// Runs a set of registered jobs concurrently and aggregates their outcomes.
pub struct Coordinator {
    config: Arc<PipelineConfig>,
    resolver: Arc<dyn Resolver>,
    jobs: Vec<RegisteredJob>,
}

impl Coordinator {
    pub fn new(
        config: Arc<PipelineConfig>,
        resolver: Arc<dyn Resolver>,
        registry: JobRegistry,
    ) -> Self {
        Self {
            config,
            resolver,
            jobs: registry.into_jobs(),
        }
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Runs all jobs to completion on a private runtime.
    ///
    /// Fails only if the runtime cannot be built, or if called from inside
    /// an async runtime (use [`Coordinator::run_all_async`] there).
    pub fn run_all(self) -> io::Result<RunReport> {
        self.run_all_cancellable(CancellationToken::new())
    }

    /// Like [`Coordinator::run_all`], but returns as soon as `cancel` fires.
    /// Jobs that already started keep running in the background until their
    /// blocking calls return.
    pub fn run_all_cancellable(self, cancel: CancellationToken) -> io::Result<RunReport> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "run_all called from inside an async runtime; use run_all_async",
            ));
        }
        let rt = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let report = rt.block_on(self.run_all_async(cancel));
        rt.shutdown_background();
        Ok(report)
    }

    /// Runs all jobs concurrently, observing `cancel` at fetch progress and
    /// while waiting for outstanding jobs.
    pub async fn run_all_async(self, cancel: CancellationToken) -> RunReport {
        let total = self.jobs.len();
        tracing::info!(jobs = total, export = %self.config.export_mode(), "starting run");

        let ids: Vec<JobId> = self.jobs.iter().map(|j| j.descriptor.id()).collect();
        let mut slots: Vec<Option<Outcome>> = (0..total).map(|_| None).collect();
        let mut join_set = JoinSet::new();

        for (index, job) in self.jobs.into_iter().enumerate() {
            let config = Arc::clone(&self.config);
            let resolver = Arc::clone(&self.resolver);
            let cancel = cancel.clone();
            join_set.spawn_blocking(move || {
                let ctx = JobContext {
                    config: &config,
                    resolver: resolver.as_ref(),
                    cancel: &cancel,
                };
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| run_job(&ctx, job)))
                    .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(&*payload))));
                (index, outcome)
            });
        }

        loop {
            let joined = tokio::select! {
                biased;
                joined = join_set.join_next() => joined,
                _ = cancel.cancelled() => {
                    tracing::info!(outstanding = join_set.len(), "run cancelled, no longer waiting");
                    join_set.detach_all();
                    break;
                }
            };
            let Some(joined) = joined else {
                break;
            };
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => tracing::warn!("job task join: {}", e),
            }
        }

        let mut report = RunReport::default();
        for (id, slot) in ids.into_iter().zip(slots) {
            match slot {
                Some(Ok(result)) => report.results.push(result),
                Some(Err(error)) => {
                    tracing::warn!(job_id = %id, "job failed: {}", error);
                    report.failures.push(JobFailure { id, error });
                }
                None => {
                    let error = if cancel.is_cancelled() {
                        JobError::Cancelled
                    } else {
                        JobError::Panicked("job task did not report an outcome".to_string())
                    };
                    report.failures.push(JobFailure { id, error });
                }
            }
        }

        tracing::info!(
            completed = report.completed().count(),
            skipped = report.skipped().count(),
            failed = report.failures.len(),
            "run finished"
        );
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
