//! Cancellation for pipeline runs.
//!
//! A run carries one [`CancellationToken`]. Each job polls it at every
//! fetch-progress notification and transport tick through its
//! [`JobObserver`]; once the token
//! fires, the observer asks the fetcher to stop and the job fails with
//! `Cancelled`. Jobs already past their last progress notification run to
//! completion.

pub use tokio_util::sync::CancellationToken;

use crate::fetcher::FetchObserver;
use crate::job::JobId;
use crate::registry::{FetchListener, ProgressListener};
use crate::transcoder::{ConvertObserver, ConvertProgress};
use std::ops::ControlFlow;

/// Forwards one job's fetch notifications to its registered listeners and
/// polls the run's cancellation token.
pub(crate) struct JobObserver<'a> {
    id: JobId,
    cancel: &'a CancellationToken,
    on_progress: &'a mut [ProgressListener],
    on_started: &'a mut [FetchListener],
    on_finished: &'a mut [FetchListener],
    cancelled: bool,
}

impl<'a> JobObserver<'a> {
    pub(crate) fn new(
        id: JobId,
        cancel: &'a CancellationToken,
        on_progress: &'a mut [ProgressListener],
        on_started: &'a mut [FetchListener],
        on_finished: &'a mut [FetchListener],
    ) -> Self {
        Self {
            id,
            cancel,
            on_progress,
            on_started,
            on_finished,
            cancelled: false,
        }
    }

    /// True once a progress poll observed the cancelled token.
    pub(crate) fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl FetchObserver for JobObserver<'_> {
    fn on_started(&mut self) {
        tracing::debug!(job_id = %self.id, "fetch started");
        for listener in self.on_started.iter_mut() {
            listener(self.id);
        }
    }

    fn on_progress(&mut self, percent: f64) -> ControlFlow<()> {
        if self.cancel.is_cancelled() {
            self.cancelled = true;
            return ControlFlow::Break(());
        }
        for listener in self.on_progress.iter_mut() {
            listener(self.id, percent);
        }
        ControlFlow::Continue(())
    }

    fn on_finished(&mut self) {
        tracing::debug!(job_id = %self.id, "fetch finished");
        for listener in self.on_finished.iter_mut() {
            listener(self.id);
        }
    }

    fn stop_requested(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.cancelled = true;
        }
        self.cancelled
    }
}

/// Logs conversion progress for one job.
pub(crate) struct ConvertLog {
    pub(crate) id: JobId,
}

impl ConvertObserver for ConvertLog {
    fn on_progress(&mut self, progress: &ConvertProgress) {
        tracing::trace!(
            job_id = %self.id,
            processed_ms = progress.processed.as_millis() as u64,
            speed = ?progress.speed,
            "converting"
        );
    }

    fn on_complete(&mut self, progress: &ConvertProgress) {
        tracing::debug!(
            job_id = %self.id,
            processed_ms = progress.processed.as_millis() as u64,
            "conversion complete"
        );
    }
}
