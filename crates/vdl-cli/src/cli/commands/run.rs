//! Shared runner for `get` and `batch`: build the downloader, print progress,
//! cancel on Ctrl-C, print the summary.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vdl_core::config::VdlConfig;
use vdl_core::{Downloader, JobDescriptor, JobId, RunReport};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Progress {
    Started(JobId),
    Percent(JobId, f64),
    Finished(JobId),
}

/// Sending side of the printer channel, used from the job worker threads.
#[derive(Clone)]
struct ProgressSender(mpsc::Sender<Progress>);

impl ProgressSender {
    /// Percent updates are dropped while the printer lags behind.
    fn percent(&self, id: JobId, percent: f64) {
        let _ = self.0.try_send(Progress::Percent(id, percent));
    }

    /// Started/finished wait for room. Listeners run on blocking worker
    /// threads, never on the async executor.
    fn lifecycle(&self, event: Progress) {
        let _ = self.0.blocking_send(event);
    }
}

pub async fn run_jobs(cfg: &VdlConfig, jobs: Vec<JobDescriptor>) -> Result<()> {
    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }

    let labels: HashMap<JobId, String> = jobs
        .iter()
        .map(|j| (j.id(), j.source_url().to_string()))
        .collect();

    let mut downloader = Downloader::builder()
        .config(cfg.pipeline_builder())
        .collaborators(cfg.collaborators())
        .jobs(jobs)
        .build()
        .context("invalid download settings")?;

    let (progress_tx, progress_rx) = mpsc::channel::<Progress>(64);
    let progress_tx = ProgressSender(progress_tx);
    for id in downloader.job_ids().to_vec() {
        let tx = progress_tx.clone();
        downloader.on_fetch_started(id, move |id| tx.lifecycle(Progress::Started(id)))?;
        let tx = progress_tx.clone();
        downloader.on_fetch_progress(id, move |id, percent| tx.percent(id, percent))?;
        let tx = progress_tx.clone();
        downloader.on_fetch_finished(id, move |id| tx.lifecycle(Progress::Finished(id)))?;
    }
    drop(progress_tx);

    let printer_done = CancellationToken::new();
    let printer = tokio::spawn(print_progress(
        progress_rx,
        labels.clone(),
        printer_done.clone(),
    ));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted, cancelling outstanding jobs");
            trigger.cancel();
        }
    });

    let report = downloader.run_all_async(cancel).await;
    interrupt.abort();
    // Detached jobs may still hold senders; stop the printer explicitly.
    printer_done.cancel();
    let _ = printer.await;

    print_summary(&report, &labels);

    if !report.is_success() {
        bail!(
            "{} of {} job(s) failed",
            report.failures.len(),
            report.total()
        );
    }
    tracing::info!("run completed {} job(s)", report.total());
    Ok(())
}

async fn print_progress(
    mut rx: mpsc::Receiver<Progress>,
    labels: HashMap<JobId, String>,
    done: CancellationToken,
) {
    let mut last_print: HashMap<JobId, Instant> = HashMap::new();
    let label = |id: &JobId| labels.get(id).cloned().unwrap_or_else(|| id.to_string());
    loop {
        let event = tokio::select! {
            biased;
            event = rx.recv() => event,
            _ = done.cancelled() => None,
        };
        let Some(event) = event else {
            break;
        };
        match event {
            Progress::Started(id) => println!("  {}: fetching", label(&id)),
            Progress::Percent(id, percent) => {
                let now = Instant::now();
                let due = last_print
                    .get(&id)
                    .map_or(true, |t| now.duration_since(*t) >= PROGRESS_INTERVAL);
                if due || percent >= 100.0 {
                    println!("  {}: {:.1}%", label(&id), percent);
                    last_print.insert(id, now);
                }
            }
            Progress::Finished(id) => println!("  {}: fetched", label(&id)),
        }
    }
}

fn print_summary(report: &RunReport, labels: &HashMap<JobId, String>) {
    let label = |id: &JobId| labels.get(id).cloned().unwrap_or_else(|| id.to_string());
    for result in &report.results {
        if result.skipped {
            println!("skipped {} (exists: {})", label(&result.id), result.video_path.display());
            continue;
        }
        if !result.video_removed {
            println!("video   {}", result.video_path.display());
        }
        if let Some(audio) = &result.audio_path {
            println!("audio   {}", audio.display());
        }
    }
    for failure in &report.failures {
        println!("failed  {}: {}", label(&failure.id), failure.error);
        if let Some(partial) = failure.error.partial_result() {
            if let Some(audio) = &partial.audio_path {
                println!("audio   {}", audio.display());
            }
        }
    }
    println!(
        "{} completed, {} skipped, {} failed",
        report.completed().count(),
        report.skipped().count(),
        report.failures.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn lifecycle_events_survive_a_full_channel() {
        let (tx, mut rx) = mpsc::channel::<Progress>(2);
        let sender = ProgressSender(tx);
        let id = JobId::new();
        sender.percent(id, 10.0);
        sender.percent(id, 20.0);
        sender.percent(id, 30.0);

        let worker = {
            let sender = sender.clone();
            thread::spawn(move || sender.lifecycle(Progress::Finished(id)))
        };
        drop(sender);

        let mut got = Vec::new();
        while let Some(event) = rx.blocking_recv() {
            got.push(event);
        }
        worker.join().unwrap();

        assert_eq!(
            got,
            vec![
                Progress::Percent(id, 10.0),
                Progress::Percent(id, 20.0),
                Progress::Finished(id),
            ]
        );
    }

    #[test]
    fn lifecycle_send_returns_once_printer_is_gone() {
        let (tx, rx) = mpsc::channel::<Progress>(1);
        let sender = ProgressSender(tx);
        let id = JobId::new();
        sender.lifecycle(Progress::Started(id));
        drop(rx);
        sender.lifecycle(Progress::Finished(id));
    }
}
