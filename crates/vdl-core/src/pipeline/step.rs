//! One job's pipeline: resolve, name, skip check, fetch, convert, cleanup.
//!
//! Runs on a blocking worker thread and owns its [`JobResources`]; the
//! transcoder is dropped as soon as the conversion returns.

use std::fs;

use crate::control::{CancellationToken, ConvertLog, JobObserver};
use crate::job::JobDescriptor;
use crate::naming;
use crate::registry::{AudioConvertEvent, JobResources, RegisteredJob};
use crate::resolver::{select_rendition, Rendition, Resolver};

use super::config::PipelineConfig;
use super::report::{JobError, JobResult};

/// Read-only state shared by all job tasks of a run.
pub(super) struct JobContext<'a> {
    pub(super) config: &'a PipelineConfig,
    pub(super) resolver: &'a dyn Resolver,
    pub(super) cancel: &'a CancellationToken,
}

/// Step 1: list renditions, pick the best of the requested type, decrypt if needed.
fn resolve(resolver: &dyn Resolver, descriptor: &JobDescriptor) -> Result<Rendition, JobError> {
    let renditions = resolver
        .list_renditions(descriptor.source_url())
        .map_err(JobError::Resolution)?;
    let requested = descriptor.rendition_type();
    let chosen = select_rendition(&renditions, requested)
        .cloned()
        .ok_or(JobError::NoMatchingRendition { requested })?;
    if chosen.requires_decryption {
        return resolver.decrypt(chosen).map_err(JobError::DecryptionFailed);
    }
    Ok(chosen)
}

/// Runs every step of one job. Steps are strictly sequential.
pub(super) fn run_job(ctx: &JobContext<'_>, job: RegisteredJob) -> Result<JobResult, JobError> {
    let RegisteredJob {
        descriptor,
        resources,
    } = job;
    let id = descriptor.id();
    let span = tracing::info_span!("job", job_id = %id);
    let _enter = span.enter();

    let JobResources {
        mut fetcher,
        mut transcoder,
        mut pre_convert,
        mut post_convert,
        mut on_progress,
        mut on_started,
        mut on_finished,
    } = resources;
    let cfg = ctx.config;
    let mode = cfg.export_mode();

    let rendition = resolve(ctx.resolver, &descriptor)?;
    tracing::debug!(
        title = %rendition.title,
        extension = %rendition.file_extension,
        audio_bitrate = rendition.audio_bitrate,
        "resolved rendition"
    );

    let base_name = naming::base_name(descriptor.output_base_name(), &rendition.title);
    let video_path = naming::video_path(cfg.video_dir(), &base_name, &rendition.file_extension);
    let audio_path = naming::derive_audio_path(
        &video_path,
        cfg.video_dir(),
        cfg.audio_dir(),
        &rendition.file_extension,
    );

    if cfg.skip_if_exists() && video_path.exists() {
        tracing::info!(path = %video_path.display(), "video exists, skipping");
        return Ok(JobResult {
            id,
            video_path,
            audio_path: None,
            base_name,
            skipped: true,
            video_removed: false,
        });
    }

    // Always fetched: audio extraction needs the video payload.
    fetcher.init(&rendition, &video_path);
    let fetched = {
        let mut observer = JobObserver::new(
            id,
            ctx.cancel,
            &mut on_progress,
            &mut on_started,
            &mut on_finished,
        );
        let outcome = fetcher.execute(&mut observer);
        if observer.was_cancelled() {
            Err(JobError::Cancelled)
        } else {
            outcome.map_err(JobError::Transfer)
        }
    };
    drop(fetcher);
    fetched?;
    tracing::debug!(path = %video_path.display(), "video saved");

    let mut result = JobResult {
        id,
        video_path,
        audio_path: None,
        base_name,
        skipped: false,
        video_removed: false,
    };

    if !mode.includes_audio() {
        tracing::info!("job completed");
        return Ok(result);
    }

    let event = AudioConvertEvent {
        id,
        audio_path: audio_path.clone(),
    };
    if let Some(hook) = pre_convert.as_mut() {
        hook(&event);
    }

    tracing::debug!(output = %audio_path.display(), "converting to audio");
    let converted = transcoder.convert(&result.video_path, &audio_path, &mut ConvertLog { id });
    drop(transcoder);
    converted.map_err(JobError::Conversion)?;

    if let Some(hook) = post_convert.as_mut() {
        hook(&event);
    }
    result.audio_path = Some(audio_path);

    if cfg.removes_video_after_audio() {
        if let Err(source) = fs::remove_file(&result.video_path) {
            return Err(JobError::Cleanup {
                result: Box::new(result),
                source,
            });
        }
        result.video_removed = true;
        tracing::debug!(path = %result.video_path.display(), "removed intermediate video");
    }

    tracing::info!("job completed");
    Ok(result)
}
