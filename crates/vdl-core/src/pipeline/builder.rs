//! Bulk entry point: configure once, register many jobs, run them together.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::control::CancellationToken;
use crate::job::{JobDescriptor, JobId};
use crate::registry::{
    AudioConvertEvent, CollaboratorFactory, DefaultCollaborators, JobRegistry, RegistryError,
};
use crate::resolver::{DirectResolver, Resolver};

use super::config::{ConfigError, ExportMode, PipelineConfig, PipelineConfigBuilder};
use super::coordinator::Coordinator;
use super::report::RunReport;

/// Errors from [`DownloaderBuilder::build`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Builder for a [`Downloader`]. Without explicit collaborators it uses the
/// direct-link resolver, libcurl and ffmpeg.
pub struct DownloaderBuilder {
    config: PipelineConfigBuilder,
    jobs: Vec<JobDescriptor>,
    resolver: Option<Arc<dyn Resolver>>,
    factory: Option<Arc<dyn CollaboratorFactory>>,
}

impl Default for DownloaderBuilder {
    fn default() -> Self {
        Self {
            config: PipelineConfigBuilder::default(),
            jobs: Vec::new(),
            resolver: None,
            factory: None,
        }
    }
}

impl DownloaderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all pipeline settings at once.
    pub fn config(mut self, config: PipelineConfigBuilder) -> Self {
        self.config = config;
        self
    }

    pub fn video_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = self.config.video_dir(dir);
        self
    }

    pub fn audio_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = self.config.audio_dir(dir);
        self
    }

    pub fn export_mode(mut self, mode: ExportMode) -> Self {
        self.config = self.config.export_mode(mode);
        self
    }

    pub fn skip_if_exists(mut self, skip: bool) -> Self {
        self.config = self.config.skip_if_exists(skip);
        self
    }

    pub fn cleanup_video_after_audio(mut self, cleanup: bool) -> Self {
        self.config = self.config.cleanup_video_after_audio(cleanup);
        self
    }

    /// Replaces the job list.
    pub fn jobs(mut self, jobs: impl IntoIterator<Item = JobDescriptor>) -> Self {
        self.jobs = jobs.into_iter().collect();
        self
    }

    /// Replaces the job list with one default job per URL.
    pub fn urls<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.jobs(urls.into_iter().map(JobDescriptor::new))
    }

    /// Appends one default job for `url`.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.job(JobDescriptor::new(url))
    }

    pub fn job(mut self, job: JobDescriptor) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn collaborators(mut self, factory: impl CollaboratorFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Validates the settings (creating the export directories) and
    /// registers every job.
    pub fn build(self) -> Result<Downloader, BuildError> {
        let config = self.config.build()?;
        let factory: Arc<dyn CollaboratorFactory> = self
            .factory
            .unwrap_or_else(|| Arc::new(DefaultCollaborators::default()));
        let resolver: Arc<dyn Resolver> = self
            .resolver
            .unwrap_or_else(|| Arc::new(DirectResolver::new()));

        let mut registry = JobRegistry::new(factory);
        for job in self.jobs {
            registry.register(job)?;
        }
        Ok(Downloader {
            config: Arc::new(config),
            resolver,
            registry,
        })
    }
}

/// A configured set of jobs, ready for hook registration and a run.
pub struct Downloader {
    config: Arc<PipelineConfig>,
    resolver: Arc<dyn Resolver>,
    registry: JobRegistry,
}

impl Downloader {
    pub fn builder() -> DownloaderBuilder {
        DownloaderBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registered job identities in submission order.
    pub fn job_ids(&self) -> &[JobId] {
        self.registry.ids()
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut JobRegistry {
        &mut self.registry
    }

    /// Registers one more job after build.
    pub fn add_job(&mut self, job: JobDescriptor) -> Result<JobId, RegistryError> {
        let id = job.id();
        self.registry.register(job)?;
        Ok(id)
    }

    pub fn on_pre_convert<F>(&mut self, id: JobId, hook: F) -> Result<(), RegistryError>
    where
        F: FnMut(&AudioConvertEvent) + Send + 'static,
    {
        self.registry.set_pre_convert_hook(id, hook)
    }

    pub fn on_post_convert<F>(&mut self, id: JobId, hook: F) -> Result<(), RegistryError>
    where
        F: FnMut(&AudioConvertEvent) + Send + 'static,
    {
        self.registry.set_post_convert_hook(id, hook)
    }

    pub fn on_fetch_progress<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId, f64) + Send + 'static,
    {
        self.registry.on_fetch_progress(id, listener)
    }

    pub fn on_fetch_started<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId) + Send + 'static,
    {
        self.registry.on_fetch_started(id, listener)
    }

    pub fn on_fetch_finished<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId) + Send + 'static,
    {
        self.registry.on_fetch_finished(id, listener)
    }

    pub fn into_coordinator(self) -> Coordinator {
        Coordinator::new(self.config, self.resolver, self.registry)
    }

    /// See [`Coordinator::run_all`].
    pub fn run_all(self) -> io::Result<RunReport> {
        self.into_coordinator().run_all()
    }

    /// See [`Coordinator::run_all_cancellable`].
    pub fn run_all_cancellable(self, cancel: CancellationToken) -> io::Result<RunReport> {
        self.into_coordinator().run_all_cancellable(cancel)
    }

    /// See [`Coordinator::run_all_async`].
    pub async fn run_all_async(self, cancel: CancellationToken) -> RunReport {
        self.into_coordinator().run_all_async(cancel).await
    }
}
