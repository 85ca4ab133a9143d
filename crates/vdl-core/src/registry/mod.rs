//! Job registry: per-identity resources and lifecycle hooks.
//!
//! Each registered job gets its own fetcher and transcoder from the
//! [`CollaboratorFactory`]. Nothing in a [`JobResources`] bundle is shared
//! with another job; the coordinator moves each bundle into its job's task.

mod factory;
mod hooks;

pub use factory::{CollaboratorFactory, DefaultCollaborators};
pub use hooks::{AudioConvertEvent, ConvertHook, FetchListener, HookPhase, ProgressListener};

use crate::fetcher::Fetcher;
use crate::job::{JobDescriptor, JobId};
use crate::transcoder::Transcoder;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Registration errors. These are programming errors, never retried.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("job {id} already has a {phase} hook")]
    DuplicateHook { id: JobId, phase: HookPhase },
    #[error("job {id} is not registered")]
    NotFound { id: JobId },
    #[error("job {id} is already registered")]
    DuplicateJob { id: JobId },
}

/// Everything one job owns while its pipeline runs.
pub struct JobResources {
    pub(crate) fetcher: Box<dyn Fetcher>,
    pub(crate) transcoder: Box<dyn Transcoder>,
    pub(crate) pre_convert: Option<ConvertHook>,
    pub(crate) post_convert: Option<ConvertHook>,
    pub(crate) on_progress: Vec<ProgressListener>,
    pub(crate) on_started: Vec<FetchListener>,
    pub(crate) on_finished: Vec<FetchListener>,
}

impl JobResources {
    fn new(fetcher: Box<dyn Fetcher>, transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            fetcher,
            transcoder,
            pre_convert: None,
            post_convert: None,
            on_progress: Vec::new(),
            on_started: Vec::new(),
            on_finished: Vec::new(),
        }
    }

    pub fn has_pre_convert_hook(&self) -> bool {
        self.pre_convert.is_some()
    }

    pub fn has_post_convert_hook(&self) -> bool {
        self.post_convert.is_some()
    }

    /// Number of fetch listeners (progress, started, finished).
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        (
            self.on_progress.len(),
            self.on_started.len(),
            self.on_finished.len(),
        )
    }
}

impl fmt::Debug for JobResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobResources")
            .field("pre_convert", &self.pre_convert.is_some())
            .field("post_convert", &self.post_convert.is_some())
            .field("on_progress", &self.on_progress.len())
            .field("on_started", &self.on_started.len())
            .field("on_finished", &self.on_finished.len())
            .finish_non_exhaustive()
    }
}

/// A registered job handed to the coordinator.
#[derive(Debug)]
pub struct RegisteredJob {
    pub descriptor: JobDescriptor,
    pub resources: JobResources,
}

/// Identity-keyed registry of jobs, kept in submission order.
pub struct JobRegistry {
    factory: Arc<dyn CollaboratorFactory>,
    order: Vec<JobId>,
    jobs: HashMap<JobId, RegisteredJob>,
}

impl JobRegistry {
    pub fn new(factory: Arc<dyn CollaboratorFactory>) -> Self {
        Self {
            factory,
            order: Vec::new(),
            jobs: HashMap::new(),
        }
    }

    /// Registers `descriptor`, allocating a fresh fetcher and transcoder for it.
    pub fn register(
        &mut self,
        descriptor: JobDescriptor,
    ) -> Result<&mut JobResources, RegistryError> {
        let id = descriptor.id();
        if self.jobs.contains_key(&id) {
            return Err(RegistryError::DuplicateJob { id });
        }
        let resources = JobResources::new(self.factory.new_fetcher(), self.factory.new_transcoder());
        tracing::debug!(job_id = %id, url = descriptor.source_url(), "registered job");
        self.order.push(id);
        let job = self.jobs.entry(id).or_insert(RegisteredJob {
            descriptor,
            resources,
        });
        Ok(&mut job.resources)
    }

    pub fn resources_for(&self, id: JobId) -> Result<&JobResources, RegistryError> {
        self.jobs
            .get(&id)
            .map(|j| &j.resources)
            .ok_or(RegistryError::NotFound { id })
    }

    pub fn resources_for_mut(&mut self, id: JobId) -> Result<&mut JobResources, RegistryError> {
        self.jobs
            .get_mut(&id)
            .map(|j| &mut j.resources)
            .ok_or(RegistryError::NotFound { id })
    }

    pub fn descriptor(&self, id: JobId) -> Result<&JobDescriptor, RegistryError> {
        self.jobs
            .get(&id)
            .map(|j| &j.descriptor)
            .ok_or(RegistryError::NotFound { id })
    }

    /// Sets the hook run right before transcoding. One per job.
    pub fn set_pre_convert_hook<F>(&mut self, id: JobId, hook: F) -> Result<(), RegistryError>
    where
        F: FnMut(&AudioConvertEvent) + Send + 'static,
    {
        let res = self.resources_for_mut(id)?;
        if res.pre_convert.is_some() {
            return Err(RegistryError::DuplicateHook {
                id,
                phase: HookPhase::PreConvert,
            });
        }
        res.pre_convert = Some(Box::new(hook));
        Ok(())
    }

    /// Sets the hook run right after transcoding. One per job.
    pub fn set_post_convert_hook<F>(&mut self, id: JobId, hook: F) -> Result<(), RegistryError>
    where
        F: FnMut(&AudioConvertEvent) + Send + 'static,
    {
        let res = self.resources_for_mut(id)?;
        if res.post_convert.is_some() {
            return Err(RegistryError::DuplicateHook {
                id,
                phase: HookPhase::PostConvert,
            });
        }
        res.post_convert = Some(Box::new(hook));
        Ok(())
    }

    /// Adds a fetch progress listener (percent in `[0, 100]`).
    pub fn on_fetch_progress<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId, f64) + Send + 'static,
    {
        self.resources_for_mut(id)?.on_progress.push(Box::new(listener));
        Ok(())
    }

    pub fn on_fetch_started<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId) + Send + 'static,
    {
        self.resources_for_mut(id)?.on_started.push(Box::new(listener));
        Ok(())
    }

    pub fn on_fetch_finished<F>(&mut self, id: JobId, listener: F) -> Result<(), RegistryError>
    where
        F: FnMut(JobId) + Send + 'static,
    {
        self.resources_for_mut(id)?.on_finished.push(Box::new(listener));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Job identities in submission order.
    pub fn ids(&self) -> &[JobId] {
        &self.order
    }

    /// Consumes the registry into its jobs, in submission order.
    pub fn into_jobs(mut self) -> Vec<RegisteredJob> {
        self.order
            .iter()
            .filter_map(|id| self.jobs.remove(id))
            .collect()
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("jobs", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{FetchError, FetchObserver};
    use crate::resolver::Rendition;
    use crate::transcoder::{ConvertObserver, TranscodeError};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullFetcher;

    impl Fetcher for NullFetcher {
        fn init(&mut self, _rendition: &Rendition, _dest: &Path) {}
        fn execute(&mut self, _observer: &mut dyn FetchObserver) -> Result<(), FetchError> {
            Ok(())
        }
    }

    struct NullTranscoder;

    impl Transcoder for NullTranscoder {
        fn convert(
            &mut self,
            _input: &Path,
            _output: &Path,
            _observer: &mut dyn ConvertObserver,
        ) -> Result<(), TranscodeError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingFactory {
        fetchers: AtomicUsize,
        transcoders: AtomicUsize,
    }

    impl CollaboratorFactory for CountingFactory {
        fn new_fetcher(&self) -> Box<dyn Fetcher> {
            self.fetchers.fetch_add(1, Ordering::SeqCst);
            Box::new(NullFetcher)
        }
        fn new_transcoder(&self) -> Box<dyn Transcoder> {
            self.transcoders.fetch_add(1, Ordering::SeqCst);
            Box::new(NullTranscoder)
        }
    }

    fn registry() -> (JobRegistry, Arc<CountingFactory>) {
        let factory = Arc::new(CountingFactory::default());
        (JobRegistry::new(factory.clone()), factory)
    }

    #[test]
    fn register_allocates_per_job_collaborators() {
        let (mut reg, factory) = registry();
        reg.register(JobDescriptor::new("https://example.com/a.mp4")).unwrap();
        reg.register(JobDescriptor::new("https://example.com/b.mp4")).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(factory.fetchers.load(Ordering::SeqCst), 2);
        assert_eq!(factory.transcoders.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_job_id_rejected() {
        let (mut reg, _) = registry();
        let d = JobDescriptor::new("https://example.com/a.mp4");
        reg.register(d.clone()).unwrap();
        assert!(matches!(
            reg.register(d),
            Err(RegistryError::DuplicateJob { .. })
        ));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (mut reg, _) = registry();
        let id = JobId::new();
        assert!(matches!(
            reg.resources_for(id),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            reg.set_pre_convert_hook(id, |_| {}),
            Err(RegistryError::NotFound { .. })
        ));
        assert!(matches!(
            reg.on_fetch_progress(id, |_, _| {}),
            Err(RegistryError::NotFound { .. })
        ));
    }

    #[test]
    fn second_hook_per_phase_is_rejected() {
        let (mut reg, _) = registry();
        let d = JobDescriptor::new("https://example.com/a.mp4");
        let id = d.id();
        reg.register(d).unwrap();

        reg.set_pre_convert_hook(id, |_| {}).unwrap();
        match reg.set_pre_convert_hook(id, |_| {}) {
            Err(RegistryError::DuplicateHook { phase, .. }) => {
                assert_eq!(phase, HookPhase::PreConvert)
            }
            other => panic!("expected DuplicateHook, got {:?}", other),
        }

        reg.set_post_convert_hook(id, |_| {}).unwrap();
        assert!(reg.set_post_convert_hook(id, |_| {}).is_err());

        let res = reg.resources_for(id).unwrap();
        assert!(res.has_pre_convert_hook());
        assert!(res.has_post_convert_hook());
    }

    #[test]
    fn fetch_listeners_accumulate() {
        let (mut reg, _) = registry();
        let d = JobDescriptor::new("https://example.com/a.mp4");
        let id = d.id();
        reg.register(d).unwrap();
        reg.on_fetch_progress(id, |_, _| {}).unwrap();
        reg.on_fetch_progress(id, |_, _| {}).unwrap();
        reg.on_fetch_started(id, |_| {}).unwrap();
        reg.on_fetch_finished(id, |_| {}).unwrap();
        assert_eq!(reg.resources_for(id).unwrap().listener_counts(), (2, 1, 1));
    }

    #[test]
    fn into_jobs_keeps_submission_order() {
        let (mut reg, _) = registry();
        let ids: Vec<JobId> = (0..5)
            .map(|i| {
                let d = JobDescriptor::new(format!("https://example.com/{}.mp4", i));
                let id = d.id();
                reg.register(d).unwrap();
                id
            })
            .collect();
        assert_eq!(reg.ids(), ids.as_slice());
        let jobs = reg.into_jobs();
        let got: Vec<JobId> = jobs.iter().map(|j| j.descriptor.id()).collect();
        assert_eq!(got, ids);
    }
}
