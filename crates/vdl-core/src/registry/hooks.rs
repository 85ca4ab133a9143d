//! Per-job lifecycle hook types.

use crate::job::JobId;
use std::fmt;
use std::path::PathBuf;

/// Payload of the pre/post convert hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioConvertEvent {
    pub id: JobId,
    pub audio_path: PathBuf,
}

pub type ConvertHook = Box<dyn FnMut(&AudioConvertEvent) + Send>;
pub type ProgressListener = Box<dyn FnMut(JobId, f64) + Send>;
pub type FetchListener = Box<dyn FnMut(JobId) + Send>;

/// Which convert hook a registration targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    PreConvert,
    PostConvert,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::PreConvert => f.write_str("pre-convert"),
            HookPhase::PostConvert => f.write_str("post-convert"),
        }
    }
}
