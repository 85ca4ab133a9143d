//! Resolver interface: turns a source URL into candidate renditions.
//!
//! The pipeline only depends on this trait; locating and authorizing a
//! media stream is the resolver's business.

mod direct;

pub use direct::DirectResolver;

use crate::job::RenditionType;

/// One available encoding/format variant of a source media resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendition {
    pub title: String,
    /// Extension including the leading dot, e.g. `.mp4`.
    pub file_extension: String,
    /// Audio bitrate in kbit/s (0 when unknown).
    pub audio_bitrate: u32,
    pub rendition_type: RenditionType,
    pub requires_decryption: bool,
    /// URL the fetcher downloads from (fetch-ready after `decrypt`).
    pub url: String,
}

/// Errors raised by a resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("invalid source URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("resolver lookup failed: {0}")]
    Lookup(String),
    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Capability consumed by the pipeline. Shared read-only across all jobs.
pub trait Resolver: Send + Sync {
    /// Lists all renditions available for `url`, in the resolver's preferred order.
    fn list_renditions(&self, url: &str) -> Result<Vec<Rendition>, ResolveError>;

    /// Returns a fetch-ready copy of a rendition that has `requires_decryption` set.
    fn decrypt(&self, rendition: Rendition) -> Result<Rendition, ResolveError>;
}

/// Picks the rendition of type `wanted` with the highest audio bitrate.
/// Ties go to the first one in resolver order.
pub fn select_rendition(renditions: &[Rendition], wanted: RenditionType) -> Option<&Rendition> {
    renditions
        .iter()
        .filter(|r| r.rendition_type == wanted)
        .fold(None, |best: Option<&Rendition>, r| match best {
            Some(b) if b.audio_bitrate >= r.audio_bitrate => Some(b),
            _ => Some(r),
        })
}
