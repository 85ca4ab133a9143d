//! Job descriptors: what to download, under which identity and name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identity of one job. The only key used to correlate registry
/// entries, hooks and results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Container/format family of a rendition, as reported by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenditionType {
    #[default]
    Mp4,
    WebM,
    Flash,
    Mobile,
    Unknown,
}

impl RenditionType {
    /// Best-effort type from a file extension (with or without leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "mp4" | "m4v" => RenditionType::Mp4,
            "webm" => RenditionType::WebM,
            "flv" => RenditionType::Flash,
            "3gp" => RenditionType::Mobile,
            _ => RenditionType::Unknown,
        }
    }
}

impl fmt::Display for RenditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenditionType::Mp4 => "mp4",
            RenditionType::WebM => "webm",
            RenditionType::Flash => "flash",
            RenditionType::Mobile => "mobile",
            RenditionType::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRenditionType(pub String);

impl fmt::Display for UnknownRenditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown rendition type '{}' (expected mp4, webm, flash, mobile or unknown)",
            self.0
        )
    }
}

impl std::error::Error for UnknownRenditionType {}

impl FromStr for RenditionType {
    type Err = UnknownRenditionType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mp4" => Ok(RenditionType::Mp4),
            "webm" => Ok(RenditionType::WebM),
            "flash" | "flv" => Ok(RenditionType::Flash),
            "mobile" | "3gp" => Ok(RenditionType::Mobile),
            "unknown" => Ok(RenditionType::Unknown),
            _ => Err(UnknownRenditionType(s.to_string())),
        }
    }
}

/// One unit of work: a source URL plus its identity and naming options.
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    id: JobId,
    source_url: String,
    output_base_name: Option<String>,
    rendition_type: RenditionType,
}

impl JobDescriptor {
    /// New descriptor with a fresh identity, no explicit name and the default (mp4) type.
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            source_url: source_url.into(),
            output_base_name: None,
            rendition_type: RenditionType::default(),
        }
    }

    pub fn with_id(mut self, id: JobId) -> Self {
        self.id = id;
        self
    }

    /// Base name for the saved files; overrides the rendition title.
    pub fn with_output_base_name(mut self, name: impl Into<String>) -> Self {
        self.output_base_name = Some(name.into());
        self
    }

    pub fn with_rendition_type(mut self, rendition_type: RenditionType) -> Self {
        self.rendition_type = rendition_type;
        self
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn output_base_name(&self) -> Option<&str> {
        self.output_base_name.as_deref()
    }

    pub fn rendition_type(&self) -> RenditionType {
        self.rendition_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_descriptors_get_distinct_ids() {
        let a = JobDescriptor::new("https://example.com/a.mp4");
        let b = JobDescriptor::new("https://example.com/a.mp4");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.rendition_type(), RenditionType::Mp4);
        assert!(a.output_base_name().is_none());
    }

    #[test]
    fn builder_methods_keep_supplied_id() {
        let id = JobId::new();
        let d = JobDescriptor::new("https://example.com/x")
            .with_id(id)
            .with_output_base_name("clip")
            .with_rendition_type(RenditionType::WebM);
        assert_eq!(d.id(), id);
        assert_eq!(d.output_base_name(), Some("clip"));
        assert_eq!(d.rendition_type(), RenditionType::WebM);
    }

    #[test]
    fn rendition_type_parse_and_display() {
        assert_eq!("WebM".parse::<RenditionType>().unwrap(), RenditionType::WebM);
        assert_eq!("flv".parse::<RenditionType>().unwrap(), RenditionType::Flash);
        assert!("ogg".parse::<RenditionType>().is_err());
        assert_eq!(RenditionType::Mobile.to_string(), "mobile");
    }

    #[test]
    fn rendition_type_from_extension() {
        assert_eq!(RenditionType::from_extension(".mp4"), RenditionType::Mp4);
        assert_eq!(RenditionType::from_extension("WEBM"), RenditionType::WebM);
        assert_eq!(RenditionType::from_extension(".mkv"), RenditionType::Unknown);
    }
}
