//! Resolver for direct media links: one rendition named after the URL path.

use super::{Rendition, ResolveError, Resolver};
use crate::job::RenditionType;

/// Extension assumed when the URL path has none.
const DEFAULT_EXTENSION: &str = ".mp4";
/// Title used when the URL path yields nothing usable.
const DEFAULT_TITLE: &str = "download";

/// Treats every source URL as a direct, unencrypted media file.
#[derive(Debug, Clone, Default)]
pub struct DirectResolver;

impl DirectResolver {
    pub fn new() -> Self {
        Self
    }
}

/// Last non-empty path segment of `url`, or `None` for root/empty paths.
fn last_path_segment(url: &url::Url) -> Option<String> {
    let segment = url.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Splits `name` into (stem, extension-with-dot). Dotfiles have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(at) if at + 1 == name.len() => (&name[..at], None),
        Some(at) => (&name[..at], Some(&name[at..])),
    }
}

impl Resolver for DirectResolver {
    fn list_renditions(&self, url: &str) -> Result<Vec<Rendition>, ResolveError> {
        let parsed = url::Url::parse(url).map_err(|e| ResolveError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ResolveError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let segment = last_path_segment(&parsed);
        let (title, extension) = match segment.as_deref() {
            Some(seg) => {
                let (stem, ext) = split_extension(seg);
                (stem.to_string(), ext.unwrap_or(DEFAULT_EXTENSION).to_string())
            }
            None => (DEFAULT_TITLE.to_string(), DEFAULT_EXTENSION.to_string()),
        };
        let title = if title.is_empty() {
            DEFAULT_TITLE.to_string()
        } else {
            title
        };

        Ok(vec![Rendition {
            title,
            rendition_type: RenditionType::from_extension(&extension),
            file_extension: extension,
            audio_bitrate: 0,
            requires_decryption: false,
            url: url.to_string(),
        }])
    }

    fn decrypt(&self, rendition: Rendition) -> Result<Rendition, ResolveError> {
        Ok(rendition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_extension_from_path() {
        let r = DirectResolver::new()
            .list_renditions("https://cdn.example.com/media/Concert%20Night.webm?sig=1")
            .unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].title, "Concert%20Night");
        assert_eq!(r[0].file_extension, ".webm");
        assert_eq!(r[0].rendition_type, RenditionType::WebM);
        assert!(!r[0].requires_decryption);
    }

    #[test]
    fn missing_extension_defaults_to_mp4() {
        let r = DirectResolver::new()
            .list_renditions("https://example.com/watch/abc123")
            .unwrap();
        assert_eq!(r[0].title, "abc123");
        assert_eq!(r[0].file_extension, ".mp4");
        assert_eq!(r[0].rendition_type, RenditionType::Mp4);
    }

    #[test]
    fn root_path_uses_default_title() {
        let r = DirectResolver::new()
            .list_renditions("https://example.com/")
            .unwrap();
        assert_eq!(r[0].title, "download");
    }

    #[test]
    fn rejects_garbage_and_non_http() {
        let resolver = DirectResolver::new();
        assert!(matches!(
            resolver.list_renditions("not a url"),
            Err(ResolveError::InvalidUrl { .. })
        ));
        assert!(matches!(
            resolver.list_renditions("ftp://example.com/a.mp4"),
            Err(ResolveError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn split_extension_edge_cases() {
        assert_eq!(split_extension("a.tar.mp4"), ("a.tar", Some(".mp4")));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
        assert_eq!(split_extension("trailing."), ("trailing", None));
    }
}
