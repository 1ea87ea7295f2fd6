//! Mapping from URIs to cache locations.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use url::Url;

/// Base name used when a URI path has no final segment (`/` or `/docs/`).
pub const INDEX_BASE_NAME: &str = "index";

/// Bytes of the resource digest kept in a base name.
const DIGEST_BYTES: usize = 6;

/// Deterministic on-disk location of one URI's artifact, minus its extension.
///
/// The extension is only known once the server has told us the content type,
/// so it is not part of the key. Distinct resources always get distinct
/// keys: the base name carries a digest of the [`resource_id`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Directory holding the artifact: `<root>/<host>/<path segments...>`.
    pub folder: PathBuf,
    /// File name without extension: `<label>-<digest>`.
    pub base_name: String,
    /// Readable name of the resource, from the stem of the final path segment.
    pub label: String,
}

/// Maps URIs to [`CacheKey`]s below a cache root.
#[derive(Debug, Clone)]
pub struct CacheKeyMapper {
    root: PathBuf,
}

impl CacheKeyMapper {
    /// Create a mapper rooted at `root`.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the cache key for `uri`.
    ///
    /// Fragments are ignored. Every path component is sanitised so the result
    /// always stays below the root.
    pub fn map(&self, uri: &Url) -> Result<CacheKey> {
        let host = uri
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::InvalidUrl(format!("'{uri}' has no host to cache under")))?;

        let host_dir = match uri.port() {
            Some(port) => format!("{host}_{port}"),
            None => host.to_string(),
        };

        let mut folder = self.root.join(sanitize_component(&host_dir));

        let segments: Vec<&str> = uri
            .path_segments()
            .map(Iterator::collect)
            .unwrap_or_default();

        let (last, parents) = match segments.split_last() {
            Some((last, parents)) => (*last, parents),
            None => ("", &[][..]),
        };

        for segment in parents.iter().filter(|s| !s.is_empty()) {
            folder.push(sanitize_component(segment));
        }

        let label = if last.is_empty() {
            INDEX_BASE_NAME.to_string()
        } else {
            let stem = Path::new(last)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(last);
            sanitize_component(stem)
        };
        let base_name = format!("{label}-{}", resource_digest(uri));

        Ok(CacheKey {
            folder,
            base_name,
            label,
        })
    }
}

/// Short hex digest of the resource identity, stable across runs.
fn resource_digest(uri: &Url) -> String {
    let digest = Sha256::digest(resource_id(uri).as_bytes());
    digest
        .iter()
        .take(DIGEST_BYTES)
        .fold(String::with_capacity(DIGEST_BYTES * 2), |mut out, b| {
            let _ = write!(out, "{b:02x}");
            out
        })
}

/// Identity of the resource behind `uri`: the absolute URI without fragment.
///
/// Two links that differ only in their `#fragment` name the same document,
/// so memo maps and page lookups are keyed by this string.
#[must_use]
pub fn resource_id(uri: &Url) -> String {
    let mut bare = uri.clone();
    bare.set_fragment(None);
    bare.into()
}

/// Restrict a path component to a conservative character set.
///
/// Anything outside `[A-Za-z0-9._-]` becomes `_` and `..` sequences are
/// collapsed so a component can never climb out of its parent.
fn sanitize_component(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }

    if sanitized.is_empty() || sanitized == "." {
        "_".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn key(uri: &str) -> CacheKey {
        CacheKeyMapper::new("/cache")
            .map(&Url::parse(uri).unwrap())
            .unwrap()
    }

    #[test]
    fn test_maps_host_and_segments() {
        let k = key("https://ex.org/news/2024/item.html");
        assert_eq!(k.folder, PathBuf::from("/cache/ex.org/news/2024"));
        assert_eq!(k.label, "item");
        assert!(k.base_name.starts_with("item-"));
        assert_eq!(k.base_name.len(), "item-".len() + DIGEST_BYTES * 2);
    }

    #[test]
    fn test_distinct_resources_get_distinct_keys() {
        let pairs = [
            ("https://ex.org/p?id=1", "https://ex.org/p?id=2"),
            ("https://ex.org/a.html", "https://ex.org/a.php"),
            ("https://ex.org/docs/", "https://ex.org/docs/index"),
            ("https://ex.org/a:b.html", "https://ex.org/a;b.html"),
        ];
        for (left, right) in pairs {
            let (l, r) = (key(left), key(right));
            assert_eq!(l.folder, r.folder, "{left} / {right}");
            assert_eq!(l.label, r.label, "{left} / {right}");
            assert_ne!(l.base_name, r.base_name, "{left} / {right}");
        }
    }

    #[test]
    fn test_root_and_trailing_slash_use_index() {
        let root = key("https://ex.org/");
        assert_eq!(root.folder, PathBuf::from("/cache/ex.org"));
        assert_eq!(root.label, INDEX_BASE_NAME);

        let dir = key("https://ex.org/docs/");
        assert_eq!(dir.folder, PathBuf::from("/cache/ex.org/docs"));
        assert_eq!(dir.label, INDEX_BASE_NAME);
    }

    #[test]
    fn test_fragment_ignored() {
        assert_eq!(key("https://ex.org/a.html?x=1#top"), key("https://ex.org/a.html?x=1"));
        assert_eq!(key("https://ex.org/a.html#top"), key("https://ex.org/a.html"));
    }

    #[test]
    fn test_explicit_port_in_host_dir() {
        let k = key("http://127.0.0.1:8080/page");
        assert_eq!(k.folder, PathBuf::from("/cache/127.0.0.1_8080"));
        assert_eq!(k.label, "page");
    }

    #[test]
    fn test_unsafe_characters_sanitized() {
        let k = key("https://ex.org/a%20b/c:d.html");
        assert_eq!(k.folder, PathBuf::from("/cache/ex.org/a_20b"));
        assert_eq!(k.label, "c_d");
        assert!(
            k.base_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let a = key("https://ex.org/x/y/z.html");
        let b = key("https://ex.org/x/y/z.html");
        assert_eq!(a, b);
    }

    #[test]
    fn test_hostless_uri_rejected() {
        let mapper = CacheKeyMapper::new("/cache");
        assert!(mapper.map(&Url::parse("mailto:me@ex.org").unwrap()).is_err());
    }

    #[test]
    fn test_resource_id_drops_fragment_only() {
        let with_fragment = Url::parse("https://ex.org/b.html?x=1#top").unwrap();
        assert_eq!(resource_id(&with_fragment), "https://ex.org/b.html?x=1");
        let plain = Url::parse("https://ex.org/").unwrap();
        assert_eq!(resource_id(&plain), "https://ex.org/");
    }

    #[test]
    fn test_sanitize_component() {
        assert_eq!(sanitize_component("...."), "__");
        assert_eq!(sanitize_component(""), "_");
        assert_eq!(sanitize_component("ok-name_1.txt"), "ok-name_1.txt");
    }
}
