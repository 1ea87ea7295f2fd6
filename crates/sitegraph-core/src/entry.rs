//! On-disk cached artifact for one URI.

use crate::cache_key::CacheKey;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;
use url::Url;

/// Suffix of in-flight writes; never treated as a cached artifact.
const TEMP_SUFFIX: &str = ".tmp";

/// One URI's cached representation.
///
/// The file extension may be unknown until the first successful fetch has
/// reported a content type. Once set it never changes. Existence is purely a
/// question of whether a file is present at [`CachedEntry::path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    uri: Url,
    folder: PathBuf,
    base_name: String,
    label: String,
    extension: Option<String>,
}

impl CachedEntry {
    /// Create an entry for `uri` at `key`.
    ///
    /// If the extension is not yet known and exactly one `base_name.*` file
    /// already sits in the folder, that file's extension is adopted.
    #[must_use]
    pub fn new(uri: Url, key: CacheKey) -> Self {
        let extension = discover_extension(&key.folder, &key.base_name);
        Self {
            uri,
            folder: key.folder,
            base_name: key.base_name,
            label: key.label,
            extension,
        }
    }

    /// URI this entry caches.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Directory holding the artifact.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// File name without extension.
    #[must_use]
    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Readable resource name, used as a page title until one is parsed.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Extension including the leading dot (`.html`), if known.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Fix the extension.
    ///
    /// Setting the same extension again is a no-op; trying to change an
    /// already fixed extension is a storage error.
    pub fn set_extension(&mut self, extension: &str) -> Result<()> {
        match &self.extension {
            Some(current) if current.eq_ignore_ascii_case(extension) => Ok(()),
            Some(current) => Err(Error::Storage(format!(
                "Extension of cached {} is already '{current}', refusing '{extension}'",
                self.uri
            ))),
            None => {
                self.extension = Some(extension.to_string());
                Ok(())
            },
        }
    }

    /// Full file path, available once the extension is known.
    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.extension
            .as_ref()
            .map(|ext| self.folder.join(format!("{}{ext}", self.base_name)))
    }

    /// Whether a cached artifact is present.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path().is_some_and(|p| p.is_file())
    }

    /// Last write time of the artifact, or the Unix epoch when absent.
    #[must_use]
    pub fn last_write(&self) -> DateTime<Utc> {
        self.path()
            .and_then(|p| fs::metadata(p).ok())
            .and_then(|m| m.modified().ok())
            .map_or(DateTime::UNIX_EPOCH, DateTime::<Utc>::from)
    }

    /// Replace the artifact's bytes.
    ///
    /// Writes go to a temporary file that is renamed into place, so a failed
    /// write never leaves a truncated artifact under the final name.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let path = self.require_path()?;
        fs::create_dir_all(&self.folder)
            .map_err(|e| Error::Storage(format!("Failed to create cache folder: {e}")))?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(TEMP_SUFFIX);
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, bytes)
            .map_err(|e| Error::Storage(format!("Failed to write temp cache file: {e}")))?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| Error::Storage(format!("Failed to remove stale cache file: {e}")))?;
        }

        fs::rename(&tmp_path, &path)
            .map_err(|e| Error::Storage(format!("Failed to commit cache file: {e}")))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Cached artifact written");
        Ok(())
    }

    /// Mark the artifact as fresh without rewriting it.
    pub fn touch(&self) -> Result<()> {
        self.touch_at(SystemTime::now())
    }

    /// Set the artifact's modification time.
    pub fn touch_at(&self, when: SystemTime) -> Result<()> {
        let path = self.require_path()?;
        let file = fs::File::options()
            .write(true)
            .open(&path)
            .map_err(|e| Error::Storage(format!("Failed to open cache file: {e}")))?;
        file.set_modified(when)
            .map_err(|e| Error::Storage(format!("Failed to touch cache file: {e}")))?;
        Ok(())
    }

    /// Read the artifact as UTF-8 text (lossy).
    pub fn read_to_string(&self) -> Result<String> {
        let path = self.require_path()?;
        let bytes = fs::read(&path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn require_path(&self) -> Result<PathBuf> {
        self.path().ok_or_else(|| {
            Error::Storage(format!(
                "Extension of cached {} is not known yet",
                self.uri
            ))
        })
    }
}

/// Extension of the single `base_name.*` artifact in `folder`, if unambiguous.
fn discover_extension(folder: &Path, base_name: &str) -> Option<String> {
    let prefix = format!("{base_name}.");
    let mut found = fs::read_dir(folder)
        .ok()?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.starts_with(&prefix) && !name.ends_with(TEMP_SUFFIX))
        .map(|name| name[base_name.len()..].to_string())
        .filter(|ext| !ext[1..].contains('.'));

    let first = found.next()?;
    if found.next().is_some() {
        return None;
    }
    Some(first)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::cache_key::CacheKeyMapper;
    use std::time::Duration;
    use tempfile::TempDir;

    fn entry(root: &Path, uri: &str) -> CachedEntry {
        let uri = Url::parse(uri).unwrap();
        let key = CacheKeyMapper::new(root).map(&uri).unwrap();
        CachedEntry::new(uri, key)
    }

    #[test]
    fn test_new_entry_has_unknown_extension() {
        let temp = TempDir::new().unwrap();
        let e = entry(temp.path(), "https://ex.org/a.html");
        assert_eq!(e.extension(), None);
        assert_eq!(e.path(), None);
        assert!(!e.exists());
        assert_eq!(e.last_write(), DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_extension_is_set_once() {
        let temp = TempDir::new().unwrap();
        let mut e = entry(temp.path(), "https://ex.org/a.html");

        e.set_extension(".html").unwrap();
        e.set_extension(".HTML").unwrap();
        assert_eq!(e.extension(), Some(".html"));

        let err = e.set_extension(".xml").unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(e.extension(), Some(".html"));
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let mut e = entry(temp.path(), "https://ex.org/docs/a.html");
        e.set_extension(".html").unwrap();
        e.write(b"<html></html>").unwrap();

        assert!(e.exists());
        assert_eq!(
            e.path().unwrap(),
            temp.path()
                .join("ex.org")
                .join("docs")
                .join(format!("{}.html", e.base_name()))
        );
        assert_eq!(e.label(), "a");
        assert_eq!(e.read_to_string().unwrap(), "<html></html>");
        assert!(e.last_write() > DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_write_without_extension_fails() {
        let temp = TempDir::new().unwrap();
        let e = entry(temp.path(), "https://ex.org/a.html");
        assert!(matches!(e.write(b"x"), Err(Error::Storage(_))));
        assert!(!temp.path().join("ex.org").exists());
    }

    #[test]
    fn test_existing_artifact_discovered() {
        let temp = TempDir::new().unwrap();
        let mut first = entry(temp.path(), "https://ex.org/page");
        first.set_extension(".html").unwrap();
        first.write(b"cached").unwrap();

        let again = entry(temp.path(), "https://ex.org/page");
        assert_eq!(again.extension(), Some(".html"));
        assert!(again.exists());
    }

    #[test]
    fn test_ambiguous_or_temp_artifacts_not_adopted() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("ex.org");
        fs::create_dir_all(&folder).unwrap();
        let base = entry(temp.path(), "https://ex.org/page").base_name().to_string();

        fs::write(folder.join(format!("{base}.html.tmp")), b"partial").unwrap();
        assert_eq!(entry(temp.path(), "https://ex.org/page").extension(), None);

        fs::write(folder.join(format!("{base}.html")), b"a").unwrap();
        fs::write(folder.join(format!("{base}.xml")), b"b").unwrap();
        assert_eq!(entry(temp.path(), "https://ex.org/page").extension(), None);
    }

    #[test]
    fn test_query_variants_do_not_share_artifacts() {
        let temp = TempDir::new().unwrap();
        let mut first = entry(temp.path(), "https://ex.org/p?id=1");
        first.set_extension(".html").unwrap();
        first.write(b"one").unwrap();

        let second = entry(temp.path(), "https://ex.org/p?id=2");
        assert_eq!(second.extension(), None);
        assert!(!second.exists());
        assert_eq!(second.label(), first.label());
    }

    #[test]
    fn test_touch_moves_timestamp() {
        let temp = TempDir::new().unwrap();
        let mut e = entry(temp.path(), "https://ex.org/a.html");
        e.set_extension(".html").unwrap();
        e.write(b"body").unwrap();

        let old = SystemTime::now() - Duration::from_secs(3 * 24 * 3600);
        e.touch_at(old).unwrap();
        let before = e.last_write();
        assert!(Utc::now() - before > chrono::TimeDelta::days(2));

        e.touch().unwrap();
        assert!(e.last_write() > before);
        assert_eq!(e.read_to_string().unwrap(), "body");
    }
}
