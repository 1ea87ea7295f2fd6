//! Configuration management for the crawler.
//!
//! Settings are stored in TOML and can be overridden from the environment.
//!
//! ## Configuration Hierarchy
//!
//! 1. **Defaults**: platform cache directory, `day` retention, one hour timeout
//! 2. **Config file**: any TOML file passed to [`Config::load_from`]
//! 3. **Environment variables**: `SITEGRAPH_CACHE_DIR`, `SITEGRAPH_RETENTION`
//!
//! ## Example Configuration File
//!
//! ```toml
//! [cache]
//! root = "/var/tmp/sitegraph"
//! retention = "week"
//!
//! [http]
//! timeout_secs = 1800
//! user_agent = "sitegraph/0.4"
//! ```

use crate::{Error, Result, RetentionPolicy};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding [`CacheConfig::root`].
pub const CACHE_DIR_ENV: &str = "SITEGRAPH_CACHE_DIR";
/// Environment variable overriding [`CacheConfig::retention`].
pub const RETENTION_ENV: &str = "SITEGRAPH_RETENTION";

/// Top-level crawler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// On-disk cache settings
    pub cache: CacheConfig,
    /// HTTP client settings
    pub http: HttpConfig,
}

/// Where fetched artifacts live and how long they are trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Root directory; artifacts are stored as `<root>/<host>/<path>`.
    pub root: PathBuf,
    /// Retention policy applied to every cached artifact.
    pub retention: RetentionPolicy,
}

/// Settings shared by every pooled HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    ///
    /// A crawl is a long-running batch job, so this is generous by default.
    pub timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        let root = ProjectDirs::from("org", "sitegraph", "sitegraph").map_or_else(
            || std::env::temp_dir().join("sitegraph"),
            |dirs| dirs.cache_dir().to_path_buf(),
        );
        Self {
            root,
            retention: RetentionPolicy::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60 * 60,
            user_agent: concat!("sitegraph/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpConfig {
    /// Timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a present but malformed file is an
    /// error.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SITEGRAPH_*` environment overrides.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(
            std::env::var(CACHE_DIR_ENV).ok().as_deref(),
            std::env::var(RETENTION_ENV).ok().as_deref(),
        )
    }

    fn apply_overrides(&mut self, cache_dir: Option<&str>, retention: Option<&str>) -> Result<()> {
        if let Some(dir) = cache_dir.map(str::trim).filter(|d| !d.is_empty()) {
            self.cache.root = PathBuf::from(dir);
        }
        if let Some(policy) = retention.map(str::trim).filter(|p| !p.is_empty()) {
            self.cache.retention = policy.parse()?;
        }
        Ok(())
    }

    /// Reject settings the crawler cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.http.timeout_secs == 0 {
            return Err(Error::Config("http.timeout_secs must be positive".into()));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(Error::Config("http.user_agent must not be empty".into()));
        }
        if self.cache.root.as_os_str().is_empty() {
            return Err(Error::Config("cache.root must not be empty".into()));
        }
        Ok(())
    }
}
