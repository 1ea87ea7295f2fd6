//! Retention-aware content cache with existence probing.
//!
//! [`RetentionCache`] is the only component that talks to the network. For
//! every URI it decides, under the configured [`RetentionPolicy`], whether
//! cached bytes can be reused as they are, must be revalidated with a
//! conditional HEAD, or must be downloaded again:
//!
//! 1. Already fetched this run: return the memoized entry.
//! 2. No artifact on disk: full GET.
//! 3. Artifact inside its trust window: reuse, no request.
//! 4. Otherwise HEAD with `If-Modified-Since`. An unchanged answer renews the
//!    window by touching the file; a changed answer triggers a full GET.
//!
//! The same object answers "does this link target exist" through
//! [`RetentionCache::resolve`], memoizing each verdict for the run. Both paths
//! share one record of HEAD answers so no URI is HEADed twice.

use crate::cache_key::{CacheKeyMapper, resource_id};
use crate::entry::CachedEntry;
use crate::fetcher::{FetchStats, FetchedContent, Fetcher, HeadInfo, NO_CONTENT_TYPE};
use crate::probe::{Existence, ProbeSource};
use crate::{Config, Error, Result, RetentionPolicy};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Media types the crawler can read, with the extension they are stored under.
const SUPPORTED_TYPES: &[(&str, &str)] = &[("text/xml", ".xml"), ("text/html", ".html")];

/// What [`RetentionCache::fetch`] did to produce an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Memoized earlier in this run.
    Memoized,
    /// Cached bytes reused inside the trust window.
    Reused,
    /// Server confirmed the cached bytes; timestamp renewed.
    Revalidated,
    /// Bytes downloaded and written.
    Downloaded,
}

/// Per-run cache over the on-disk artifact store.
#[derive(Debug)]
pub struct RetentionCache {
    fetcher: Fetcher,
    mapper: CacheKeyMapper,
    policy: RetentionPolicy,
    entries: HashMap<String, CachedEntry>,
    existence: HashMap<String, Existence>,
    heads: HashMap<String, HeadInfo>,
}

impl RetentionCache {
    /// Create a cache from configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self::with_fetcher(
            Fetcher::new(config.http.clone()),
            CacheKeyMapper::new(&config.cache.root),
            config.cache.retention,
        )
    }

    /// Create a cache from its parts.
    #[must_use]
    pub fn with_fetcher(fetcher: Fetcher, mapper: CacheKeyMapper, policy: RetentionPolicy) -> Self {
        Self {
            fetcher,
            mapper,
            policy,
            entries: HashMap::new(),
            existence: HashMap::new(),
            heads: HashMap::new(),
        }
    }

    /// Retention policy in force.
    #[must_use]
    pub const fn policy(&self) -> RetentionPolicy {
        self.policy
    }

    /// Key mapper (and thereby the cache root).
    #[must_use]
    pub const fn mapper(&self) -> &CacheKeyMapper {
        &self.mapper
    }

    /// Network requests issued so far.
    #[must_use]
    pub fn stats(&self) -> FetchStats {
        self.fetcher.stats()
    }

    /// Entry fetched earlier in this run, if any.
    #[must_use]
    pub fn entry(&self, uri: &Url) -> Option<&CachedEntry> {
        self.entries.get(&resource_id(uri))
    }

    /// Whether `uri` has been fetched in this run.
    #[must_use]
    pub fn is_fetched(&self, uri: &Url) -> bool {
        self.entries.contains_key(&resource_id(uri))
    }

    /// Memoized existence verdict for `uri`, if one was computed.
    #[must_use]
    pub fn existence(&self, uri: &Url) -> Option<&Existence> {
        self.existence.get(&resource_id(uri))
    }

    /// Return an entry for `uri` holding up-to-date bytes.
    ///
    /// `known_last_modified` is the modification time declared by a sitemap.
    /// When present the trust window is measured against it, otherwise
    /// against the current time.
    pub async fn fetch(
        &mut self,
        uri: &Url,
        known_last_modified: Option<DateTime<Utc>>,
    ) -> Result<&CachedEntry> {
        let id = resource_id(uri);
        if !self.entries.contains_key(&id) {
            let (entry, _) = self.load(uri, known_last_modified).await?;
            self.entries.insert(id.clone(), entry);
        }
        self.entries
            .get(&id)
            .ok_or_else(|| Error::Storage(format!("Entry for {uri} vanished from run memo")))
    }

    /// Like [`fetch`](Self::fetch), also reporting which path was taken.
    pub async fn fetch_traced(
        &mut self,
        uri: &Url,
        known_last_modified: Option<DateTime<Utc>>,
    ) -> Result<(&CachedEntry, FetchOutcome)> {
        let id = resource_id(uri);
        let outcome = if self.entries.contains_key(&id) {
            FetchOutcome::Memoized
        } else {
            let (entry, outcome) = self.load(uri, known_last_modified).await?;
            self.entries.insert(id.clone(), entry);
            outcome
        };
        let entry = self
            .entries
            .get(&id)
            .ok_or_else(|| Error::Storage(format!("Entry for {uri} vanished from run memo")))?;
        Ok((entry, outcome))
    }

    #[instrument(skip(self), fields(uri = %uri, policy = %self.policy))]
    async fn load(
        &mut self,
        uri: &Url,
        known_last_modified: Option<DateTime<Utc>>,
    ) -> Result<(CachedEntry, FetchOutcome)> {
        let key = self.mapper.map(uri)?;
        let mut entry = CachedEntry::new(uri.clone(), key);

        if !entry.exists() {
            debug!("No cached artifact");
            self.download(&mut entry).await?;
            return Ok((entry, FetchOutcome::Downloaded));
        }

        let cached_at = entry.last_write();
        let expiry = cached_at + self.policy.window();
        let compare_to = known_last_modified.unwrap_or_else(Utc::now);

        if self.policy.allows_reuse() && expiry > compare_to {
            debug!(%cached_at, %expiry, "Reusing cached artifact");
            return Ok((entry, FetchOutcome::Reused));
        }

        let head = self.revalidation_head(uri, cached_at).await?;
        let unchanged = head.is_not_modified()
            || (head.is_success() && head.last_modified.is_some_and(|lm| lm <= cached_at));

        if unchanged {
            info!("Not modified, renewing cached artifact");
            entry.touch()?;
            Ok((entry, FetchOutcome::Revalidated))
        } else if head.is_success() {
            info!("Modified on server, downloading again");
            self.download(&mut entry).await?;
            Ok((entry, FetchOutcome::Downloaded))
        } else {
            Err(Error::OperationFailed {
                verb: "HEAD",
                uri: uri.to_string(),
                detail: head.status_line(),
                source: None,
            })
        }
    }

    /// HEAD answer used to revalidate `uri`, reusing one from an earlier probe.
    async fn revalidation_head(&mut self, uri: &Url, cached_at: DateTime<Utc>) -> Result<HeadInfo> {
        let id = resource_id(uri);
        if let Some(head) = self.heads.get(&id) {
            debug!(status = head.status, "Reusing HEAD answer from existence probe");
            return Ok(*head);
        }
        let head = self.fetcher.head(uri, Some(cached_at)).await?;
        self.heads.insert(id, head);
        Ok(head)
    }

    async fn download(&self, entry: &mut CachedEntry) -> Result<()> {
        let content = self.fetcher.get(entry.uri()).await?;
        let extension = extension_for(entry.uri(), &content)?;
        entry.set_extension(extension)?;
        entry.write(&content.body)
    }

    /// Whether `uri` resolves, computed at most once per run.
    ///
    /// A transport failure while probing is recorded as unreachable rather
    /// than returned: a dead link is data for the report, not a crawl error.
    #[instrument(skip(self), fields(uri = %uri))]
    pub async fn resolve(&mut self, uri: &Url) -> Result<bool> {
        let id = resource_id(uri);
        if let Some(known) = self.existence.get(&id) {
            return Ok(known.reachable());
        }

        let verdict = if self.entries.contains_key(&id) {
            Existence::new(uri.clone(), true, ProbeSource::AlreadyFetched)
        } else if let Some(by_scheme) = Existence::from_scheme(uri) {
            by_scheme
        } else {
            let reachable = match self.fetcher.head(uri, None).await {
                Ok(head) => {
                    self.heads.insert(id.clone(), head);
                    head.is_success()
                },
                Err(err @ Error::OperationFailed { .. }) => {
                    warn!("Probe failed, treating as unreachable: {err}");
                    false
                },
                Err(err) => return Err(err),
            };
            Existence::new(uri.clone(), reachable, ProbeSource::Network)
        };

        debug!(
            target = %verdict.uri(),
            reachable = verdict.reachable(),
            source = ?verdict.source(),
            "Existence resolved"
        );
        let reachable = verdict.reachable();
        self.existence.insert(id, verdict);
        Ok(reachable)
    }

    /// Release pooled network clients at the end of a run.
    pub fn close(&self) {
        let pool = self.fetcher.pool();
        debug!(idle = pool.idle_count(), "Closing cache");
        pool.clear();
    }
}

fn extension_for(uri: &Url, content: &FetchedContent) -> Result<&'static str> {
    let media = content.media_type().unwrap_or_default();
    SUPPORTED_TYPES
        .iter()
        .find(|(supported, _)| *supported == media)
        .map(|(_, ext)| *ext)
        .ok_or_else(|| Error::UnsupportedContentType {
            uri: uri.to_string(),
            content_type: content
                .content_type
                .clone()
                .unwrap_or_else(|| NO_CONTENT_TYPE.to_string()),
        })
}
