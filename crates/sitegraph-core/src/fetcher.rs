use crate::config::HttpConfig;
use crate::pool::ClientPool;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, IF_MODIFIED_SINCE, LAST_MODIFIED};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};
use url::Url;

/// Placeholder used in errors when a response carried no `Content-Type`.
pub const NO_CONTENT_TYPE: &str = "<none>";

/// HTTP client for full downloads and conditional header checks.
///
/// Requests go through a [`ClientPool`] so every host keeps a single
/// persistent client for the whole crawl.
#[derive(Debug)]
pub struct Fetcher {
    pool: ClientPool,
    gets: AtomicU64,
    heads: AtomicU64,
}

impl Fetcher {
    /// Creates a fetcher whose pooled clients use `settings`.
    #[must_use]
    pub fn new(settings: HttpConfig) -> Self {
        Self {
            pool: ClientPool::new(settings),
            gets: AtomicU64::new(0),
            heads: AtomicU64::new(0),
        }
    }

    /// Client pool backing this fetcher.
    #[must_use]
    pub const fn pool(&self) -> &ClientPool {
        &self.pool
    }

    /// Downloads `url` in full.
    ///
    /// Transport failures and non-success statuses are reported as
    /// [`Error::OperationFailed`] with verb `GET`.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get(&self, url: &Url) -> Result<FetchedContent> {
        let client = self.pool.acquire(url)?;
        self.gets.fetch_add(1, Ordering::Relaxed);

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| transport_failure("GET", url, e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(Error::OperationFailed {
                verb: "GET",
                uri: url.to_string(),
                detail: status.to_string(),
                source: None,
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(std::string::ToString::to_string);
        let last_modified = last_modified(response.headers());

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_failure("GET", url, e))?
            .to_vec();

        info!("Fetched {} bytes from {}", body.len(), url);

        Ok(FetchedContent {
            content_type,
            body,
            last_modified,
        })
    }

    /// Sends a HEAD request for `url`, conditional on `if_modified_since`.
    ///
    /// Only transport failures are errors; the status is handed back so the
    /// caller can decide what a non-success answer means.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn head(
        &self,
        url: &Url,
        if_modified_since: Option<DateTime<Utc>>,
    ) -> Result<HeadInfo> {
        let client = self.pool.acquire(url)?;
        self.heads.fetch_add(1, Ordering::Relaxed);

        let mut request = client.head(url.clone());
        if let Some(since) = if_modified_since {
            let value = format_http_date(since);
            debug!("Setting If-Modified-Since: {}", value);
            request = request.header(IF_MODIFIED_SINCE, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport_failure("HEAD", url, e))?;

        let info = HeadInfo {
            status: response.status().as_u16(),
            last_modified: last_modified(response.headers()),
        };
        debug!(status = info.status, "HEAD answered");
        Ok(info)
    }

    /// Requests issued so far.
    #[must_use]
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            gets: self.gets.load(Ordering::Relaxed),
            heads: self.heads.load(Ordering::Relaxed),
        }
    }
}

/// Body and metadata of a successful GET.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    /// Raw `Content-Type` header value, if present
    pub content_type: Option<String>,
    /// Response body
    pub body: Vec<u8>,
    /// Parsed `Last-Modified` header, if present and valid
    pub last_modified: Option<DateTime<Utc>>,
}

impl FetchedContent {
    /// Media type without parameters, lowercased (`text/html`).
    #[must_use]
    pub fn media_type(&self) -> Option<String> {
        self.content_type.as_deref().map(media_type)
    }
}

/// Metadata from a HEAD request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadInfo {
    /// HTTP status code returned by the server (e.g., 200, 304, 404)
    pub status: u16,
    /// Parsed `Last-Modified` header, if present and valid
    pub last_modified: Option<DateTime<Utc>>,
}

impl HeadInfo {
    /// Whether the server answered with a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        StatusCode::from_u16(self.status).is_ok_and(|s| s.is_success())
    }

    /// Whether the server answered `304 Not Modified`.
    #[must_use]
    pub const fn is_not_modified(&self) -> bool {
        self.status == StatusCode::NOT_MODIFIED.as_u16()
    }

    /// Status rendered with its canonical reason (`404 Not Found`).
    #[must_use]
    pub fn status_line(&self) -> String {
        StatusCode::from_u16(self.status)
            .map_or_else(|_| self.status.to_string(), |s| s.to_string())
    }
}

/// Count of network requests issued by a [`Fetcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    /// Full content downloads
    pub gets: u64,
    /// Header-only checks (revalidation and existence probes)
    pub heads: u64,
}

/// Strip parameters from a `Content-Type` value and lowercase it.
#[must_use]
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Format a timestamp as an RFC 1123 HTTP date.
#[must_use]
pub fn format_http_date(when: DateTime<Utc>) -> String {
    when.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse an RFC 1123 HTTP date.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn last_modified(headers: &HeaderMap) -> Option<DateTime<Utc>> {
    headers
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_http_date)
}

fn transport_failure(verb: &'static str, url: &Url, err: reqwest::Error) -> Error {
    Error::OperationFailed {
        verb,
        uri: url.to_string(),
        detail: err.to_string(),
        source: Some(err),
    }
}
