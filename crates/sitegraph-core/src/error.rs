//! Error types and handling for sitegraph-core operations.
//!
//! A crawl either produces a complete page graph or stops at the first failure
//! it cannot represent as data. Per-link and per-sitemap-entry anomalies (a
//! missing `href`, a broken target, a malformed `lastmod`) never surface here;
//! they are absorbed by the component that meets them and show up in the graph
//! or the logs instead.
//!
//! ## Error Categories
//!
//! - **Operation failures**: a GET or HEAD that failed in transport or returned
//!   a non-success status while content was required
//! - **Content errors**: a response whose media type the crawler cannot read
//! - **I/O and storage errors**: the on-disk cache could not be read or written
//! - **Parse errors**: sitemap XML that cannot be read at all
//! - **Configuration errors**: invalid settings or config files
//!
//! ```rust
//! use sitegraph_core::Error;
//!
//! let err = Error::OperationFailed {
//!     verb: "GET",
//!     uri: "https://example.org/a.html".to_string(),
//!     detail: "503 Service Unavailable".to_string(),
//!     source: None,
//! };
//! assert_eq!(err.category(), "operation_failed");
//! assert_eq!(err.to_string(), "GET https://example.org/a.html: 503 Service Unavailable");
//! ```

use thiserror::Error;

/// The main error type for sitegraph-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Covers reads of cached artifacts and directory creation under the
    /// cache root.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be constructed.
    ///
    /// Request failures are reported as [`Error::OperationFailed`] so they
    /// always carry the verb and URI; this variant only wraps builder errors.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A network operation the crawl depends on failed.
    ///
    /// Raised for transport errors and for non-success statuses on a GET, or
    /// on a HEAD issued to revalidate cached content. Not retried.
    #[error("{verb} {uri}: {detail}")]
    OperationFailed {
        /// HTTP verb of the failed request (`GET` or `HEAD`).
        verb: &'static str,
        /// Absolute URI the request was sent to.
        uri: String,
        /// Status line or transport error message.
        detail: String,
        /// Underlying client error, when the failure was a transport error.
        #[source]
        source: Option<reqwest::Error>,
    },

    /// The server answered with a media type the crawler cannot read.
    ///
    /// Only `text/xml` (sitemaps) and `text/html` (pages) are understood.
    #[error("Unsupported content type '{content_type}' for {uri}")]
    UnsupportedContentType {
        /// URI whose response carried the content type.
        uri: String,
        /// The media type as sent by the server, or `<none>` when absent.
        content_type: String,
    },

    /// Sitemap or document content could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Cache storage invariant violated or storage operation failed.
    ///
    /// ## Common Causes
    ///
    /// - An entry's extension was already fixed to a different value
    /// - The atomic rename of a freshly written artifact failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// URL is malformed or cannot be used as a cache key.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// A page's outgoing references were requested to be built twice.
    #[error("Page already parsed: {0}")]
    AlreadyParsed(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

impl Error {
    /// Check if the error might be recoverable through retry logic.
    ///
    /// The crawler itself never retries; callers embedding the core can use
    /// this to decide whether re-running a crawl is worthwhile.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::OperationFailed {
                source: Some(e), ..
            } => e.is_timeout() || e.is_connect(),
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }

    /// Get the error category as a string identifier.
    ///
    /// Used as a structured logging field and by the CLI to pick an exit code.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::OperationFailed { .. } => "operation_failed",
            Self::UnsupportedContentType { .. } => "unsupported_content",
            Self::Parse(_) => "parse",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::InvalidUrl(_) => "invalid_url",
            Self::AlreadyParsed(_) => "already_parsed",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Convenience type alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::panic, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_operation_failed_names_verb_and_uri() {
        let err = Error::OperationFailed {
            verb: "HEAD",
            uri: "https://example.org/page.html".to_string(),
            detail: "404 Not Found".to_string(),
            source: None,
        };

        let msg = err.to_string();
        assert!(msg.starts_with("HEAD "));
        assert!(msg.contains("https://example.org/page.html"));
        assert!(msg.contains("404"));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_unsupported_content_type_display() {
        let err = Error::UnsupportedContentType {
            uri: "https://example.org/doc.pdf".to_string(),
            content_type: "application/pdf".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported content type 'application/pdf' for https://example.org/doc.pdf"
        );
        assert_eq!(err.category(), "unsupported_content");
    }

    #[test]
    fn test_error_categories() {
        let cases = vec![
            (Error::Io(io::Error::other("test")), "io"),
            (Error::Parse("test".to_string()), "parse"),
            (Error::Storage("test".to_string()), "storage"),
            (Error::Config("test".to_string()), "config"),
            (Error::InvalidUrl("test".to_string()), "invalid_url"),
            (Error::AlreadyParsed("test".to_string()), "already_parsed"),
            (Error::Serialization("test".to_string()), "serialization"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.category(), expected);
        }
    }

    #[test]
    fn test_io_recoverability() {
        assert!(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "slow")).is_recoverable());
        assert!(Error::Io(io::Error::new(io::ErrorKind::Interrupted, "intr")).is_recoverable());
        assert!(!Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).is_recoverable());
        assert!(!Error::Parse("bad xml".to_string()).is_recoverable());
    }

    #[test]
    fn test_url_parse_error_converts() {
        let err: Error = url::Url::parse("::not a url").unwrap_err().into();
        match err {
            Error::InvalidUrl(msg) => assert!(!msg.is_empty()),
            other => panic!("expected InvalidUrl, got {other:?}"),
        }
    }
}
