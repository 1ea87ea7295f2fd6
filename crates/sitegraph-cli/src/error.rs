//! Semantic exit codes for the CLI.
//!
//! | Code | Category | Meaning |
//! |------|----------|---------|
//! | 0 | Success | Crawl finished and the report was produced |
//! | 1 | Internal | Unexpected failure (I/O, serialization, bugs) |
//! | 2 | Usage | Invalid arguments or configuration |
//! | 5 | Network | A GET or HEAD request failed |
//! | 6 | Content | Unsupported content type or unparsable sitemap |
//!
//! Codes 3 and 4 are left free so scripts written against the broader
//! convention (not found, invalid query) keep their meaning.

use std::fmt;
use std::process::ExitCode;

/// Error category mapped to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Internal or unexpected error.
    Internal = 1,
    /// Invalid arguments or configuration.
    Usage = 2,
    /// A network operation failed.
    Network = 5,
    /// Content the crawler cannot handle.
    Content = 6,
}

impl ErrorCategory {
    /// Get the numeric exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Create an `ExitCode` from this category.
    #[must_use]
    pub fn as_exit_code(self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }

    /// Get a human-readable description of this category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::Network => "network error",
            Self::Content => "unsupported content",
        }
    }

    /// Category for a library error, keyed on [`sitegraph_core::Error::category`].
    #[must_use]
    pub fn from_core(err: &sitegraph_core::Error) -> Self {
        match err.category() {
            "operation_failed" | "network" => Self::Network,
            "unsupported_content" | "parse" => Self::Content,
            "config" | "invalid_url" => Self::Usage,
            _ => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Internal, source)
    }

    /// Create a usage error.
    pub fn usage(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorCategory::Usage, source)
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }

    /// Whether re-running could succeed (timeouts, refused connections).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.source
            .downcast_ref::<sitegraph_core::Error>()
            .is_some_and(sitegraph_core::Error::is_recoverable)
    }

    /// Create an `ExitCode` from this error.
    #[must_use]
    pub fn as_exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_code())
    }
}

impl From<sitegraph_core::Error> for CliError {
    fn from(err: sitegraph_core::Error) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}
