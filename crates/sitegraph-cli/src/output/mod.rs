//! # Output Formatting
//!
//! The report of a finished crawl is rendered either for a terminal
//! ([`text`]) or as a single JSON document ([`json`]). Both renderers work
//! from the same [`RunReport`], so the formats never disagree about counts.

pub mod json;
pub mod text;

use serde::Serialize;
use sitegraph_core::{FetchStats, SiteReport};

/// Output format for stdout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary (default)
    Text,
    /// The full report as one JSON object
    Json,
}

/// Everything a renderer needs about one run.
#[derive(Debug, Serialize)]
pub struct RunReport<'a> {
    /// Report tables and totals
    #[serde(flatten)]
    pub report: &'a SiteReport,
    /// Requests issued during the run
    pub requests: FetchStats,
    /// Distinct sitemaps read
    pub sitemaps: usize,
}

impl OutputFormat {
    /// Render `run` in this format.
    pub fn render(self, run: &RunReport<'_>) -> anyhow::Result<String> {
        match self {
            Self::Text => Ok(text::render(run)),
            Self::Json => json::render(run),
        }
    }
}
