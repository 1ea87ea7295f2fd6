//! # CLI Structure and Argument Parsing
//!
//! `sitegraph` has a single operation: crawl the sites behind one or more
//! sitemaps and report the link graph between their pages.
//!
//! ```bash
//! # Crawl with the default one-day cache window, text summary on stdout
//! sitegraph --sitemap https://example.org/sitemap.xml
//!
//! # Always revalidate, keep cache and report next to each other
//! sitegraph --sitemap https://example.org/sitemap.xml \
//!     --retention-policy no-cache --output-dir ./out
//!
//! # Machine-readable report
//! sitegraph --sitemap https://example.org/sitemap.xml --format json | jq .summary
//! ```
//!
//! ## Cache location
//!
//! The cache root is chosen in this order: `--cache-dir`, the
//! `SITEGRAPH_CACHE_DIR` environment variable, the `[cache] root` of an
//! explicit `--config` file, `<output-dir>/cache`, and finally the platform
//! cache directory.

use clap::Parser;
use sitegraph_core::RetentionPolicy;
use std::path::PathBuf;
use url::Url;

use crate::output::OutputFormat;

/// Command line of the `sitegraph` binary.
#[derive(Parser, Clone, Debug)]
#[command(name = "sitegraph")]
#[command(version)]
#[command(about = "Crawl a website from its sitemaps and report the links between its pages")]
pub struct Cli {
    /// Sitemap or sitemap index to start from (repeatable)
    #[arg(long = "sitemap", value_name = "URI", required = true)]
    pub sitemaps: Vec<Url>,

    /// Directory that receives the JSON report and, by default, the cache
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Cache directory, overriding configuration and environment
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// How long cached content is trusted: no-cache, hour, day or week
    #[arg(long, value_name = "POLICY")]
    pub retention_policy: Option<RetentionPolicy>,

    /// Configuration file (TOML)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format for stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the JSON report to this file
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sitemap_is_repeatable() {
        let cli = Cli::try_parse_from([
            "sitegraph",
            "--sitemap",
            "https://ex.org/a.xml",
            "--sitemap",
            "https://ex.org/b.xml",
        ])
        .unwrap();

        assert_eq!(cli.sitemaps.len(), 2);
        assert!(cli.retention_policy.is_none());
        assert!(matches!(cli.format, OutputFormat::Text));
    }

    #[test]
    fn test_sitemap_is_required() {
        let err = Cli::try_parse_from(["sitegraph"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_retention_policy_parses() {
        let cli = Cli::try_parse_from([
            "sitegraph",
            "--sitemap",
            "https://ex.org/sitemap.xml",
            "--retention-policy",
            "no-cache",
        ])
        .unwrap();
        assert_eq!(cli.retention_policy, Some(RetentionPolicy::NoCache));

        assert!(
            Cli::try_parse_from([
                "sitegraph",
                "--sitemap",
                "https://ex.org/sitemap.xml",
                "--retention-policy",
                "fortnight",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_invalid_sitemap_uri_is_rejected() {
        assert!(Cli::try_parse_from(["sitegraph", "--sitemap", "not a uri"]).is_err());
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let err = Cli::try_parse_from([
            "sitegraph",
            "--sitemap",
            "https://ex.org/sitemap.xml",
            "-v",
            "-q",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }
}
