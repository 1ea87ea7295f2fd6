//! The crawl command: resolve configuration, run the crawler, emit the report.

use anyhow::{Context, anyhow};
use sitegraph_core::report::report_file_stem;
use sitegraph_core::{Config, Crawler, SiteReport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::RunReport;

/// Cache directory below `--output-dir` when nothing else names one.
const CACHE_SUBDIR: &str = "cache";

/// Build the effective configuration from file, environment and flags.
///
/// Later sources win: config file (or defaults), `<output-dir>/cache` when no
/// file was given, `SITEGRAPH_*` environment, then explicit flags.
pub fn resolve_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = match &cli.config {
        Some(path) => {
            if !path.is_file() {
                return Err(CliError::usage(anyhow!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            Config::load_from(path)?
        },
        None => {
            let mut config = Config::default();
            if let Some(dir) = &cli.output_dir {
                config.cache.root = dir.join(CACHE_SUBDIR);
            }
            config
        },
    };

    config.apply_env()?;
    if let Some(dir) = &cli.cache_dir {
        config.cache.root.clone_from(dir);
    }
    if let Some(policy) = cli.retention_policy {
        config.cache.retention = policy;
    }
    config.validate()?;
    Ok(config)
}

/// Run a crawl for `cli` and print the report to stdout.
pub async fn execute(cli: &Cli) -> Result<(), CliError> {
    let config = resolve_config(cli)?;
    info!(
        cache = %config.cache.root.display(),
        retention = %config.cache.retention,
        "Starting crawl"
    );

    let outcome = Crawler::new(&config)?.run(&cli.sitemaps).await?;
    let root = outcome
        .root
        .as_ref()
        .ok_or_else(|| CliError::usage(anyhow!("No sitemap given")))?;

    let report = SiteReport::build(&outcome.graph, root);
    let run = RunReport {
        report: &report,
        requests: outcome.stats,
        sitemaps: outcome.sitemaps,
    };

    if let Some(dir) = &cli.output_dir {
        write_report(&dir.join(format!("{}.json", report_file_stem(root))), &run)?;
    }
    if let Some(path) = &cli.report {
        write_report(path, &run)?;
    }

    let rendered = cli.format.render(&run).map_err(CliError::internal)?;
    print!("{rendered}");
    Ok(())
}

/// Write `run` as JSON to `path`, moving an existing file to `<path>.bak`.
pub fn write_report(path: &Path, run: &RunReport<'_>) -> Result<(), CliError> {
    write_report_inner(path, run).map_err(CliError::internal)
}

fn write_report_inner(path: &Path, run: &RunReport<'_>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    if path.exists() {
        let backup = backup_path(path);
        if backup.exists() {
            fs::remove_file(&backup)
                .with_context(|| format!("Failed to remove {}", backup.display()))?;
        }
        fs::rename(path, &backup)
            .with_context(|| format!("Failed to back up {}", path.display()))?;
        debug!(backup = %backup.display(), "Kept previous report");
    }

    let json = serde_json::to_string_pretty(run)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "Report written");
    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}
