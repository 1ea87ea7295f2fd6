//! sitegraph CLI - crawl a website from its sitemaps and report its link graph
//!
//! This is the main entry point for the `sitegraph` command-line interface.
//! Failures are printed to stderr and mapped to semantic exit codes (see
//! [`error`]).

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use cli::Cli;
use error::ErrorCategory;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::initialize_logging(&cli) {
        eprintln!("{} {e:#}", "error:".red().bold());
        return ErrorCategory::Internal.as_exit_code();
    }

    match commands::execute(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(category = %err.category, "Crawl failed");
            eprintln!("{} {err}", "error:".red().bold());
            if err.is_transient() {
                eprintln!("{}", "The failure looks transient; running again may succeed.".yellow());
            }
            err.as_exit_code()
        },
    }
}
