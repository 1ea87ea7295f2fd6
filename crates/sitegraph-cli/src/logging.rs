//! Logging initialization and color control.

use anyhow::Result;
use colored::control as color_control;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;
use crate::output::OutputFormat;

/// Level selected by the verbosity flags.
///
/// JSON on stdout is meant for other programs, so anything below ERROR is
/// suppressed unless verbose output was asked for.
pub const fn level_for(cli: &Cli) -> Level {
    if cli.verbose {
        Level::DEBUG
    } else if cli.quiet || matches!(cli.format, OutputFormat::Json) {
        Level::ERROR
    } else {
        Level::WARN
    }
}

/// Install the global subscriber (writing to stderr) and apply color settings.
///
/// # Errors
///
/// Returns an error if the global tracing subscriber cannot be set.
pub fn initialize_logging(cli: &Cli) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_for(cli))
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let env_no_color = std::env::var_os("NO_COLOR").is_some();
    if cli.no_color || env_no_color || matches!(cli.format, OutputFormat::Json) {
        color_control::set_override(false);
    }
    Ok(())
}
