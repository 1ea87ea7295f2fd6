#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use std::time::Duration;

#[allow(dead_code)]
pub const CMD_TIMEOUT: Duration = Duration::from_secs(30);

/// Create a `sitegraph` command isolated from the caller's environment.
#[allow(dead_code)]
pub fn sitegraph_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sitegraph"));
    cmd.timeout(CMD_TIMEOUT);
    cmd.env_remove("SITEGRAPH_CACHE_DIR");
    cmd.env_remove("SITEGRAPH_RETENTION");
    cmd.env("NO_COLOR", "1");
    cmd
}

/// A `urlset` listing `pages` below `base`.
#[allow(dead_code)]
pub fn urlset(base: &str, pages: &[&str]) -> String {
    let urls: String = pages
        .iter()
        .map(|p| {
            format!("<url><loc>{base}/{p}</loc><lastmod>2024-01-15T10:30:00+01:00</lastmod></url>")
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{urls}</urlset>"#
    )
}
