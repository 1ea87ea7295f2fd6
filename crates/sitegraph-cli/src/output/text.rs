//! Human-readable summary.

use colored::Colorize;
use std::fmt::Write as _;

use super::RunReport;

/// Summary block followed by the broken links and orphan pages, if any.
pub fn render(run: &RunReport<'_>) -> String {
    let report = run.report;
    let summary = &report.summary;
    let mut out = String::new();

    let _ = writeln!(out, "{} {}", "Site:".bold(), report.root);
    let _ = writeln!(out, "  Pages:       {}", summary.pages);
    let _ = writeln!(out, "  References:  {}", summary.references);
    let _ = writeln!(out, "  External:    {}", summary.external);
    let _ = writeln!(out, "  Broken:      {}", count(summary.broken));
    let _ = writeln!(out, "  Orphans:     {}", count(summary.orphans));
    let _ = writeln!(
        out,
        "  Requests:    {} GET, {} HEAD ({} sitemaps)",
        run.requests.gets, run.requests.heads, run.sitemaps
    );

    let broken: Vec<_> = report.broken_links().collect();
    if !broken.is_empty() {
        let _ = writeln!(out, "\n{}", "Broken links:".red().bold());
        for row in broken {
            let _ = writeln!(
                out,
                "  {} -> {} \"{}\"",
                row.source_relative_uri,
                row.target_uri.red(),
                row.link_title
            );
        }
    }

    let orphans: Vec<_> = report.orphan_pages().collect();
    if !orphans.is_empty() {
        let _ = writeln!(out, "\n{}", "Not linked from other pages:".yellow().bold());
        for row in orphans {
            let _ = writeln!(out, "  {} ({})", row.target_relative_uri, row.target_title);
        }
    }

    out
}

fn count(n: usize) -> String {
    if n == 0 {
        n.to_string().green().to_string()
    } else {
        n.to_string().yellow().to_string()
    }
}
