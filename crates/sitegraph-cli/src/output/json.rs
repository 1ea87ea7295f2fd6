//! JSON rendering.

use anyhow::Result;

use super::RunReport;

/// Pretty-printed JSON for `run`, with a trailing newline.
pub fn render(run: &RunReport<'_>) -> Result<String> {
    let mut out = serde_json::to_string_pretty(run)?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sitegraph_core::{FetchStats, PageGraph, SiteReport};
    use url::Url;

    #[test]
    fn test_report_fields_are_flattened() {
        let root = Url::parse("https://ex.org/").unwrap();
        let mut graph = PageGraph::new();
        graph.add_page(Url::parse("https://ex.org/a.html").unwrap(), "a", None);
        let report = SiteReport::build(&graph, &root);
        let run = RunReport {
            report: &report,
            requests: FetchStats { gets: 2, heads: 0 },
            sitemaps: 1,
        };

        let value: serde_json::Value = serde_json::from_str(&render(&run).unwrap()).unwrap();
        assert_eq!(value["root"], "https://ex.org/");
        assert_eq!(value["summary"]["pages"], 1);
        assert_eq!(value["summary"]["orphans"], 1);
        assert_eq!(value["requests"]["gets"], 2);
        assert_eq!(value["links"][0]["link_kind"], "Missing");
        assert_eq!(value["pages"][0]["path_parts"][0], "a.html");
    }
}
