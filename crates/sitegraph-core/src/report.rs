//! Report rows derived from a finished page graph.
//!
//! The report is plain data: three tables that a renderer can print, write
//! as JSON or turn into a spreadsheet.
//!
//! - **Pages**: one row per sitemap page with its incoming reference count
//! - **Page links**: distinct links between two different sitemap pages
//! - **All links**: one row per reference, plus a row for every page nothing
//!   links to

use crate::graph::{PageGraph, PageId, Reference};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Relative URI shown for targets outside the site root.
pub const EXTERNAL: &str = "<External>";
/// Comment on references whose target did not resolve.
pub const COMMENT_BROKEN: &str = "Link does not exist";
/// Comment on references to URIs outside the sitemaps.
pub const COMMENT_EXTERNAL: &str = "To External";
/// Comment on the row emitted for a page without incoming references.
pub const COMMENT_ORPHAN: &str = "Not linked from other pages";
/// Link kind shown on orphan rows.
pub const KIND_MISSING: &str = "Missing";

/// One sitemap page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRow {
    /// Non-empty path segments of the page URI
    pub path_parts: Vec<String>,
    /// Page title
    pub title: String,
    /// Absolute page URI
    pub uri: String,
    /// Incoming references from sitemap pages
    pub references: usize,
}

/// A link between two different sitemap pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinkRow {
    /// Source page title
    pub source_title: String,
    /// Source page URI
    pub source_uri: String,
    /// Link kind label
    pub link_kind: String,
    /// Target page title
    pub target_title: String,
    /// Target page URI
    pub target_uri: String,
}

/// One reference, or a marker for a page nothing links to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRow {
    /// Source page title (empty on orphan rows)
    pub source_title: String,
    /// Source URI relative to the site root
    pub source_relative_uri: String,
    /// Absolute source URI (empty on orphan rows)
    pub source_uri: String,
    /// Visible link text
    pub link_title: String,
    /// Link kind label, `Missing` on orphan rows
    pub link_kind: String,
    /// Broken, external or orphan marker; empty for healthy internal links
    pub comment: String,
    /// Target page title, or the link text when the target is not a page
    pub target_title: String,
    /// Target URI relative to the site root
    pub target_relative_uri: String,
    /// Absolute target URI
    pub target_uri: String,
}

/// Totals for a quick overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Sitemap pages
    pub pages: usize,
    /// References across all pages
    pub references: usize,
    /// References whose target did not resolve
    pub broken: usize,
    /// Resolving references to URIs outside the sitemaps
    pub external: usize,
    /// Pages without incoming references
    pub orphans: usize,
}

/// The three report tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteReport {
    /// Site root relative URIs are computed against
    pub root: String,
    /// Totals
    pub summary: ReportSummary,
    /// Pages table
    pub pages: Vec<PageRow>,
    /// Page links table
    pub page_links: Vec<PageLinkRow>,
    /// All links table
    pub links: Vec<LinkRow>,
}

impl SiteReport {
    /// Build the report for `graph` with URIs made relative to `root`.
    #[must_use]
    pub fn build(graph: &PageGraph, root: &Url) -> Self {
        let pages = graph
            .pages()
            .map(|(_, page)| PageRow {
                path_parts: page
                    .uri()
                    .path_segments()
                    .map(|segments| {
                        segments
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default(),
                title: page.title().to_string(),
                uri: page.uri().to_string(),
                references: page.reference_count(),
            })
            .collect();

        let mut seen: HashSet<(PageId, PageId, String)> = HashSet::new();
        let mut page_links = Vec::new();
        for (_, reference) in graph.references() {
            let Some(target) = reference.target_page else {
                continue;
            };
            if target == reference.source {
                continue;
            }
            let kind = reference.kind.label().to_string();
            if !seen.insert((reference.source, target, kind.clone())) {
                continue;
            }
            let source = graph.page(reference.source);
            let target = graph.page(target);
            page_links.push(PageLinkRow {
                source_title: source.title().to_string(),
                source_uri: source.uri().to_string(),
                link_kind: kind,
                target_title: target.title().to_string(),
                target_uri: target.uri().to_string(),
            });
        }

        let mut links = Vec::new();
        for (_, page) in graph.pages() {
            if page.reference_count() == 0 {
                links.push(LinkRow {
                    source_title: String::new(),
                    source_relative_uri: String::new(),
                    source_uri: String::new(),
                    link_title: String::new(),
                    link_kind: KIND_MISSING.to_string(),
                    comment: COMMENT_ORPHAN.to_string(),
                    target_title: page.title().to_string(),
                    target_relative_uri: relative_uri(root, page.uri()),
                    target_uri: page.uri().to_string(),
                });
            }
            for id in page.outgoing() {
                links.push(link_row(graph, root, graph.reference(*id)));
            }
        }

        let summary = ReportSummary {
            pages: graph.len(),
            references: graph.reference_total(),
            broken: graph.references().filter(|(_, r)| !r.reachable).count(),
            external: graph
                .references()
                .filter(|(_, r)| r.reachable && !r.has_target_page())
                .count(),
            orphans: graph
                .pages()
                .filter(|(_, p)| p.reference_count() == 0)
                .count(),
        };

        Self {
            root: root.to_string(),
            summary,
            pages,
            page_links,
            links,
        }
    }

    /// Rows of references whose target did not resolve.
    pub fn broken_links(&self) -> impl Iterator<Item = &LinkRow> {
        self.links.iter().filter(|r| r.comment == COMMENT_BROKEN)
    }

    /// Rows of pages nothing links to.
    pub fn orphan_pages(&self) -> impl Iterator<Item = &LinkRow> {
        self.links.iter().filter(|r| r.comment == COMMENT_ORPHAN)
    }
}

fn link_row(graph: &PageGraph, root: &Url, reference: &Reference) -> LinkRow {
    let source = graph.page(reference.source);
    let comment = if !reference.reachable {
        COMMENT_BROKEN
    } else if !reference.has_target_page() {
        COMMENT_EXTERNAL
    } else {
        ""
    };
    let target_title = reference.target_page.map_or_else(
        || reference.text.clone(),
        |id| graph.page(id).title().to_string(),
    );

    LinkRow {
        source_title: source.title().to_string(),
        source_relative_uri: relative_uri(root, source.uri()),
        source_uri: source.uri().to_string(),
        link_title: reference.text.clone(),
        link_kind: reference.kind.label().to_string(),
        comment: comment.to_string(),
        target_title,
        target_relative_uri: relative_uri(root, &reference.target),
        target_uri: reference.target.to_string(),
    }
}

/// `uri` relative to `root`: `/` for the root itself, [`EXTERNAL`] outside it.
#[must_use]
pub fn relative_uri(root: &Url, uri: &Url) -> String {
    let root = root.as_str();
    let full = uri.as_str();
    match full.get(..root.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(root) => {
            let rest = full[root.len()..].trim_matches('/');
            if rest.is_empty() {
                "/".to_string()
            } else {
                rest.to_string()
            }
        },
        _ => EXTERNAL.to_string(),
    }
}

/// File name stem for a report about the site at `root` (`ex.org.docs`).
#[must_use]
pub fn report_file_stem(root: &Url) -> String {
    let host = root.host_str().unwrap_or("site");
    let mut path = root.path().replace('/', ".");
    while path.contains("..") {
        path = path.replace("..", ".");
    }
    let path = path.trim_matches('.');
    if path.is_empty() {
        host.to_string()
    } else {
        format!("{host}.{path}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::classify::LinkKind;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn reference(
        graph: &PageGraph,
        source: PageId,
        text: &str,
        target: &str,
        reachable: bool,
        kind: LinkKind,
    ) -> Reference {
        let target = url(target);
        Reference {
            source,
            text: text.to_string(),
            target_page: graph.find(&target),
            target,
            reachable,
            kind,
        }
    }

    fn sample() -> PageGraph {
        let mut graph = PageGraph::new();
        let a = graph.add_page(url("https://ex.org/a.html"), "a", None);
        let b = graph.add_page(url("https://ex.org/docs/b.html"), "b", None);
        graph.set_title(a, "Home");

        let refs = [
            reference(&graph, a, "Next", "https://ex.org/docs/b.html", true, LinkKind::Regular),
            reference(&graph, a, "Also next", "https://ex.org/docs/b.html", true, LinkKind::Regular),
            reference(&graph, a, "Menu next", "https://ex.org/docs/b.html", true, LinkKind::Menu),
            reference(&graph, a, "Self", "https://ex.org/a.html", true, LinkKind::Menu),
            reference(&graph, a, "Ext", "https://external.com/", true, LinkKind::Regular),
            reference(&graph, b, "Dead", "https://ex.org/gone.html", false, LinkKind::Regular),
        ];
        for r in refs {
            graph.insert_reference(r);
        }
        graph
    }

    #[test]
    fn test_relative_uri() {
        let root = url("https://ex.org/");
        assert_eq!(relative_uri(&root, &url("https://ex.org/")), "/");
        assert_eq!(relative_uri(&root, &url("https://ex.org/docs/b.html")), "docs/b.html");
        assert_eq!(relative_uri(&root, &url("https://EX.org/docs/")), "docs");
        assert_eq!(relative_uri(&root, &url("https://other.org/x")), EXTERNAL);
        assert_eq!(relative_uri(&root, &url("mailto:a@ex.org")), EXTERNAL);
    }

    #[test]
    fn test_report_file_stem() {
        assert_eq!(report_file_stem(&url("https://ex.org/")), "ex.org");
        assert_eq!(report_file_stem(&url("https://ex.org/nl/site/")), "ex.org.nl.site");
    }

    #[test]
    fn test_pages_table() {
        let report = SiteReport::build(&sample(), &url("https://ex.org/"));
        assert_eq!(report.pages.len(), 2);
        assert_eq!(report.pages[0].title, "Home");
        assert_eq!(report.pages[0].references, 1);
        assert_eq!(report.pages[1].path_parts, vec!["docs", "b.html"]);
        assert_eq!(report.pages[1].references, 3);
    }

    #[test]
    fn test_page_links_are_distinct_and_skip_self() {
        let report = SiteReport::build(&sample(), &url("https://ex.org/"));
        let kinds: Vec<&str> = report.page_links.iter().map(|r| r.link_kind.as_str()).collect();
        assert_eq!(kinds, vec!["Regular", "Menu"]);
        assert!(report.page_links.iter().all(|r| r.source_uri != r.target_uri));
    }

    #[test]
    fn test_link_comments() {
        let report = SiteReport::build(&sample(), &url("https://ex.org/"));
        let by_text = |t: &str| report.links.iter().find(|r| r.link_title == t).unwrap();

        assert_eq!(by_text("Next").comment, "");
        assert_eq!(by_text("Next").target_title, "b");
        assert_eq!(by_text("Ext").comment, COMMENT_EXTERNAL);
        assert_eq!(by_text("Ext").target_title, "Ext");
        assert_eq!(by_text("Ext").target_relative_uri, EXTERNAL);
        assert_eq!(by_text("Dead").comment, COMMENT_BROKEN);
        assert_eq!(by_text("Dead").source_relative_uri, "docs/b.html");
    }

    #[test]
    fn test_summary_and_orphans() {
        let mut graph = sample();
        graph.add_page(url("https://ex.org/lonely.html"), "lonely", None);
        let report = SiteReport::build(&graph, &url("https://ex.org/"));

        assert_eq!(
            report.summary,
            ReportSummary {
                pages: 3,
                references: 6,
                broken: 1,
                external: 1,
                orphans: 1,
            }
        );
        let orphans: Vec<&str> = report.orphan_pages().map(|r| r.target_title.as_str()).collect();
        assert_eq!(orphans, vec!["lonely"]);
        assert_eq!(report.broken_links().count(), 1);
        assert_eq!(report.links.len(), 7);
    }
}
