//! Link extraction from cached HTML pages.
//!
//! Extraction runs in two steps. [`parse_document`] is synchronous: it parses
//! the HTML, reads the title and collects every anchor with its resolved
//! target, visible text and [`LinkKind`]. [`LinkExtractor::extract`] then
//! deduplicates the anchors, asks the cache whether each target resolves and
//! records the references in the [`PageGraph`]. Keeping the parsed DOM out of
//! the async step means it is never held across a network request.

use crate::cache::RetentionCache;
use crate::classify::{LinkKind, classify};
use crate::graph::{PageGraph, PageId, Reference};
use crate::Result;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, instrument, warn};
use url::Url;

/// Text used for image links without `title` or `alt`.
pub const IMAGE_PLACEHOLDER: &str = "image";

/// SAFETY: Selectors are compile-time constants that are known to be valid.
#[allow(clippy::unwrap_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
#[allow(clippy::unwrap_used)]
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title").unwrap());

/// An anchor found in a document, before reachability is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLink {
    /// Visible text after the fallback chain
    pub text: String,
    /// Absolute target
    pub target: Url,
    /// Structural origin
    pub kind: LinkKind,
}

/// Title and anchors of one HTML document.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// Trimmed `<title>` text, if present and non-empty
    pub title: Option<String>,
    /// Anchors with an `href`, in document order
    pub links: Vec<RawLink>,
}

/// Parse `html` served from `page_uri`.
///
/// Anchors without `href`, or whose `href` cannot be resolved against the
/// page, are skipped.
pub fn parse_document(html: &str, page_uri: &Url) -> ParsedDocument {
    let document = Html::parse_document(html);

    let title = document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let links = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            let target = resolve_href(href, page_uri)?;
            Some(RawLink {
                text: link_text(anchor),
                target,
                kind: classify(anchor),
            })
        })
        .collect();

    ParsedDocument { title, links }
}

fn resolve_href(href: &str, page_uri: &Url) -> Option<Url> {
    let href = href.trim();
    Url::parse(href)
        .or_else(|_| page_uri.join(href))
        .map_err(|e| warn!(href, page = %page_uri, "Skipping unresolvable link: {e}"))
        .ok()
}

/// Visible text of an anchor.
///
/// Tried in order: rendered text, the anchor's own text nodes, a child
/// `span`'s class, a child `img`'s `title` or `alt` (or [`IMAGE_PLACEHOLDER`]),
/// and finally the raw inner markup.
pub fn link_text(anchor: ElementRef<'_>) -> String {
    let rendered = anchor.text().collect::<String>();
    if let Some(text) = non_empty(&rendered) {
        return text;
    }

    let direct: String = anchor
        .children()
        .filter_map(|node| node.value().as_text().map(|t| &**t))
        .collect();
    if let Some(text) = non_empty(&direct) {
        return text;
    }

    let children: Vec<ElementRef<'_>> = anchor.children().filter_map(ElementRef::wrap).collect();

    if let Some(class) = children
        .iter()
        .filter(|c| c.value().name() == "span")
        .find_map(|span| span.value().attr("class").and_then(non_empty))
    {
        return class;
    }

    if let Some(img) = children.iter().find(|c| c.value().name() == "img") {
        let attrs = img.value();
        return attrs
            .attr("title")
            .and_then(non_empty)
            .or_else(|| attrs.attr("alt").and_then(non_empty))
            .unwrap_or_else(|| IMAGE_PLACEHOLDER.to_string());
    }

    anchor.inner_html().trim().to_string()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Builds a page's outgoing references.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkExtractor;

impl LinkExtractor {
    /// Create an extractor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Parse `html` as the content of `page` and record its references.
    ///
    /// Each (text, target) pair is recorded once. Reachability comes from
    /// `cache`; targets that are sitemap pages get the reference on their
    /// incoming list. Returns the number of references recorded. A page can
    /// only be extracted once.
    #[instrument(skip(self, cache, graph, html), fields(page = page.index()))]
    pub async fn extract(
        &self,
        cache: &mut RetentionCache,
        graph: &mut PageGraph,
        page: PageId,
        html: &str,
    ) -> Result<usize> {
        graph.mark_parsed(page)?;
        let page_uri = graph.page(page).uri().clone();
        let document = parse_document(html, &page_uri);

        if let Some(title) = document.title {
            graph.set_title(page, title);
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut recorded = 0;

        for link in document.links {
            if !seen.insert((link.text.clone(), link.target.to_string())) {
                debug!(text = %link.text, target = %link.target, "Duplicate link skipped");
                continue;
            }

            let reachable = cache.resolve(&link.target).await?;
            let target_page = graph.find(&link.target);

            graph.insert_reference(Reference {
                source: page,
                text: link.text,
                target: link.target,
                reachable,
                target_page,
                kind: link.kind,
            });
            recorded += 1;
        }

        debug!(references = recorded, "Page extracted");
        Ok(recorded)
    }
}
