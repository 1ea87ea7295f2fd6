//! Sitemap walking.
//!
//! Reads sitemaps (per sitemaps.org) through the [`RetentionCache`] and turns
//! every `<url>` into a [`Page`](crate::graph::Page) in the [`PageGraph`].
//!
//! ## Sitemap Formats
//!
//! - **Standard sitemap**: `<urlset>` with `<url>` entries, each of which is
//!   fetched and registered as a page
//! - **Sitemap index**: `<sitemapindex>` with `<sitemap>` entries pointing to
//!   further sitemaps, walked depth first in document order
//!
//! Every entry needs both `<loc>` and `<lastmod>`. Entries missing either, or
//! with a `lastmod` that does not parse, are skipped with a warning while
//! their siblings are still processed.

use crate::cache::RetentionCache;
use crate::cache_key::resource_id;
use crate::graph::PageGraph;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Maximum nesting of sitemap indices below a root sitemap.
pub const MAX_INDEX_DEPTH: u8 = 5;

/// `lastmod` layout: `2024-01-15T10:30:00+01:00`.
const LASTMOD_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Which kind of sitemap document was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<urlset>`: entries are pages.
    UrlSet,
    /// `<sitemapindex>`: entries are further sitemaps.
    Index,
}

impl SitemapKind {
    const fn entry_tag(self) -> &'static [u8] {
        match self {
            Self::UrlSet => b"url",
            Self::Index => b"sitemap",
        }
    }
}

/// A `(loc, lastmod)` pair from a sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Absolute location of the page or child sitemap.
    pub loc: Url,
    /// Declared last modification time.
    pub lastmod: DateTime<Utc>,
}

/// A parsed sitemap document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Root element kind.
    pub kind: SitemapKind,
    /// Valid entries in document order.
    pub entries: Vec<SitemapEntry>,
}

#[derive(Debug, Clone, Copy)]
enum Field {
    Loc,
    Lastmod,
}

/// Parse sitemap XML.
///
/// Fails only when the document itself is unreadable: malformed XML, or a
/// root element other than `<urlset>` or `<sitemapindex>`.
#[instrument(skip(xml), fields(xml_len = xml.len()))]
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut kind: Option<SitemapKind> = None;
    let mut entries = Vec::new();
    let mut in_entry = false;
    let mut field: Option<Field> = None;
    let mut loc: Option<String> = None;
    let mut lastmod: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                match (kind, name.as_ref()) {
                    (None, b"urlset") => kind = Some(SitemapKind::UrlSet),
                    (None, b"sitemapindex") => kind = Some(SitemapKind::Index),
                    (None, other) => {
                        return Err(Error::Parse(format!(
                            "Unexpected root element <{}>, expected <urlset> or <sitemapindex>",
                            String::from_utf8_lossy(other)
                        )));
                    },
                    (Some(k), tag) if tag == k.entry_tag() => {
                        in_entry = true;
                        loc = None;
                        lastmod = None;
                    },
                    (Some(_), b"loc") if in_entry => field = Some(Field::Loc),
                    (Some(_), b"lastmod") if in_entry => field = Some(Field::Lastmod),
                    _ => {},
                }
            },
            Ok(Event::End(e)) => {
                if let Some(k) = kind {
                    if in_entry && e.local_name().as_ref() == k.entry_tag() {
                        if let Some(entry) = make_entry(loc.take(), lastmod.take()) {
                            entries.push(entry);
                        }
                        in_entry = false;
                    }
                }
                field = None;
            },
            Ok(Event::Text(e)) => {
                if let Some(current) = field {
                    let text = e.unescape().map_err(|e| Error::Parse(e.to_string()))?;
                    store_field(current, &text, &mut loc, &mut lastmod);
                }
            },
            Ok(Event::CData(e)) => {
                if let Some(current) = field {
                    store_field(current, &String::from_utf8_lossy(&e), &mut loc, &mut lastmod);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::Parse(format!(
                    "XML parse error at position {}: {e}",
                    reader.error_position()
                )));
            },
            _ => {},
        }
    }

    let kind = kind.ok_or_else(|| Error::Parse("Sitemap has no root element".to_string()))?;
    Ok(SitemapDocument { kind, entries })
}

fn store_field(field: Field, text: &str, loc: &mut Option<String>, lastmod: &mut Option<String>) {
    let text = text.trim().to_string();
    match field {
        Field::Loc => *loc = Some(text),
        Field::Lastmod => *lastmod = Some(text),
    }
}

fn make_entry(loc: Option<String>, lastmod: Option<String>) -> Option<SitemapEntry> {
    let Some(loc) = loc.filter(|l| !l.is_empty()) else {
        warn!("Skipping sitemap entry without <loc>");
        return None;
    };
    let Some(raw_lastmod) = lastmod.filter(|l| !l.is_empty()) else {
        warn!(loc = %loc, "Skipping sitemap entry without <lastmod>");
        return None;
    };
    let Some(lastmod) = parse_lastmod(&raw_lastmod) else {
        warn!(loc = %loc, lastmod = %raw_lastmod, "Skipping sitemap entry with unparsable <lastmod>");
        return None;
    };
    match Url::parse(&loc) {
        Ok(loc) => Some(SitemapEntry { loc, lastmod }),
        Err(e) => {
            warn!(loc = %loc, "Skipping sitemap entry with invalid <loc>: {e}");
            None
        },
    }
}

/// Parse a `lastmod` timestamp.
///
/// The expected layout is `yyyy-MM-ddTHH:mm:ss` with a `±hh:mm` offset;
/// any other RFC 3339 timestamp (such as a `Z` suffix or fractional
/// seconds) is accepted as well.
#[must_use]
pub fn parse_lastmod(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_str(s, LASTMOD_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Walks sitemaps and registers their pages.
#[derive(Debug, Default)]
pub struct SitemapWalker {
    visited: HashSet<String>,
    root: Option<Url>,
}

impl SitemapWalker {
    /// Create a walker with nothing visited.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Site root: the directory of the first root sitemap.
    #[must_use]
    pub const fn root(&self) -> Option<&Url> {
        self.root.as_ref()
    }

    /// Number of distinct sitemaps read.
    #[must_use]
    pub fn sitemaps_read(&self) -> usize {
        self.visited.len()
    }

    /// Walk every root sitemap, fetching and registering all listed pages.
    ///
    /// Root sitemaps are fetched without a known modification time; child
    /// sitemaps and pages are fetched with the `lastmod` their parent
    /// declares. A sitemap already walked is not walked again.
    #[instrument(skip_all, fields(roots = roots.len()))]
    pub async fn load(
        &mut self,
        cache: &mut RetentionCache,
        graph: &mut PageGraph,
        roots: &[Url],
    ) -> Result<()> {
        for root in roots {
            if self.root.is_none() {
                self.root = Some(root.join(".")?);
            }
            self.walk(cache, graph, root.clone()).await?;
        }
        info!(
            sitemaps = self.visited.len(),
            pages = graph.len(),
            "Sitemaps loaded"
        );
        Ok(())
    }

    async fn walk(
        &mut self,
        cache: &mut RetentionCache,
        graph: &mut PageGraph,
        root: Url,
    ) -> Result<()> {
        // Depth-first, children pushed in reverse to keep document order
        let mut pending: Vec<(Url, Option<DateTime<Utc>>, u8)> = vec![(root, None, 0)];

        while let Some((uri, lastmod, depth)) = pending.pop() {
            if !self.visited.insert(resource_id(&uri)) {
                debug!(sitemap = %uri, "Sitemap already walked");
                continue;
            }

            let document = read_sitemap(cache, &uri, lastmod).await?;
            debug!(sitemap = %uri, kind = ?document.kind, entries = document.entries.len(), depth, "Sitemap read");

            match document.kind {
                SitemapKind::Index if depth >= MAX_INDEX_DEPTH => {
                    warn!(sitemap = %uri, "Sitemap index nested too deeply, skipping its children");
                },
                SitemapKind::Index => {
                    pending.extend(
                        document
                            .entries
                            .into_iter()
                            .rev()
                            .map(|e| (e.loc, Some(e.lastmod), depth + 1)),
                    );
                },
                SitemapKind::UrlSet => {
                    for entry in document.entries {
                        register_page(cache, graph, entry).await?;
                    }
                },
            }
        }
        Ok(())
    }
}

async fn read_sitemap(
    cache: &mut RetentionCache,
    uri: &Url,
    lastmod: Option<DateTime<Utc>>,
) -> Result<SitemapDocument> {
    let entry = cache.fetch(uri, lastmod).await?;
    if entry.extension() != Some(".xml") {
        return Err(Error::Parse(format!(
            "Sitemap {uri} is not XML (cached as '{}')",
            entry.extension().unwrap_or_default()
        )));
    }
    parse_sitemap(&entry.read_to_string()?)
}

async fn register_page(
    cache: &mut RetentionCache,
    graph: &mut PageGraph,
    entry: SitemapEntry,
) -> Result<()> {
    if graph.find(&entry.loc).is_some() {
        debug!(page = %entry.loc, "Page listed more than once");
        return Ok(());
    }

    let cached = cache.fetch(&entry.loc, Some(entry.lastmod)).await?;
    let title = cached.label().to_string();
    let artifact = cached.path();

    let id = graph.add_page(entry.loc, title, Some(entry.lastmod));
    if let Some(path) = artifact {
        graph.set_artifact(id, path);
    }
    Ok(())
}
