//! Crawl orchestration.
//!
//! A run has two phases. First every sitemap is walked and every listed page
//! is fetched into the cache. Then each HTML page is parsed exactly once, in
//! the order it was registered, and its references are added to the graph.
//! No page is parsed before all pages are known, so every link to a sitemap
//! page can be attributed to its target.

use crate::cache::RetentionCache;
use crate::fetcher::FetchStats;
use crate::graph::PageGraph;
use crate::links::LinkExtractor;
use crate::sitemap::SitemapWalker;
use crate::{Config, Result};
use tracing::{debug, info, instrument};
use url::Url;

/// Extension of cached artifacts that are parsed for links.
const HTML_EXTENSION: &str = ".html";

/// Result of a finished crawl.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Pages and references.
    pub graph: PageGraph,
    /// Site root used for relative URIs, if any sitemap was given.
    pub root: Option<Url>,
    /// Requests issued during the run.
    pub stats: FetchStats,
    /// Distinct sitemaps read.
    pub sitemaps: usize,
}

/// Runs a crawl with one cache for the whole run.
#[derive(Debug)]
pub struct Crawler {
    cache: RetentionCache,
    extractor: LinkExtractor,
}

impl Crawler {
    /// Build a crawler from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_cache(RetentionCache::new(config)))
    }

    /// Build a crawler around an existing cache.
    #[must_use]
    pub const fn with_cache(cache: RetentionCache) -> Self {
        Self {
            cache,
            extractor: LinkExtractor::new(),
        }
    }

    /// Cache used by this crawler.
    #[must_use]
    pub const fn cache(&self) -> &RetentionCache {
        &self.cache
    }

    /// Crawl the sites described by `sitemaps`.
    ///
    /// The first failing fetch aborts the run.
    #[instrument(skip_all, fields(sitemaps = sitemaps.len(), policy = %self.cache.policy()))]
    pub async fn run(mut self, sitemaps: &[Url]) -> Result<CrawlOutcome> {
        let mut graph = PageGraph::new();
        let mut walker = SitemapWalker::new();
        walker.load(&mut self.cache, &mut graph, sitemaps).await?;

        let page_ids: Vec<_> = graph.pages().map(|(id, _)| id).collect();
        let mut parsed = 0usize;
        for id in page_ids {
            let uri = graph.page(id).uri().clone();
            let Some(entry) = self.cache.entry(&uri) else {
                continue;
            };
            if entry.extension() != Some(HTML_EXTENSION) {
                debug!(page = %uri, "Not HTML, keeping page without parsing");
                continue;
            }
            let html = entry.read_to_string()?;
            self.extractor
                .extract(&mut self.cache, &mut graph, id, &html)
                .await?;
            parsed += 1;
        }

        let stats = self.cache.stats();
        info!(
            pages = graph.len(),
            parsed,
            references = graph.reference_total(),
            gets = stats.gets,
            heads = stats.heads,
            "Crawl finished"
        );
        self.cache.close();

        Ok(CrawlOutcome {
            root: walker.root().cloned(),
            sitemaps: walker.sitemaps_read(),
            graph,
            stats,
        })
    }
}
