//! # sitegraph-core
//!
//! Core functionality for sitegraph - a sitemap-driven crawler that caches a
//! website locally and builds the graph of links between its pages.
//!
//! ## Architecture
//!
//! The crate is organized around two subsystems and the cache model they share:
//!
//! - **Retention cache**: decides per URI whether cached bytes are reused,
//!   revalidated with a conditional HEAD or downloaded again, and answers
//!   whether link targets exist
//! - **Link graph**: parses each page once, resolves and deduplicates its
//!   links, classifies them by layout position and records them as
//!   bidirectional edges between pages
//! - **Sitemap walking and reporting**: feed URIs in and turn the finished
//!   graph into report rows
//!
//! ## Quick Start
//!
//! ```no_run
//! use sitegraph_core::{Config, Crawler, SiteReport};
//! use url::Url;
//!
//! # async fn example() -> sitegraph_core::Result<()> {
//! let config = Config::default();
//! let sitemap = Url::parse("https://example.org/sitemap.xml")?;
//!
//! let outcome = Crawler::new(&config)?.run(&[sitemap]).await?;
//! if let Some(root) = &outcome.root {
//!     let report = SiteReport::build(&outcome.graph, root);
//!     println!("{} broken links", report.summary.broken);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Failed network operations and unsupported content abort a run with an
//! [`Error`]. Broken links, skipped sitemap entries and anchors without a
//! target are not errors; they show up in the graph or the logs.

/// Retention-aware content cache and existence probing
pub mod cache;
/// Mapping from URIs to on-disk cache locations
pub mod cache_key;
/// Structural classification of links
pub mod classify;
/// Configuration management
pub mod config;
/// Crawl orchestration
pub mod crawl;
/// Cached artifacts on disk
pub mod entry;
/// Error types and result aliases
pub mod error;
/// HTTP fetching with conditional request support
pub mod fetcher;
/// Page graph with bidirectional references
pub mod graph;
/// Link extraction from HTML pages
pub mod links;
/// Per-host HTTP client pool
pub mod pool;
/// Reachability verdicts
pub mod probe;
/// Report rows derived from the page graph
pub mod report;
/// Cache retention policies
pub mod retention;
/// Sitemap parsing and walking
pub mod sitemap;

// Re-export commonly used types
pub use cache::{FetchOutcome, RetentionCache};
pub use cache_key::{CacheKey, CacheKeyMapper};
pub use classify::LinkKind;
pub use config::{CacheConfig, Config, HttpConfig};
pub use crawl::{CrawlOutcome, Crawler};
pub use entry::CachedEntry;
pub use error::{Error, Result};
pub use fetcher::{FetchStats, Fetcher};
pub use graph::{Page, PageGraph, PageId, Reference, ReferenceId};
pub use links::LinkExtractor;
pub use pool::ClientPool;
pub use probe::{Existence, ProbeSource};
pub use report::SiteReport;
pub use retention::RetentionPolicy;
pub use sitemap::SitemapWalker;
