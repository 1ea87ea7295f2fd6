//! In-memory page graph.
//!
//! Pages and references live in two arenas owned by [`PageGraph`]. Pages are
//! addressed by [`PageId`] (looked up by URI), references by [`ReferenceId`].
//! Every edge is added through [`PageGraph::insert_reference`], which is the
//! single place that appends to the source's outgoing list and to the target's
//! incoming list and counter, so the two sides can never disagree.

use crate::cache_key::resource_id;
use crate::classify::LinkKind;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use url::Url;

/// Index of a page in its [`PageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

impl PageId {
    /// Position in registration order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Index of a reference in its [`PageGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceId(usize);

impl ReferenceId {
    /// Position in creation order.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A sitemap-declared page.
#[derive(Debug, Clone)]
pub struct Page {
    uri: Url,
    title: String,
    lastmod: Option<DateTime<Utc>>,
    artifact: Option<std::path::PathBuf>,
    outgoing: Vec<ReferenceId>,
    incoming: Vec<ReferenceId>,
    reference_count: usize,
    parsed: bool,
}

impl Page {
    /// Page URI.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Document title, or the cached file's base name until parsed.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Modification time declared by the sitemap.
    #[must_use]
    pub const fn lastmod(&self) -> Option<DateTime<Utc>> {
        self.lastmod
    }

    /// Location of the cached artifact, when known.
    #[must_use]
    pub fn artifact(&self) -> Option<&std::path::Path> {
        self.artifact.as_deref()
    }

    /// References found on this page, in document order.
    #[must_use]
    pub fn outgoing(&self) -> &[ReferenceId] {
        &self.outgoing
    }

    /// References from other pages pointing here.
    #[must_use]
    pub fn incoming(&self) -> &[ReferenceId] {
        &self.incoming
    }

    /// Number of incoming references.
    #[must_use]
    pub const fn reference_count(&self) -> usize {
        self.reference_count
    }

    /// Whether the outgoing references have been built.
    #[must_use]
    pub const fn is_parsed(&self) -> bool {
        self.parsed
    }
}

/// One hyperlink from a page to a target URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Page the link was found on
    pub source: PageId,
    /// Visible link text
    pub text: String,
    /// Absolute target URI
    pub target: Url,
    /// Whether the target resolved
    pub reachable: bool,
    /// Target page, when the target is itself a sitemap page
    pub target_page: Option<PageId>,
    /// Where in the layout the link sits
    pub kind: LinkKind,
}

impl Reference {
    /// Whether the target is a sitemap page.
    #[must_use]
    pub const fn has_target_page(&self) -> bool {
        self.target_page.is_some()
    }
}

/// Pages keyed by URI with their references.
#[derive(Debug, Default)]
pub struct PageGraph {
    pages: Vec<Page>,
    by_uri: HashMap<String, PageId>,
    references: Vec<Reference>,
}

impl PageGraph {
    /// Empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page; registering a known URI returns the existing id.
    ///
    /// `default_title` is used until the document's own title is parsed.
    pub fn add_page(
        &mut self,
        uri: Url,
        default_title: impl Into<String>,
        lastmod: Option<DateTime<Utc>>,
    ) -> PageId {
        let id = resource_id(&uri);
        if let Some(existing) = self.by_uri.get(&id) {
            return *existing;
        }

        let page_id = PageId(self.pages.len());
        self.pages.push(Page {
            uri,
            title: default_title.into(),
            lastmod,
            artifact: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
            reference_count: 0,
            parsed: false,
        });
        self.by_uri.insert(id, page_id);
        page_id
    }

    /// Page registered for `uri`, ignoring any fragment.
    #[must_use]
    pub fn find(&self, uri: &Url) -> Option<PageId> {
        self.by_uri.get(&resource_id(uri)).copied()
    }

    /// Page by id.
    #[must_use]
    pub fn page(&self, id: PageId) -> &Page {
        &self.pages[id.0]
    }

    /// Reference by id.
    #[must_use]
    pub fn reference(&self, id: ReferenceId) -> &Reference {
        &self.references[id.0]
    }

    /// All pages in registration order.
    pub fn pages(&self) -> impl Iterator<Item = (PageId, &Page)> {
        self.pages.iter().enumerate().map(|(i, p)| (PageId(i), p))
    }

    /// All references in creation order.
    pub fn references(&self) -> impl Iterator<Item = (ReferenceId, &Reference)> {
        self.references
            .iter()
            .enumerate()
            .map(|(i, r)| (ReferenceId(i), r))
    }

    /// Number of pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Number of references.
    #[must_use]
    pub fn reference_total(&self) -> usize {
        self.references.len()
    }

    /// Record where a page's bytes are cached.
    pub fn set_artifact(&mut self, id: PageId, path: std::path::PathBuf) {
        self.pages[id.0].artifact = Some(path);
    }

    /// Replace a page's title with the parsed document title.
    pub fn set_title(&mut self, id: PageId, title: impl Into<String>) {
        self.pages[id.0].title = title.into();
    }

    /// Close a page's outgoing list.
    ///
    /// Outgoing references are built exactly once; a second call fails.
    pub fn mark_parsed(&mut self, id: PageId) -> Result<()> {
        let page = &mut self.pages[id.0];
        if page.parsed {
            return Err(Error::AlreadyParsed(page.uri.to_string()));
        }
        page.parsed = true;
        Ok(())
    }

    /// Add an edge.
    ///
    /// The reference is appended to its source's outgoing list and, when it
    /// targets a known page, to that page's incoming list, bumping the
    /// incoming counter.
    pub fn insert_reference(&mut self, reference: Reference) -> ReferenceId {
        let id = ReferenceId(self.references.len());
        let source = reference.source;
        let target = reference.target_page;
        self.references.push(reference);

        self.pages[source.0].outgoing.push(id);
        if let Some(target) = target {
            let page = &mut self.pages[target.0];
            page.incoming.push(id);
            page.reference_count += 1;
        }
        id
    }
}
