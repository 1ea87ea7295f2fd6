//! Structural classification of links.
//!
//! A link is labelled by where it sits in the page layout. The anchor's
//! ancestors are turned into a slash-separated path of "effective names"
//! (`html/body/section-news/div`) and the path is matched against a few
//! rules. Section names are looked up in small tables; names missing from the
//! tables are kept verbatim so new site sections still get a readable label.

use regex::Regex;
use scraper::ElementRef;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Runs of spaces and dashes, collapsed to a single dash.
///
/// SAFETY: Pattern is a compile-time constant that is known to be valid.
#[allow(clippy::unwrap_used)]
static SEPARATOR_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ -]+").unwrap());

/// Markers that put a link in the navigation chrome.
const MENU_MARKERS: &[&str] = &["menu", "nav", "body/header"];

/// Prefix of segments naming a content section (`section-news`).
const SECTION_PREFIX: &str = "section-";

/// Wrapper segment skipped when looking below a bare `section`.
const CONTAINER_SEGMENT: &str = "container";

/// Labels for `section-<suffix>` segments.
const SECTION_LABELS: &[(&str, &str)] = &[
    ("activities", "Activities"),
    ("agenda", "Agenda"),
    ("contact", "Contact"),
    ("content", "Content"),
    ("content-image", "ContentWithImage"),
    ("cta", "CallToAction"),
    ("faq", "Faq"),
    ("gallery", "Gallery"),
    ("hero", "Hero"),
    ("news", "News"),
    ("team", "Team"),
];

/// Labels for the first meaningful child of a bare `section` segment.
const SECTION_CHILD_LABELS: &[(&str, &str)] = &[
    ("fb-page", "Facebook"),
    ("instagram", "Instagram"),
    ("related", "Related"),
    ("share", "Share"),
    ("tags", "Tags"),
    ("twitter", "Twitter"),
];

/// Where in the layout a link originates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    /// Navigation chrome: menus, nav bars, the page header.
    Menu,
    /// A named content section; the label comes from a lookup table or is the
    /// raw section name when the table has no entry.
    Section(String),
    /// Anything else.
    Regular,
}

impl LinkKind {
    /// Human readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Menu => "Menu",
            Self::Section(label) => label,
            Self::Regular => "Regular",
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for LinkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Classify an anchor by its ancestors.
#[must_use]
pub fn classify(anchor: ElementRef<'_>) -> LinkKind {
    classify_path(&ancestor_path(anchor))
}

/// Slash-separated effective names of `element`'s ancestors, root first.
///
/// The element itself is not part of the path.
#[must_use]
pub fn ancestor_path(element: ElementRef<'_>) -> String {
    let mut names: Vec<String> = element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .map(effective_name)
        .collect();
    names.reverse();
    names.join("/")
}

fn effective_name(element: ElementRef<'_>) -> String {
    let value = element.value();
    let tag = value.name();
    let non_empty = |name: &str| value.attr(name).map(str::trim).filter(|v| !v.is_empty());

    match tag {
        "section" => match non_empty("class") {
            Some(class) => class.strip_prefix("section ").unwrap_or(class).to_string(),
            None => tag.to_string(),
        },
        "div" => non_empty("class")
            .or_else(|| non_empty("id"))
            .unwrap_or(tag)
            .to_string(),
        _ => tag.to_string(),
    }
}

/// Classify a raw ancestor path.
///
/// Pure function of its input: the same path always yields the same kind.
#[must_use]
pub fn classify_path(path: &str) -> LinkKind {
    let normalized = SEPARATOR_RUN_RE.replace_all(path, "-");
    let lowered = normalized.to_lowercase();

    if MENU_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        return LinkKind::Menu;
    }

    let segments: Vec<&str> = normalized.split('/').collect();

    if let Some(suffix) = segments.iter().find_map(|s| strip_prefix_ignore_case(s, SECTION_PREFIX)) {
        return LinkKind::Section(lookup(SECTION_LABELS, suffix));
    }

    if let Some(index) = segments.iter().position(|s| s.eq_ignore_ascii_case("section")) {
        return segments[index + 1..]
            .iter()
            .find(|s| !s.eq_ignore_ascii_case(CONTAINER_SEGMENT))
            .map_or(LinkKind::Regular, |child| {
                LinkKind::Section(lookup(SECTION_CHILD_LABELS, child))
            });
    }

    LinkKind::Regular
}

fn strip_prefix_ignore_case<'a>(segment: &'a str, prefix: &str) -> Option<&'a str> {
    let head = segment.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &segment[prefix.len()..])
}

fn lookup(table: &[(&str, &str)], key: &str) -> String {
    table
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map_or_else(|| key.to_string(), |(_, label)| (*label).to_string())
}
