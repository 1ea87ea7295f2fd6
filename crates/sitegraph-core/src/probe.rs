//! Reachability verdicts for link targets.

use serde::Serialize;
use url::Url;

/// Schemes that are valid link targets but cannot be fetched.
const KNOWN_GOOD_SCHEMES: &[&str] = &["mailto", "tel"];
/// Schemes that can never be validated from a network crawl.
const KNOWN_BAD_SCHEMES: &[&str] = &["file"];

/// How a reachability verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeSource {
    /// The URI's content was fully fetched during this run.
    AlreadyFetched,
    /// Scheme such as `mailto:` or `tel:` that is accepted without a request.
    KnownGoodScheme,
    /// Scheme such as `file:` that is rejected without a request.
    KnownBadScheme,
    /// A HEAD request was sent.
    Network,
}

/// Whether a URI resolves, computed at most once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Existence {
    uri: Url,
    reachable: bool,
    source: ProbeSource,
}

impl Existence {
    /// Record a verdict.
    #[must_use]
    pub const fn new(uri: Url, reachable: bool, source: ProbeSource) -> Self {
        Self {
            uri,
            reachable,
            source,
        }
    }

    /// Verdict that needs no network access, if the scheme alone decides it.
    #[must_use]
    pub fn from_scheme(uri: &Url) -> Option<Self> {
        let scheme = uri.scheme();
        if KNOWN_GOOD_SCHEMES.contains(&scheme) {
            Some(Self::new(uri.clone(), true, ProbeSource::KnownGoodScheme))
        } else if KNOWN_BAD_SCHEMES.contains(&scheme) {
            Some(Self::new(uri.clone(), false, ProbeSource::KnownBadScheme))
        } else {
            None
        }
    }

    /// URI the verdict is about.
    #[must_use]
    pub const fn uri(&self) -> &Url {
        &self.uri
    }

    /// Whether the URI resolved successfully.
    #[must_use]
    pub const fn reachable(&self) -> bool {
        self.reachable
    }

    /// How the verdict was reached.
    #[must_use]
    pub const fn source(&self) -> ProbeSource {
        self.source
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn verdict(s: &str) -> Option<Existence> {
        Existence::from_scheme(&Url::parse(s).unwrap())
    }

    #[test]
    fn test_contact_schemes_are_reachable() {
        let mail = verdict("mailto:info@ex.org").unwrap();
        assert!(mail.reachable());
        assert_eq!(mail.source(), ProbeSource::KnownGoodScheme);

        let phone = verdict("tel:+15551234").unwrap();
        assert!(phone.reachable());
    }

    #[test]
    fn test_file_scheme_is_unreachable() {
        let local = verdict("file:///etc/hosts").unwrap();
        assert!(!local.reachable());
        assert_eq!(local.source(), ProbeSource::KnownBadScheme);
    }

    #[test]
    fn test_web_schemes_need_network() {
        assert!(verdict("https://ex.org/").is_none());
        assert!(verdict("http://ex.org/a.html").is_none());
        assert!(verdict("ftp://ex.org/file").is_none());
    }
}
