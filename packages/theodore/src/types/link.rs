//! Candidate links produced by discovery.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// How a candidate link was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    Robots,
    Sitemap,
    Crawl,
}

/// A URL discovered on the target site, not yet evaluated for relevance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLink {
    /// Normalized URL
    pub url: String,

    /// Where the link came from
    pub discovery_method: DiscoveryMethod,
}

impl CandidateLink {
    pub fn new(url: impl Into<String>, discovery_method: DiscoveryMethod) -> Self {
        Self {
            url: url.into(),
            discovery_method,
        }
    }

    /// URL path, lowercased, for keyword matching.
    pub fn path_lowercase(&self) -> String {
        Url::parse(&self.url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_else(|_| self.url.to_lowercase())
    }
}

/// Deduplicated candidate links in discovery order.
///
/// Keyed by normalized URL; the first discovery of a URL wins, so the
/// iteration order is the order in which URLs were first seen.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    links: IndexMap<String, CandidateLink>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link whose URL is already normalized.
    ///
    /// Returns `false` if the URL was already present.
    pub fn insert(&mut self, link: CandidateLink) -> bool {
        if self.links.contains_key(&link.url) {
            return false;
        }
        self.links.insert(link.url.clone(), link);
        true
    }

    pub fn contains(&self, normalized_url: &str) -> bool {
        self.links.contains_key(normalized_url)
    }

    pub fn get(&self, normalized_url: &str) -> Option<&CandidateLink> {
        self.links.get(normalized_url)
    }

    /// Position of a URL in discovery order.
    pub fn position(&self, normalized_url: &str) -> Option<usize> {
        self.links.get_index_of(normalized_url)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateLink> {
        self.links.values()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.links.keys().map(String::as_str)
    }

    /// Drop every link that fails the predicate, keeping order.
    pub fn retain(&mut self, mut keep: impl FnMut(&CandidateLink) -> bool) {
        self.links.retain(|_, link| keep(link));
    }
}

impl FromIterator<CandidateLink> for CandidateSet {
    fn from_iter<T: IntoIterator<Item = CandidateLink>>(iter: T) -> Self {
        let mut set = CandidateSet::new();
        for link in iter {
            set.insert(link);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_discovery_wins() {
        let mut set = CandidateSet::new();
        assert!(set.insert(CandidateLink::new(
            "https://example.com/about",
            DiscoveryMethod::Sitemap
        )));
        assert!(!set.insert(CandidateLink::new(
            "https://example.com/about",
            DiscoveryMethod::Crawl
        )));

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get("https://example.com/about").unwrap().discovery_method,
            DiscoveryMethod::Sitemap
        );
    }

    #[test]
    fn test_preserves_order() {
        let set: CandidateSet = ["/b", "/a", "/c"]
            .iter()
            .map(|p| CandidateLink::new(format!("https://example.com{}", p), DiscoveryMethod::Crawl))
            .collect();

        let urls: Vec<_> = set.urls().collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/b",
                "https://example.com/a",
                "https://example.com/c"
            ]
        );
        assert_eq!(set.position("https://example.com/a"), Some(1));
    }

    #[test]
    fn test_path_lowercase() {
        let link = CandidateLink::new("https://example.com/About-Us", DiscoveryMethod::Crawl);
        assert_eq!(link.path_lowercase(), "/about-us");
    }
}
