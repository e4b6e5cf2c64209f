//! Link discovery: robots.txt, sitemaps, then a bounded breadth-first crawl.

use futures::stream::{self, StreamExt};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info, warn};
use url::Url;

use crate::crawlers::{
    links::{candidate_url, extract_links, normalize_url},
    robots::{fetch_robots_txt, RobotsTxt},
    sitemap::parse_sitemap,
};
use crate::error::{ErrorKind, FetchError, FetchResult};
use crate::traits::http::{HttpClient, HttpResponse};
use crate::types::{
    config::DiscoveryConfig,
    link::{CandidateLink, CandidateSet, DiscoveryMethod},
};

/// Whether the target site answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    Reachable,
    Unreachable(ErrorKind),
}

/// Result of discovering links on one site.
#[derive(Debug, Clone)]
pub struct Discovery {
    pub links: CandidateSet,
    pub status: DiscoveryStatus,

    /// Error message when the site was unreachable or yielded nothing
    pub detail: Option<String>,

    /// Sitemap documents fetched
    pub sitemaps_fetched: usize,

    /// Pages fetched while crawling
    pub pages_crawled: usize,
}

impl Discovery {
    /// No candidates means there is nothing to research.
    pub fn is_failure(&self) -> bool {
        self.links.is_empty()
    }

    /// Failure classification for the phase trace.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.status {
            DiscoveryStatus::Unreachable(kind) => Some(kind),
            DiscoveryStatus::Reachable if self.links.is_empty() => Some(ErrorKind::Empty),
            DiscoveryStatus::Reachable => None,
        }
    }
}

/// Finds candidate page URLs on a company website.
pub struct LinkDiscoverer<H: HttpClient> {
    http: H,
    config: DiscoveryConfig,
}

impl<H: HttpClient> LinkDiscoverer<H> {
    pub fn new(http: H, config: DiscoveryConfig) -> Self {
        Self { http, config }
    }

    /// Discover candidate links for the site at `base_url`.
    ///
    /// Never fails; an unreachable site yields an empty set with
    /// `DiscoveryStatus::Unreachable`.
    pub async fn discover(&self, base_url: &Url) -> Discovery {
        let robots = self.load_robots(base_url).await;

        // Links from sitemaps that robots.txt declares are tagged `Robots`
        let (sitemap_roots, sitemap_method) = match &robots {
            Some(r) if !r.sitemaps().is_empty() => (r.sitemaps().to_vec(), DiscoveryMethod::Robots),
            _ => (
                base_url
                    .join("/sitemap.xml")
                    .map(|u| vec![u.to_string()])
                    .unwrap_or_default(),
                DiscoveryMethod::Sitemap,
            ),
        };

        let (sitemap_links, sitemaps_fetched) = self.collect_sitemaps(base_url, sitemap_roots).await;

        let mut discovery = if sitemap_links.is_empty() {
            debug!(base_url = %base_url, "No sitemap links, crawling");
            self.crawl(base_url).await
        } else {
            // The base URL seeds the set under the same method as the sitemap
            let mut links = CandidateSet::new();
            if let Some(base) = normalize_url(base_url.as_str()) {
                links.insert(CandidateLink::new(base, sitemap_method));
            }
            for url in sitemap_links {
                links.insert(CandidateLink::new(url, sitemap_method));
            }
            Discovery {
                links,
                status: DiscoveryStatus::Reachable,
                detail: None,
                sitemaps_fetched: 0,
                pages_crawled: 0,
            }
        };
        discovery.sitemaps_fetched = sitemaps_fetched;

        if let Some(robots) = robots.filter(|_| self.config.respect_robots) {
            let base = normalize_url(base_url.as_str());
            let agent = &self.config.user_agent;
            let before = discovery.links.len();
            discovery.links.retain(|link| {
                Some(&link.url) == base.as_ref() || robots.is_url_allowed(agent, &link.url)
            });
            let removed = before - discovery.links.len();
            if removed > 0 {
                debug!(removed, "Dropped links disallowed by robots.txt");
            }
        }

        if discovery.links.len() > self.config.max_links {
            let keep: HashSet<String> = discovery
                .links
                .urls()
                .take(self.config.max_links)
                .map(str::to_string)
                .collect();
            discovery.links.retain(|link| keep.contains(&link.url));
        }

        info!(
            base_url = %base_url,
            links = discovery.links.len(),
            sitemaps = discovery.sitemaps_fetched,
            pages_crawled = discovery.pages_crawled,
            status = ?discovery.status,
            "Link discovery complete"
        );

        discovery
    }

    async fn load_robots(&self, base_url: &Url) -> Option<RobotsTxt> {
        let timeout = self.config.request_timeout();
        match tokio::time::timeout(timeout, fetch_robots_txt(&self.http, base_url, timeout)).await {
            Ok(Ok(robots)) => robots,
            Ok(Err(e)) => {
                warn!(base_url = %base_url, error = %e, "Failed to fetch robots.txt");
                None
            }
            Err(_) => {
                warn!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "Timed out fetching robots.txt");
                None
            }
        }
    }

    /// GET bounded by the request timeout, whether or not the client
    /// enforces it.
    async fn get(&self, url: &str) -> FetchResult<HttpResponse> {
        let timeout = self.config.request_timeout();
        match tokio::time::timeout(timeout, self.http.get(url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }

    /// Fetch sitemaps breadth-first, following index children, and return
    /// on-site candidate URLs in document order.
    async fn collect_sitemaps(&self, base_url: &Url, roots: Vec<String>) -> (Vec<String>, usize) {
        let mut queue: VecDeque<String> = roots.into();
        let mut visited = HashSet::new();
        let mut seen = HashSet::new();
        let mut links = Vec::new();
        let mut fetched = 0;

        while let Some(sitemap_url) = queue.pop_front() {
            if fetched >= self.config.max_sitemaps || links.len() >= self.config.max_links {
                break;
            }
            if !visited.insert(sitemap_url.clone()) {
                continue;
            }

            let response = match self.get(&sitemap_url).await {
                Ok(r) if r.is_success() => r,
                Ok(r) => {
                    debug!(url = %sitemap_url, status = r.status, "Sitemap not available");
                    continue;
                }
                Err(e) => {
                    warn!(url = %sitemap_url, error = %e, "Failed to fetch sitemap");
                    continue;
                }
            };
            fetched += 1;

            let doc = match parse_sitemap(&response.body) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(url = %sitemap_url, error = %e, "Failed to parse sitemap");
                    continue;
                }
            };

            for loc in doc.urls {
                let Some(url) = normalize_url(&loc).and_then(|u| candidate_url(&u, base_url)) else {
                    continue;
                };
                if seen.insert(url.clone()) {
                    links.push(url);
                }
            }
            queue.extend(doc.children);
        }

        (links, fetched)
    }

    /// Breadth-first crawl from the base URL, one depth level at a time.
    async fn crawl(&self, base_url: &Url) -> Discovery {
        let mut links = CandidateSet::new();
        let mut pages_crawled = 0;
        let mut base_error: Option<(ErrorKind, String)> = None;

        let Some(start) = normalize_url(base_url.as_str()) else {
            return Discovery {
                links,
                status: DiscoveryStatus::Unreachable(ErrorKind::Parse),
                detail: Some(format!("invalid base URL: {}", base_url)),
                sitemaps_fetched: 0,
                pages_crawled: 0,
            };
        };

        let mut frontier = vec![start.clone()];
        let mut enqueued: HashSet<String> = HashSet::from([start.clone()]);

        for depth in 0..=self.config.max_depth {
            let budget = self.config.max_crawl_pages.saturating_sub(pages_crawled);
            if frontier.is_empty() || budget == 0 || links.len() >= self.config.max_links {
                break;
            }
            frontier.truncate(budget);

            let results: Vec<_> = stream::iter(frontier.drain(..))
                .map(|url| async move {
                    let result = self.get(&url).await;
                    (url, result)
                })
                .buffered(self.config.crawl_concurrency.max(1))
                .collect()
                .await;

            let mut next = Vec::new();
            for (url, result) in results {
                pages_crawled += 1;
                let response = match result {
                    Ok(r) if r.is_success() => r,
                    Ok(r) => {
                        debug!(url = %url, status = r.status, "Crawl page returned error status");
                        if url == start {
                            base_error = Some((ErrorKind::Network, format!("HTTP {}", r.status)));
                        }
                        continue;
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Failed to fetch page during crawl");
                        if url == start {
                            base_error = Some((e.kind(), e.to_string()));
                        }
                        continue;
                    }
                };

                links.insert(CandidateLink::new(url.clone(), DiscoveryMethod::Crawl));

                if depth == self.config.max_depth || !response.looks_like_html() {
                    continue;
                }

                // Redirects change the base that relative links resolve against.
                let page_url = Url::parse(&response.final_url)
                    .or_else(|_| Url::parse(&url));
                let Ok(page_url) = page_url else { continue };

                for link in extract_links(&response.body, &page_url) {
                    if links.len() >= self.config.max_links {
                        break;
                    }
                    let Some(link) = candidate_url(&link, base_url) else {
                        continue;
                    };
                    if !enqueued.insert(link.clone()) {
                        continue;
                    }
                    links.insert(CandidateLink::new(link.clone(), DiscoveryMethod::Crawl));
                    next.push(link);
                }
            }

            debug!(depth, discovered = links.len(), next_level = next.len(), "Crawl level complete");
            frontier = next;
        }

        let (status, detail) = match base_error {
            Some((kind, message)) if links.is_empty() => (DiscoveryStatus::Unreachable(kind), Some(message)),
            _ if links.is_empty() => (
                DiscoveryStatus::Unreachable(ErrorKind::Empty),
                Some("site yielded no candidate links".to_string()),
            ),
            _ => (DiscoveryStatus::Reachable, None),
        };

        Discovery {
            links,
            status,
            detail,
            sitemaps_fetched: 0,
            pages_crawled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockHttpClient, MockRoute, SiteBuilder};

    fn base() -> Url {
        Url::parse("https://acme.test").unwrap()
    }

    fn discoverer(http: MockHttpClient) -> LinkDiscoverer<MockHttpClient> {
        LinkDiscoverer::new(http, DiscoveryConfig::default())
    }

    #[tokio::test]
    async fn test_sitemap_discovery() {
        let http = SiteBuilder::new("https://acme.test")
            .sitemap(&["/about", "/team/", "/brochure.pdf", "/about#x"])
            .build();

        let discovery = discoverer(http).discover(&base()).await;

        let urls: Vec<_> = discovery.links.urls().collect();
        assert_eq!(
            urls,
            vec![
                "https://acme.test/",
                "https://acme.test/about",
                "https://acme.test/team",
            ]
        );
        assert_eq!(
            discovery.links.get("https://acme.test/about").unwrap().discovery_method,
            DiscoveryMethod::Robots
        );
        assert_eq!(discovery.status, DiscoveryStatus::Reachable);
        assert_eq!(discovery.sitemaps_fetched, 1);
    }

    #[tokio::test]
    async fn test_sitemap_index_followed() {
        let index = r#"<sitemapindex>
            <sitemap><loc>https://acme.test/pages.xml</loc></sitemap>
        </sitemapindex>"#;
        let pages = r#"<urlset><url><loc>https://acme.test/contact</loc></url></urlset>"#;
        let http = MockHttpClient::new()
            .with_body("https://acme.test/robots.txt", "Sitemap: https://acme.test/index.xml", "text/plain")
            .with_body("https://acme.test/index.xml", index, "application/xml")
            .with_body("https://acme.test/pages.xml", pages, "application/xml");

        let discovery = discoverer(http).discover(&base()).await;

        assert!(discovery.links.contains("https://acme.test/contact"));
        assert_eq!(discovery.sitemaps_fetched, 2);
        assert_eq!(
            discovery.links.get("https://acme.test/contact").unwrap().discovery_method,
            DiscoveryMethod::Robots
        );
    }

    #[tokio::test]
    async fn test_crawl_fallback_is_bounded_by_depth() {
        let http = SiteBuilder::new("https://acme.test")
            .simple_page("/", "Home", "Welcome", &["/about", "https://www.acme.test/team", "https://other.test/x"])
            .simple_page("/about", "About", "Us", &["/about/history"])
            .simple_page("/about/history", "History", "Old", &["/deep"])
            .build();

        let discovery = discoverer(http).discover(&base()).await;

        let urls: Vec<_> = discovery.links.urls().collect();
        assert_eq!(urls[0], "https://acme.test/");
        assert!(discovery.links.contains("https://acme.test/about"));
        assert!(discovery.links.contains("https://acme.test/team"));
        assert!(discovery.links.contains("https://acme.test/about/history"));
        assert!(!discovery.links.contains("https://other.test/x"));
        // depth 2 pages are recorded but not expanded
        assert!(!discovery.links.contains("https://acme.test/deep"));
        assert_eq!(discovery.links.get("https://acme.test/about").unwrap().discovery_method, DiscoveryMethod::Crawl);
    }

    #[tokio::test]
    async fn test_www_and_bare_hosts_share_one_candidate() {
        let http = SiteBuilder::new("https://acme.test")
            .simple_page(
                "/",
                "Home",
                "Welcome",
                &["/about", "https://www.acme.test/about", "https://WWW.acme.test/"],
            )
            .simple_page("/about", "About", "Us", &[])
            .build();

        let discovery = discoverer(http).discover(&base()).await;

        let urls: Vec<_> = discovery.links.urls().collect();
        assert_eq!(urls, vec!["https://acme.test/", "https://acme.test/about"]);
    }

    #[tokio::test]
    async fn test_www_sitemap_entries_take_base_host() {
        let sitemap = r#"<urlset>
            <url><loc>https://www.acme.test/about</loc></url>
            <url><loc>https://acme.test/about</loc></url>
        </urlset>"#;
        let http = MockHttpClient::new().with_body("https://acme.test/sitemap.xml", sitemap, "application/xml");

        let discovery = discoverer(http).discover(&base()).await;

        let urls: Vec<_> = discovery.links.urls().collect();
        assert_eq!(urls, vec!["https://acme.test/", "https://acme.test/about"]);
        // no robots.txt, so the sitemap came from the conventional location
        assert!(discovery.links.iter().all(|l| l.discovery_method == DiscoveryMethod::Sitemap));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_robots_falls_through_to_crawl() {
        let http = SiteBuilder::new("https://acme.test")
            .simple_page("/", "Home", "Welcome", &["/about"])
            .simple_page("/about", "About", "Us", &[])
            .route("/robots.txt", MockRoute::Hang)
            .route("/sitemap.xml", MockRoute::Hang)
            .build();
        let config = DiscoveryConfig::default();
        let request_timeout = config.request_timeout();
        let started = tokio::time::Instant::now();

        let discovery = LinkDiscoverer::new(http, config).discover(&base()).await;

        assert_eq!(discovery.status, DiscoveryStatus::Reachable);
        assert!(discovery.links.contains("https://acme.test/about"));
        assert_eq!(discovery.sitemaps_fetched, 0);
        assert!(started.elapsed() < request_timeout * 3);
    }

    #[tokio::test]
    async fn test_robots_disallow_filters_candidates() {
        let http = MockHttpClient::new()
            .with_body(
                "https://acme.test/robots.txt",
                "User-agent: *\nDisallow: /admin\n",
                "text/plain",
            )
            .with_page(
                "https://acme.test/",
                r#"<a href="/admin/panel">Admin</a><a href="/about">About</a>"#,
            );

        let discovery = discoverer(http).discover(&base()).await;

        assert!(discovery.links.contains("https://acme.test/about"));
        assert!(!discovery.links.contains("https://acme.test/admin/panel"));
    }

    #[tokio::test]
    async fn test_unreachable_site() {
        let http = MockHttpClient::new().unreachable_host("acme.test");

        let discovery = discoverer(http).discover(&base()).await;

        assert!(discovery.is_failure());
        assert_eq!(discovery.status, DiscoveryStatus::Unreachable(ErrorKind::Network));
        assert_eq!(discovery.error_kind(), Some(ErrorKind::Network));
        assert!(discovery.detail.is_some());
    }

    #[tokio::test]
    async fn test_max_links_cap() {
        let paths: Vec<String> = (0..30).map(|i| format!("/p{}", i)).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let http = SiteBuilder::new("https://acme.test").sitemap(&refs).build();
        let config = DiscoveryConfig {
            max_links: 10,
            ..Default::default()
        };

        let discovery = LinkDiscoverer::new(http, config).discover(&base()).await;
        assert_eq!(discovery.links.len(), 10);
    }

    #[tokio::test]
    async fn test_discovery_is_deterministic() {
        let build = || {
            SiteBuilder::new("https://acme.test")
                .simple_page("/", "Home", "", &["/a", "/b", "/c"])
                .simple_page("/a", "A", "", &["/a1", "/a2"])
                .simple_page("/b", "B", "", &["/b1"])
                .simple_page("/c", "C", "", &["/c1", "/a1"])
                .build()
        };

        let first: Vec<String> = discoverer(build()).discover(&base()).await.links.urls().map(String::from).collect();
        let second: Vec<String> = discoverer(build()).discover(&base()).await.links.urls().map(String::from).collect();

        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "https://acme.test/",
                "https://acme.test/a",
                "https://acme.test/b",
                "https://acme.test/c",
                "https://acme.test/a1",
                "https://acme.test/a2",
                "https://acme.test/b1",
                "https://acme.test/c1",
            ]
        );
    }
}
