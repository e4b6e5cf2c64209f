//! Testing utilities including mock implementations.
//!
//! These let applications and tests exercise the research pipeline without
//! making real LLM or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, LlmError, LlmResult, Result};
use crate::traits::{
    http::{HttpClient, HttpResponse},
    llm::LlmProvider,
    store::Embedder,
};

/// What a mock LLM does when called.
#[derive(Debug, Clone)]
pub enum MockLlmBehavior {
    /// Return this text
    Respond(String),
    /// Fail with a provider error
    Error(String),
    /// Fail with a timeout immediately
    Timeout,
    /// Never answer; the caller's own timeout must fire
    Hang,
    /// Answer after a delay
    Delayed(Duration, String),
}

/// Record of a call made to the mock LLM.
#[derive(Debug, Clone)]
pub struct MockLlmCall {
    pub prompt: String,
    pub timeout: Duration,
}

/// A mock LLM with scripted responses.
///
/// Resolution order for each call: the next queued sequence item, then the
/// first rule whose needle occurs in the prompt, then the default.
/// Clones share their script and call log.
#[derive(Clone)]
pub struct MockLlm {
    sequence: Arc<RwLock<VecDeque<MockLlmBehavior>>>,
    rules: Arc<RwLock<Vec<(String, MockLlmBehavior)>>>,
    default: Arc<RwLock<MockLlmBehavior>>,
    calls: Arc<RwLock<Vec<MockLlmCall>>>,
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlm {
    /// Create a mock that errors unless configured.
    pub fn new() -> Self {
        Self {
            sequence: Arc::new(RwLock::new(VecDeque::new())),
            rules: Arc::new(RwLock::new(Vec::new())),
            default: Arc::new(RwLock::new(MockLlmBehavior::Error(
                "no mock response configured".to_string(),
            ))),
            calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Behave this way for prompts containing `needle`.
    pub fn on_prompt_containing(self, needle: impl Into<String>, behavior: MockLlmBehavior) -> Self {
        self.rules.write().unwrap().push((needle.into(), behavior));
        self
    }

    /// Respond with `text` for prompts containing `needle`.
    pub fn respond_to(self, needle: impl Into<String>, text: impl Into<String>) -> Self {
        self.on_prompt_containing(needle, MockLlmBehavior::Respond(text.into()))
    }

    /// Queue behaviors consumed one per call, before rules apply.
    pub fn with_sequence(self, behaviors: Vec<MockLlmBehavior>) -> Self {
        self.sequence.write().unwrap().extend(behaviors);
        self
    }

    /// Behavior when nothing else matches.
    pub fn with_default(self, behavior: MockLlmBehavior) -> Self {
        *self.default.write().unwrap() = behavior;
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockLlmCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of calls whose prompt contained `needle`.
    pub fn calls_containing(&self, needle: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.prompt.contains(needle))
            .count()
    }

    fn resolve(&self, prompt: &str) -> MockLlmBehavior {
        if let Some(next) = self.sequence.write().unwrap().pop_front() {
            return next;
        }
        self.rules
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, behavior)| behavior.clone())
            .unwrap_or_else(|| self.default.read().unwrap().clone())
    }
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn complete(&self, prompt: &str, timeout: Duration) -> LlmResult<String> {
        self.calls.write().unwrap().push(MockLlmCall {
            prompt: prompt.to_string(),
            timeout,
        });

        match self.resolve(prompt) {
            MockLlmBehavior::Respond(text) => Ok(text),
            MockLlmBehavior::Error(message) => Err(LlmError::Provider(message)),
            MockLlmBehavior::Timeout => Err(LlmError::Timeout { after: timeout }),
            MockLlmBehavior::Hang => std::future::pending().await,
            MockLlmBehavior::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// What a mock HTTP route returns.
#[derive(Debug, Clone)]
pub enum MockRoute {
    Response(HttpResponse),
    NetworkError,
    Timeout,
    Hang,
    Delayed(Duration, HttpResponse),
}

/// A mock HTTP client serving a route table.
///
/// Unknown URLs get a 404; URLs on an unreachable host fail with a network
/// error. A trailing slash is ignored when matching routes.
#[derive(Default, Clone)]
pub struct MockHttpClient {
    routes: Arc<RwLock<HashMap<String, MockRoute>>>,
    unreachable_hosts: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn route_key(url: &str) -> String {
        let trimmed = url.trim_end_matches('/');
        trimmed.to_string()
    }

    /// Serve an HTML page.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        let url = url.into();
        let response =
            HttpResponse::ok(url.clone(), html).with_header("content-type", "text/html; charset=utf-8");
        self.with_route(url, MockRoute::Response(response))
    }

    /// Serve a body with an explicit content type.
    pub fn with_body(
        self,
        url: impl Into<String>,
        body: impl Into<String>,
        content_type: &str,
    ) -> Self {
        let url = url.into();
        let response = HttpResponse::ok(url.clone(), body).with_header("content-type", content_type);
        self.with_route(url, MockRoute::Response(response))
    }

    /// Serve an empty response with the given status.
    pub fn with_status(self, url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let response = HttpResponse::ok(url.clone(), "").with_status(status);
        self.with_route(url, MockRoute::Response(response))
    }

    pub fn with_route(self, url: impl Into<String>, route: MockRoute) -> Self {
        self.routes
            .write()
            .unwrap()
            .insert(Self::route_key(&url.into()), route);
        self
    }

    /// Every request to this host fails with a network error.
    pub fn unreachable_host(self, host: impl Into<String>) -> Self {
        self.unreachable_hosts.write().unwrap().insert(host.into());
        self
    }

    /// URLs requested, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// Number of requests for a URL.
    pub fn call_count(&self, url: &str) -> usize {
        let key = Self::route_key(url);
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|u| Self::route_key(u) == key)
            .count()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, _timeout: Duration) -> FetchResult<HttpResponse> {
        self.calls.write().unwrap().push(url.to_string());

        let parsed = url::Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        let host = parsed.host_str().unwrap_or_default().to_string();
        if self.unreachable_hosts.read().unwrap().contains(&host) {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: "Mock connection refused".to_string(),
            });
        }

        let route = self.routes.read().unwrap().get(&Self::route_key(url)).cloned();
        match route {
            Some(MockRoute::Response(response)) => Ok(response),
            Some(MockRoute::NetworkError) => Err(FetchError::Network {
                url: url.to_string(),
                message: "Mock connection reset".to_string(),
            }),
            Some(MockRoute::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            Some(MockRoute::Hang) => std::future::pending().await,
            Some(MockRoute::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Ok(HttpResponse::ok(url, "").with_status(404)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Deterministic embeddings derived from a SHA-256 of the text.
pub struct MockEmbedder {
    dim: usize,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new(64)
    }
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        use sha2::{Digest, Sha256};

        let hash = Sha256::digest(text.as_bytes());
        Ok((0..self.dim)
            .map(|i| (hash[i % 32] as f32 / 127.5) - 1.0)
            .collect())
    }
}

/// Simple HTML page with a title, body text and links.
pub fn html_page(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>\n", href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><nav>{}</nav><main><h1>{}</h1><p>{}</p></main><footer>Copyright</footer></body></html>",
        title, anchors, title, body
    )
}

/// Builder for a mock website served by [`MockHttpClient`].
pub struct SiteBuilder {
    base: String,
    client: MockHttpClient,
    sitemap_paths: Option<Vec<String>>,
}

impl SiteBuilder {
    /// Start a site at `base` (scheme and host, no trailing slash).
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: MockHttpClient::new(),
            sitemap_paths: None,
        }
    }

    /// Add an HTML page at `path`.
    pub fn page(mut self, path: &str, html: impl Into<String>) -> Self {
        let url = format!("{}{}", self.base, path);
        self.client = self.client.with_page(url, html);
        self
    }

    /// Add a page built with [`html_page`].
    pub fn simple_page(self, path: &str, title: &str, body: &str, links: &[&str]) -> Self {
        let html = html_page(title, body, links);
        self.page(path, html)
    }

    /// Serve `/sitemap.xml` listing these paths and a robots.txt declaring it.
    pub fn sitemap(mut self, paths: &[&str]) -> Self {
        self.sitemap_paths = Some(paths.iter().map(|p| p.to_string()).collect());
        self
    }

    /// Add an arbitrary route.
    pub fn route(mut self, path: &str, route: MockRoute) -> Self {
        let url = format!("{}{}", self.base, path);
        self.client = self.client.with_route(url, route);
        self
    }

    pub fn build(self) -> MockHttpClient {
        let mut client = self.client;
        if let Some(paths) = self.sitemap_paths {
            let entries: String = paths
                .iter()
                .map(|p| format!("  <url><loc>{}{}</loc></url>\n", self.base, p))
                .collect();
            let xml = format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{}</urlset>",
                entries
            );
            let robots = format!("User-agent: *\nDisallow: /admin/\n\nSitemap: {}/sitemap.xml\n", self.base);
            client = client
                .with_body(format!("{}/sitemap.xml", self.base), xml, "application/xml")
                .with_body(format!("{}/robots.txt", self.base), robots, "text/plain");
        }
        client
    }
}
