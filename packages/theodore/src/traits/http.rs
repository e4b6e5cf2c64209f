//! HTTP fetch trait.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchResult;

/// A fetched HTTP response.
///
/// Non-2xx responses are returned as values; callers decide what a status
/// means for them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,

    /// Header names lowercased
    pub headers: HashMap<String, String>,

    /// URL after redirects
    pub final_url: String,
}

impl HttpResponse {
    /// Create a 200 response with no headers.
    pub fn ok(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: HashMap::new(),
            final_url: url.into(),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// True for HTML responses, or when no content type was sent.
    pub fn looks_like_html(&self) -> bool {
        match self.content_type() {
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("html") || ct.contains("xml")
            }
            None => true,
        }
    }
}

/// Minimal HTTP GET capability used by discovery and fetching.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL, failing with `FetchError::Timeout` if it takes longer
    /// than `timeout`.
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<HttpResponse>;

    /// Client name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<HttpResponse> {
        (**self).get(url, timeout).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_builder() {
        let response = HttpResponse::ok("https://example.com", "<html></html>")
            .with_status(404)
            .with_header("Content-Type", "text/html; charset=utf-8");

        assert!(!response.is_success());
        assert_eq!(response.content_type(), Some("text/html; charset=utf-8"));
        assert!(response.looks_like_html());
    }

    #[test]
    fn test_non_html_content_type() {
        let response =
            HttpResponse::ok("https://example.com/a.pdf", "").with_header("content-type", "application/pdf");
        assert!(!response.looks_like_html());
    }
}
