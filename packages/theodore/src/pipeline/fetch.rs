//! Concurrent fetching of selected pages.

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info};

use super::content::{collapse_whitespace, html_to_text, truncate_chars};
use crate::error::{ErrorKind, FetchError};
use crate::traits::http::HttpClient;
use crate::types::{
    config::FetchConfig,
    page::{FetchStatus, PageContent},
    selection::PageSelection,
};

/// Fetch results with success counts.
#[derive(Debug, Clone)]
pub struct FetchReport {
    /// One entry per selected page, in selection order
    pub pages: Vec<PageContent>,
    pub ok: usize,
    pub failed: usize,
}

impl FetchReport {
    pub fn from_pages(pages: Vec<PageContent>) -> Self {
        let ok = pages.iter().filter(|p| p.is_ok()).count();
        let failed = pages.len() - ok;
        Self { pages, ok, failed }
    }

    /// True when pages were attempted and none succeeded.
    pub fn all_failed(&self) -> bool {
        !self.pages.is_empty() && self.ok == 0
    }

    /// Dominant failure when every page failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        if !self.all_failed() {
            return None;
        }
        let timeouts = self
            .pages
            .iter()
            .filter(|p| p.status == FetchStatus::Timeout)
            .count();
        let empties = self
            .pages
            .iter()
            .filter(|p| p.status == FetchStatus::Empty)
            .count();
        Some(if timeouts == self.pages.len() {
            ErrorKind::Timeout
        } else if empties == self.pages.len() {
            ErrorKind::Empty
        } else {
            ErrorKind::Network
        })
    }
}

/// Fetches selected pages with bounded concurrency.
pub struct PageFetcher<H: HttpClient> {
    http: H,
    config: FetchConfig,
}

impl<H: HttpClient> PageFetcher<H> {
    pub fn new(http: H, config: FetchConfig) -> Self {
        Self { http, config }
    }

    /// Fetch every selected page.
    ///
    /// Returns one `PageContent` per selected page in selection order,
    /// whatever order the fetches completed in.
    pub async fn fetch_all(&self, selection: &PageSelection) -> Vec<PageContent> {
        let concurrency = self.config.concurrency.max(1);

        let mut pages: Vec<PageContent> = stream::iter(selection.pages.iter().enumerate())
            .map(|(rank, page)| self.fetch_one(rank, &page.url))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        pages.sort_by_key(|p| p.rank);
        pages
    }

    /// Fetch every selected page and summarise the outcome.
    pub async fn fetch_report(&self, selection: &PageSelection) -> FetchReport {
        let report = FetchReport::from_pages(self.fetch_all(selection).await);
        info!(
            selected = selection.len(),
            ok = report.ok,
            failed = report.failed,
            "Page fetching complete"
        );
        report
    }

    async fn fetch_one(&self, rank: usize, url: &str) -> PageContent {
        let start = Instant::now();
        let timeout = self.config.page_timeout();

        let result = match tokio::time::timeout(timeout, self.http.get(url, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        };
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %url, error = %e, "Page fetch failed");
                let status = match e {
                    FetchError::Timeout { .. } => FetchStatus::Timeout,
                    _ => FetchStatus::HttpError,
                };
                return PageContent::failed(url, rank, status).with_duration_ms(elapsed_ms);
            }
        };

        if !response.is_success() {
            debug!(url = %url, status = response.status, "Page returned error status");
            return PageContent::failed(url, rank, FetchStatus::HttpError)
                .with_http_status(response.status)
                .with_duration_ms(elapsed_ms);
        }

        let (title, text) = if response.looks_like_html() {
            let extracted = html_to_text(&response.body);
            (extracted.title, extracted.text)
        } else if response
            .content_type()
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("text/"))
        {
            (None, collapse_whitespace(&response.body))
        } else {
            debug!(url = %url, content_type = ?response.content_type(), "Skipping non-text page");
            (None, String::new())
        };

        if text.is_empty() {
            return PageContent::failed(url, rank, FetchStatus::Empty)
                .with_http_status(response.status)
                .with_duration_ms(elapsed_ms);
        }

        let text = truncate_chars(&text, self.config.max_chars_per_page);
        debug!(url = %url, chars = text.chars().count(), elapsed_ms, "Page fetched");

        let page = PageContent::ok(url, rank, text)
            .with_http_status(response.status)
            .with_duration_ms(elapsed_ms);
        match title {
            Some(title) => page.with_title(title),
            None => page,
        }
    }
}
