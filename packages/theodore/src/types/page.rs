//! Fetched page content.

use serde::{Deserialize, Serialize};

/// Outcome of fetching one selected page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Ok,
    Timeout,
    HttpError,
    Empty,
}

/// Text extracted from one selected page.
///
/// One per selected page, including failures, so fetch output is 1:1 with
/// the selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContent {
    /// URL as selected
    pub url: String,

    /// Position in the page selection (0 = highest priority)
    pub rank: usize,

    /// Visible text, truncated to the per-page budget
    pub extracted_text: String,

    pub status: FetchStatus,

    /// HTTP status code when a response arrived
    pub http_status: Option<u16>,

    /// Page title if available
    pub title: Option<String>,

    pub fetch_duration_ms: u64,
}

impl PageContent {
    /// Create a successful page.
    pub fn ok(url: impl Into<String>, rank: usize, text: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rank,
            extracted_text: text.into(),
            status: FetchStatus::Ok,
            http_status: Some(200),
            title: None,
            fetch_duration_ms: 0,
        }
    }

    /// Create a failed page with no text.
    pub fn failed(url: impl Into<String>, rank: usize, status: FetchStatus) -> Self {
        Self {
            url: url.into(),
            rank,
            extracted_text: String::new(),
            status,
            http_status: None,
            title: None,
            fetch_duration_ms: 0,
        }
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.fetch_duration_ms = ms;
        self
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    /// Character count of the extracted text.
    pub fn char_count(&self) -> usize {
        self.extracted_text.chars().count()
    }
}
