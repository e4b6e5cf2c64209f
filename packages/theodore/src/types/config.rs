//! Configuration types for each pipeline phase.
//!
//! Time budgets are stored as whole seconds so configs round-trip through
//! JSON files; accessors return [`Duration`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ResearchError, Result};

/// Room kept in the corpus cap for one section header and its URL.
pub const SECTION_HEADER_RESERVE: usize = 256;

/// Configuration for a whole research run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub discovery: DiscoveryConfig,
    pub selection: SelectionConfig,
    pub fetch: FetchConfig,
    pub aggregation: AggregationConfig,
    pub extraction: ExtractionConfig,

    /// Wall-clock budget for one company, across all phases.
    ///
    /// Default: 180 seconds.
    pub research_budget_secs: u64,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            selection: SelectionConfig::default(),
            fetch: FetchConfig::default(),
            aggregation: AggregationConfig::default(),
            extraction: ExtractionConfig::default(),
            research_budget_secs: 180,
        }
    }
}

impl ResearchConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overall per-company budget.
    pub fn research_budget(&self) -> Duration {
        Duration::from_secs(self.research_budget_secs)
    }

    /// Set the overall per-company budget.
    pub fn with_research_budget(mut self, budget: Duration) -> Self {
        self.research_budget_secs = budget.as_secs();
        self
    }

    /// Set the maximum number of pages to select.
    pub fn with_max_pages_to_select(mut self, max: usize) -> Self {
        self.selection.max_pages_to_select = max;
        self
    }

    /// Set the fetch concurrency cap.
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch.concurrency = concurrency;
        self
    }

    /// Set the total corpus character cap.
    pub fn with_max_corpus_chars(mut self, max: usize) -> Self {
        self.aggregation.max_corpus_chars = max;
        self
    }

    /// Reject configurations that would make a phase a no-op.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            (self.discovery.max_links, "discovery.max_links"),
            (self.discovery.crawl_concurrency, "discovery.crawl_concurrency"),
            (self.selection.max_pages_to_select, "selection.max_pages_to_select"),
            (self.fetch.concurrency, "fetch.concurrency"),
            (self.fetch.max_chars_per_page, "fetch.max_chars_per_page"),
            (self.aggregation.max_corpus_chars, "aggregation.max_corpus_chars"),
        ];
        for (value, name) in checks {
            if value == 0 {
                return Err(ResearchError::Config(format!("{} must be > 0", name)));
            }
        }
        // A full-size top page must fit, or the corpus could come out empty
        let min_corpus = self.fetch.max_chars_per_page + SECTION_HEADER_RESERVE;
        if self.aggregation.max_corpus_chars < min_corpus {
            return Err(ResearchError::Config(format!(
                "aggregation.max_corpus_chars ({}) must be at least fetch.max_chars_per_page plus {} ({})",
                self.aggregation.max_corpus_chars, SECTION_HEADER_RESERVE, min_corpus
            )));
        }
        if self.research_budget_secs == 0 {
            return Err(ResearchError::Config(
                "research_budget_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for link discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Maximum crawl depth (0 = only the base page)
    pub max_depth: usize,

    /// Maximum number of candidate links to collect
    pub max_links: usize,

    /// Maximum number of pages fetched while crawling
    pub max_crawl_pages: usize,

    /// Maximum sitemap documents fetched (including index children)
    pub max_sitemaps: usize,

    /// Concurrent fetches per crawl depth level
    pub crawl_concurrency: usize,

    /// Timeout for each robots, sitemap and crawl request
    pub request_timeout_secs: u64,

    /// Drop candidates disallowed by robots.txt
    pub respect_robots: bool,

    /// User agent matched against robots.txt groups
    pub user_agent: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_links: 500,
            max_crawl_pages: 40,
            max_sitemaps: 10,
            crawl_concurrency: 5,
            request_timeout_secs: 15,
            respect_robots: true,
            user_agent: "TheodoreBot".to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Configuration for page selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Upper bound on selected pages
    pub max_pages_to_select: usize,

    /// Timeout for the selection LLM call
    pub llm_timeout_secs: u64,

    /// Keyword weights for the heuristic fallback, in table order
    pub priority_keywords: Vec<(String, u32)>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            max_pages_to_select: 20,
            llm_timeout_secs: 45,
            priority_keywords: default_priority_keywords(),
        }
    }
}

impl SelectionConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

/// Default heuristic keyword table.
pub fn default_priority_keywords() -> Vec<(String, u32)> {
    [
        ("contact", 10),
        ("about", 9),
        ("team", 8),
        ("careers", 7),
        ("leadership", 7),
        ("company", 6),
        ("services", 5),
        ("products", 5),
        ("history", 4),
    ]
    .into_iter()
    .map(|(k, w)| (k.to_string(), w))
    .collect()
}

/// Configuration for concurrent page fetching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Simultaneous fetches
    pub concurrency: usize,

    /// Timeout per page
    pub page_timeout_secs: u64,

    /// Per-page character budget (prefix kept)
    pub max_chars_per_page: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            page_timeout_secs: 30,
            max_chars_per_page: 12_000,
        }
    }
}

impl FetchConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

/// Configuration for corpus aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Total corpus character cap, headers included
    pub max_corpus_chars: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_corpus_chars: 60_000,
        }
    }
}

/// Configuration for business-fact extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Timeout for the extraction LLM call
    pub llm_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            llm_timeout_secs: 90,
        }
    }
}

impl ExtractionConfig {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}
