//! Company Research Pipeline
//!
//! Given a company name and website, Theodore finds the pages most likely
//! to describe the business, reads them, and asks an LLM to fill a fixed
//! schema of business facts.
//!
//! # Pipeline
//!
//! 1. **Discover** candidate links from robots.txt, sitemaps and a bounded crawl
//! 2. **Select** the most promising pages with an LLM, falling back to a
//!    keyword heuristic
//! 3. **Fetch** the selected pages concurrently and extract visible text
//! 4. **Aggregate** page texts into one size-capped corpus
//! 5. **Extract** schema fields from the corpus with one LLM call
//!
//! Each run returns a record holding every schema field (null when unknown)
//! plus a trace per phase. Failures degrade the record instead of aborting.
//!
//! # Usage
//!
//! ```rust,ignore
//! use theodore::{FieldSchema, ResearchConfig, Researcher, ReqwestHttpClient};
//! use theodore::ai::OpenAiProvider;
//!
//! let researcher = Researcher::new(
//!     OpenAiProvider::from_env()?,
//!     ReqwestHttpClient::new()?,
//!     ResearchConfig::default(),
//!     FieldSchema::business_defaults(),
//! )?;
//!
//! let outcome = researcher.research("Acme", "acme.com").await?;
//! println!("{}", serde_json::to_string_pretty(&outcome.record)?);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Seams for LLM, HTTP and vector storage
//! - [`types`] - Configuration, links, pages, corpus, records and traces
//! - [`crawlers`] - robots.txt, sitemap and link helpers
//! - [`pipeline`] - The five phases and the `Researcher` orchestrator
//! - [`clients`] - reqwest HTTP client, rate limiting and LLM retry
//! - [`stores`] - In-memory vector store
//! - [`testing`] - Mock implementations for testing

pub mod clients;
pub mod crawlers;
pub mod error;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

pub use error::{ErrorKind, FetchError, LlmError, ResearchError, Result};
pub use traits::{
    http::{HttpClient, HttpResponse},
    llm::LlmProvider,
    store::{Embedder, VectorMatch, VectorStore},
};
pub use types::{
    config::{
        AggregationConfig, DiscoveryConfig, ExtractionConfig, FetchConfig, ResearchConfig,
        SelectionConfig,
    },
    corpus::AggregatedCorpus,
    link::{CandidateLink, CandidateSet, DiscoveryMethod},
    page::{FetchStatus, PageContent},
    record::{CompanyFields, CompanyRecord},
    schema::{FieldSchema, FieldSpec, FieldType},
    selection::{PageSelection, SelectedPage, SelectionMethod},
    trace::{Phase, PhaseTrace, ResearchState},
};

pub use pipeline::{
    heuristic_select, index_record, ContentAggregator, Discovery, DiscoveryStatus,
    ExtractionFailure, FactExtractor, FetchReport, LinkDiscoverer, PageFetcher, PageSelector,
    ParseResult, ResearchOutcome, Researcher,
};

pub use clients::{RateLimitedHttpClient, ReqwestHttpClient, RetryPolicy, RetryingLlm};
pub use crawlers::{fetch_robots_txt, RobotsTxt};
pub use stores::MemoryVectorStore;
pub use testing::{MockEmbedder, MockHttpClient, MockLlm};
