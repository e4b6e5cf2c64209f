//! The research pipeline, one module per phase.
//!
//! ```text
//! discover -> select -> fetch -> aggregate -> extract
//! ```
//!
//! `Researcher` runs the phases in order for one company. Each phase can
//! also be driven on its own.

pub mod aggregate;
pub mod content;
pub mod discover;
pub mod extract;
pub mod fetch;
pub mod heuristic;
pub mod index;
pub mod prompts;
pub mod response;
pub mod research;
pub mod select;

pub use aggregate::ContentAggregator;
pub use discover::{Discovery, DiscoveryStatus, LinkDiscoverer};
pub use extract::{ExtractionFailure, FactExtractor, ParseResult};
pub use fetch::{FetchReport, PageFetcher};
pub use heuristic::heuristic_select;
pub use index::index_record;
pub use research::{ResearchOutcome, Researcher};
pub use select::PageSelector;
