//! Typed errors for the research pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Per-URL failures are
//! absorbed inside their phase and only surface as [`ErrorKind`] values on
//! phase traces; [`ResearchError`] is reserved for programming errors.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Top-level errors returned by the library.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Field schema is empty or malformed
    #[error("invalid schema: {reason}")]
    InvalidSchema { reason: String },

    /// Input URL could not be parsed
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Configuration rejected by validation
    #[error("config error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// LLM call failed
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// HTTP fetch failed
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors from a single HTTP fetch.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// URL could not be parsed or has an unsupported scheme
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Connection refused, DNS failure, TLS failure and similar
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    /// The request did not complete within its budget
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// The response body could not be read
    #[error("failed reading body of {url}: {message}")]
    Body { url: String, message: String },
}

impl FetchError {
    /// Classify this error for phase traces.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Timeout { .. } => ErrorKind::Timeout,
            FetchError::InvalidUrl { .. } => ErrorKind::Parse,
            FetchError::Network { .. } | FetchError::Body { .. } => ErrorKind::Network,
        }
    }
}

/// Errors from an LLM provider.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    /// The completion did not arrive within the timeout
    #[error("LLM call timed out after {after:?}")]
    Timeout { after: Duration },

    /// The provider rejected the call or returned an error
    #[error("LLM provider error: {0}")]
    Provider(String),
}

impl LlmError {
    /// Classify this error for phase traces.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LlmError::Timeout { .. } => ErrorKind::Timeout,
            LlmError::Provider(_) => ErrorKind::Provider,
        }
    }
}

/// Failure classification recorded on phase traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Unreachable host, DNS failure, non-2xx response
    Network,
    /// An operation exceeded its time budget
    Timeout,
    /// Malformed HTML, XML or JSON
    Parse,
    /// LLM call rejected or errored
    Provider,
    /// A content or page-count cap was hit (policy boundary, not a fault)
    BudgetExceeded,
    /// The phase had no usable input or produced no usable output
    Empty,
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ResearchError>;

/// Result type alias for HTTP fetches.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for LLM calls.
pub type LlmResult<T> = std::result::Result<T, LlmError>;
