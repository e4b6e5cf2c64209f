//! Client implementations of the trait seams.
//!
//! - `ReqwestHttpClient` - production HTTP fetching
//! - `RateLimitedHttpClient` - process-wide request rate cap
//! - `RetryingLlm` - bounded retry for any LLM provider

mod http;
mod rate_limited;
mod retry;

pub use http::ReqwestHttpClient;
pub use rate_limited::RateLimitedHttpClient;
pub use retry::{RetryPolicy, RetryingLlm};
