//! Process-wide rate limiting for HTTP fetches.
//!
//! Wraps any [`HttpClient`] with a `governor` limiter. Clones share the
//! limiter, so one instance handed to several concurrent research runs caps
//! the request rate for the whole process.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{FetchResult, ResearchError, Result};
use crate::traits::http::{HttpClient, HttpResponse};

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// An HTTP client wrapper that enforces a request rate.
pub struct RateLimitedHttpClient<H: HttpClient> {
    inner: Arc<H>,
    limiter: Arc<DefaultRateLimiter>,
}

impl<H: HttpClient> Clone for RateLimitedHttpClient<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            limiter: Arc::clone(&self.limiter),
        }
    }
}

impl<H: HttpClient> RateLimitedHttpClient<H> {
    /// Create a limiter allowing `requests_per_second`.
    pub fn new(client: H, requests_per_second: u32) -> Result<Self> {
        let rps = NonZeroU32::new(requests_per_second)
            .ok_or_else(|| ResearchError::Config("requests_per_second must be > 0".into()))?;
        Ok(Self::with_quota(client, Quota::per_second(rps)))
    }

    /// Create a limiter with burst support.
    pub fn with_burst(client: H, requests_per_second: u32, burst: u32) -> Result<Self> {
        let rps = NonZeroU32::new(requests_per_second)
            .ok_or_else(|| ResearchError::Config("requests_per_second must be > 0".into()))?;
        let burst =
            NonZeroU32::new(burst).ok_or_else(|| ResearchError::Config("burst must be > 0".into()))?;
        Ok(Self::with_quota(client, Quota::per_second(rps).allow_burst(burst)))
    }

    /// Create with a custom quota.
    pub fn with_quota(client: H, quota: Quota) -> Self {
        Self {
            inner: Arc::new(client),
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The wrapped client.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

#[async_trait]
impl<H: HttpClient> HttpClient for RateLimitedHttpClient<H> {
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult<HttpResponse> {
        // The inner timeout starts after the permit; a caller's outer timeout includes the wait.
        self.limiter.until_ready().await;
        self.inner.get(url, timeout).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
