//! Bounded retry for LLM providers.

use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::error::{LlmError, LlmResult};
use crate::traits::llm::LlmProvider;

/// How failed LLM calls are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubles on each further retry
    pub initial_backoff: Duration,

    /// Also retry calls that timed out
    pub retry_on_timeout: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(500),
            retry_on_timeout: false,
        }
    }
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    fn should_retry(&self, error: &LlmError) -> bool {
        match error {
            LlmError::Provider(_) => true,
            LlmError::Timeout { .. } => self.retry_on_timeout,
        }
    }

    fn backoff(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

/// An [`LlmProvider`] that retries transient failures.
pub struct RetryingLlm<L: LlmProvider> {
    inner: L,
    policy: RetryPolicy,
}

impl<L: LlmProvider> RetryingLlm<L> {
    /// Wrap a provider with the default policy (one retry).
    pub fn new(inner: L) -> Self {
        Self::with_policy(inner, RetryPolicy::default())
    }

    pub fn with_policy(inner: L, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }
}

#[async_trait]
impl<L: LlmProvider> LlmProvider for RetryingLlm<L> {
    async fn complete(&self, prompt: &str, timeout: Duration) -> LlmResult<String> {
        let mut attempt = 0;
        loop {
            match self.inner.complete(prompt, timeout).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < self.policy.max_retries && self.policy.should_retry(&e) => {
                    attempt += 1;
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        provider = self.inner.name(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "LLM call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockLlm, MockLlmBehavior};

    #[tokio::test(start_paused = true)]
    async fn test_retries_provider_error_once() {
        let mock = MockLlm::new().with_sequence(vec![
            MockLlmBehavior::Error("overloaded".into()),
            MockLlmBehavior::Respond("ok".into()),
        ]);
        let llm = RetryingLlm::new(mock);

        let result = llm.complete("prompt", Duration::from_secs(5)).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(llm.inner().calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let mock = MockLlm::new().with_default(MockLlmBehavior::Error("down".into()));
        let llm = RetryingLlm::new(mock);

        let result = llm.complete("prompt", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(LlmError::Provider(_))));
        assert_eq!(llm.inner().calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_not_retried_by_default() {
        let mock = MockLlm::new().with_default(MockLlmBehavior::Timeout);
        let llm = RetryingLlm::new(mock);

        let result = llm.complete("prompt", Duration::from_secs(5)).await;

        assert!(matches!(result, Err(LlmError::Timeout { .. })));
        assert_eq!(llm.inner().calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retried_when_enabled() {
        let mock = MockLlm::new().with_default(MockLlmBehavior::Timeout);
        let policy = RetryPolicy {
            retry_on_timeout: true,
            ..Default::default()
        };
        let llm = RetryingLlm::with_policy(mock, policy);

        let _ = llm.complete("prompt", Duration::from_secs(5)).await;
        assert_eq!(llm.inner().calls().len(), 2);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            retry_on_timeout: false,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }
}
