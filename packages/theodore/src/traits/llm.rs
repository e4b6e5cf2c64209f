//! LLM provider trait.
//!
//! The pipeline only needs one capability from a language model: turn a
//! prompt into text within a time budget. Which vendor or model answers is
//! opaque to the core.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LlmResult;

/// Text completion with a bounded timeout.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a prompt, failing with `LlmError::Timeout` if no answer
    /// arrives within `timeout` or `LlmError::Provider` if the call errors.
    async fn complete(&self, prompt: &str, timeout: Duration) -> LlmResult<String>;

    /// Provider name (for logging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[async_trait]
impl<T: LlmProvider + ?Sized> LlmProvider for Arc<T> {
    async fn complete(&self, prompt: &str, timeout: Duration) -> LlmResult<String> {
        (**self).complete(prompt, timeout).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl<T: LlmProvider + ?Sized> LlmProvider for Box<T> {
    async fn complete(&self, prompt: &str, timeout: Duration) -> LlmResult<String> {
        (**self).complete(prompt, timeout).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
