//! Page selection types.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// How a page selection was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Ranked by the LLM
    Llm,
    /// Keyword heuristic with at least one matching candidate
    Heuristic,
    /// Keyword heuristic where nothing matched; discovery order was used
    HeuristicUnscored,
}

impl SelectionMethod {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, SelectionMethod::Llm)
    }
}

/// One page chosen for fetching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPage {
    /// Normalized candidate URL
    pub url: String,

    /// Higher means more promising
    pub priority_score: f64,

    /// Why the page was chosen (LLM reasoning or heuristic explanation)
    pub reasoning: Option<String>,
}

impl SelectedPage {
    pub fn new(url: impl Into<String>, priority_score: f64) -> Self {
        Self {
            url: url.into(),
            priority_score,
            reasoning: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}

/// Ordered, bounded subset of candidate links, highest priority first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSelection {
    pub pages: Vec<SelectedPage>,
    pub method: SelectionMethod,

    /// Why the LLM selection was abandoned, when a fallback was used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_cause: Option<ErrorKind>,
}

impl PageSelection {
    pub fn new(pages: Vec<SelectedPage>, method: SelectionMethod) -> Self {
        Self {
            pages,
            method,
            fallback_cause: None,
        }
    }

    pub fn empty(method: SelectionMethod) -> Self {
        Self::new(Vec::new(), method)
    }

    pub fn with_fallback_cause(mut self, cause: ErrorKind) -> Self {
        self.fallback_cause = Some(cause);
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|p| p.url.as_str())
    }
}
