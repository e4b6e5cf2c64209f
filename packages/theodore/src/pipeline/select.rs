//! Page selection: LLM ranking with the keyword heuristic as fallback.

use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use url::Url;

use super::heuristic::heuristic_select;
use super::prompts::format_select_pages_prompt;
use super::response::find_json_value;
use crate::crawlers::links::candidate_url;
use crate::error::{ErrorKind, LlmError};
use crate::traits::llm::LlmProvider;
use crate::types::{
    config::SelectionConfig,
    link::CandidateSet,
    schema::FieldSchema,
    selection::{PageSelection, SelectedPage, SelectionMethod},
};

/// Chooses which candidate pages to fetch.
pub struct PageSelector<L: LlmProvider> {
    llm: L,
    config: SelectionConfig,
}

impl<L: LlmProvider> PageSelector<L> {
    pub fn new(llm: L, config: SelectionConfig) -> Self {
        Self { llm, config }
    }

    /// Select at most `max_pages_to_select` candidates, best first.
    ///
    /// Never fails. If the LLM times out, errors, or answers with nothing
    /// usable, the keyword heuristic decides and the selection records why.
    pub async fn select(
        &self,
        candidates: &CandidateSet,
        schema: &FieldSchema,
        base_url: &Url,
    ) -> PageSelection {
        let max_pages = self.config.max_pages_to_select;
        if candidates.is_empty() {
            return PageSelection::empty(SelectionMethod::Heuristic);
        }

        let prompt = format_select_pages_prompt(base_url.as_str(), candidates.urls(), schema, max_pages);
        let timeout = self.config.llm_timeout();

        let answer = match tokio::time::timeout(timeout, self.llm.complete(&prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout { after: timeout }),
        };

        let cause = match answer {
            Ok(text) => {
                let pages = parse_selection(&text, candidates, base_url, max_pages);
                if !pages.is_empty() {
                    info!(
                        provider = self.llm.name(),
                        selected = pages.len(),
                        candidates = candidates.len(),
                        "LLM page selection complete"
                    );
                    return PageSelection::new(pages, SelectionMethod::Llm);
                }
                debug!(response_len = text.len(), "LLM selection named no known candidate");
                ErrorKind::Parse
            }
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "LLM page selection failed");
                e.kind()
            }
        };

        let selection = heuristic_select(candidates, &self.config.priority_keywords, max_pages)
            .with_fallback_cause(cause);
        info!(
            method = ?selection.method,
            cause = ?cause,
            selected = selection.len(),
            "Using heuristic page selection"
        );
        selection
    }
}

/// Parse an LLM selection answer into known, unique candidates.
///
/// Accepts `{"selected_pages": [...]}`, `{"pages": [...]}` or a bare array,
/// whose items are URL strings or objects with `url` and optional
/// `priority` and `reasoning`. Relative URLs resolve against `base_url`.
pub fn parse_selection(
    text: &str,
    candidates: &CandidateSet,
    base_url: &Url,
    max_pages: usize,
) -> Vec<SelectedPage> {
    let Some(value) = find_json_value(text, is_selection_shaped) else {
        return Vec::new();
    };

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map
            .remove("selected_pages")
            .or_else(|| map.remove("pages"))
            .or_else(|| map.remove("urls"))
        {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut picked: Vec<(String, Option<f64>, Option<String>)> = Vec::new();
    for item in items {
        if picked.len() >= max_pages {
            break;
        }
        let (raw_url, priority, reasoning) = match item {
            Value::String(url) => (url, None, None),
            Value::Object(map) => {
                let Some(url) = map.get("url").and_then(Value::as_str) else {
                    continue;
                };
                let priority = map
                    .get("priority")
                    .or_else(|| map.get("priority_score"))
                    .and_then(Value::as_f64);
                let reasoning = map
                    .get("reasoning")
                    .or_else(|| map.get("reason"))
                    .and_then(Value::as_str)
                    .map(str::to_string);
                (url.to_string(), priority, reasoning)
            }
            _ => continue,
        };

        let Some(url) = base_url
            .join(raw_url.trim())
            .ok()
            .and_then(|u| candidate_url(u.as_str(), base_url))
        else {
            continue;
        };
        if !candidates.contains(&url) {
            debug!(url = %url, "LLM selected a URL that was not discovered");
            continue;
        }
        if seen.insert(url.clone()) {
            picked.push((url, priority, reasoning));
        }
    }

    let total = picked.len();
    picked
        .into_iter()
        .enumerate()
        .map(|(rank, (url, priority, reasoning))| {
            let score = priority.unwrap_or((total - rank) as f64 / total as f64);
            let page = SelectedPage::new(url, score);
            match reasoning {
                Some(r) => page.with_reasoning(r),
                None => page,
            }
        })
        .collect()
}

/// A page list: an array holding URL strings or objects, or an object
/// wrapping one.
fn is_selection_shaped(value: &Value) -> bool {
    let lists_pages =
        |items: &Vec<Value>| items.iter().any(|item| item.is_string() || item.is_object());
    match value {
        Value::Array(items) => lists_pages(items),
        Value::Object(map) => ["selected_pages", "pages", "urls"]
            .iter()
            .any(|key| matches!(map.get(*key), Some(Value::Array(items)) if lists_pages(items))),
        _ => false,
    }
}
