//! Keyword-scored page selection used when the LLM cannot be.

use tracing::warn;

use crate::types::{
    link::CandidateSet,
    selection::{PageSelection, SelectedPage, SelectionMethod},
};

/// Rank candidates by keyword weight on their lowercased URL path.
///
/// A candidate's score is the sum of the weights of every keyword its path
/// contains. The sort is stable, so equal scores keep discovery order. When
/// nothing scores, the first `max_pages` candidates in discovery order are
/// returned as `SelectionMethod::HeuristicUnscored`.
pub fn heuristic_select(
    candidates: &CandidateSet,
    keywords: &[(String, u32)],
    max_pages: usize,
) -> PageSelection {
    let mut scored: Vec<(&str, u32, Vec<&str>)> = candidates
        .iter()
        .map(|link| {
            let path = link.path_lowercase();
            let matched: Vec<(&str, u32)> = keywords
                .iter()
                .filter(|(keyword, _)| path.contains(keyword.as_str()))
                .map(|(keyword, weight)| (keyword.as_str(), *weight))
                .collect();
            let score = matched.iter().map(|(_, weight)| weight).sum();
            let names = matched.into_iter().map(|(keyword, _)| keyword).collect();
            (link.url.as_str(), score, names)
        })
        .collect();

    let any_scored = scored.iter().any(|(_, score, _)| *score > 0);
    scored.sort_by(|a, b| b.1.cmp(&a.1));

    let pages = scored
        .into_iter()
        .take(max_pages)
        .map(|(url, score, matched)| {
            let page = SelectedPage::new(url, score as f64);
            if matched.is_empty() {
                page.with_reasoning("no keyword match")
            } else {
                page.with_reasoning(format!("matched keywords: {}", matched.join(", ")))
            }
        })
        .collect();

    let method = if any_scored {
        SelectionMethod::Heuristic
    } else {
        if !candidates.is_empty() {
            warn!(
                candidates = candidates.len(),
                "No candidate matched a priority keyword; selecting in discovery order"
            );
        }
        SelectionMethod::HeuristicUnscored
    };

    PageSelection::new(pages, method)
}
