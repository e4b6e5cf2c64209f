//! Aggregated multi-page corpus.

use serde::{Deserialize, Serialize};

/// One page's contribution to the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusSection {
    pub url: String,

    /// Characters this section occupies, header included
    pub chars: usize,
}

/// Concatenated text of the successfully fetched pages, size-capped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedCorpus {
    pub text: String,

    /// Included sections in priority order
    pub sections: Vec<CorpusSection>,

    /// Ok pages left out because the cap was reached
    pub dropped_urls: Vec<String>,

    /// Character count of `text`
    pub char_count: usize,
}

impl AggregatedCorpus {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// URLs whose text made it into the corpus.
    pub fn source_urls(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.url.clone()).collect()
    }

    /// True when the cap forced pages out.
    pub fn budget_exceeded(&self) -> bool {
        !self.dropped_urls.is_empty()
    }
}
