//! Corpus aggregation under a total character cap.

use tracing::{debug, info};

use crate::types::{
    config::AggregationConfig,
    corpus::{AggregatedCorpus, CorpusSection},
    page::PageContent,
};

/// Separator between sections.
const SECTION_SEPARATOR: &str = "\n\n";

/// Header line that opens each section.
pub fn section_header(url: &str) -> String {
    format!("=== SOURCE: {} ===", url)
}

/// Joins fetched page texts into one bounded corpus.
#[derive(Debug, Clone, Default)]
pub struct ContentAggregator {
    config: AggregationConfig,
}

impl ContentAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    /// Concatenate `Ok` pages in rank order.
    ///
    /// Sections are added whole; the first one that would push the corpus
    /// past `max_corpus_chars` stops aggregation, and it and every lower
    /// ranked page are recorded as dropped.
    pub fn aggregate(&self, pages: &[PageContent]) -> AggregatedCorpus {
        let max_chars = self.config.max_corpus_chars;

        let mut ok_pages: Vec<&PageContent> = pages
            .iter()
            .filter(|p| p.is_ok() && !p.extracted_text.is_empty())
            .collect();
        ok_pages.sort_by_key(|p| p.rank);

        let separator_chars = SECTION_SEPARATOR.chars().count();
        let mut corpus = AggregatedCorpus::default();

        for (i, page) in ok_pages.iter().enumerate() {
            let header = section_header(&page.url);
            let section_chars = header.chars().count() + 1 + page.char_count();
            let cost = section_chars + if corpus.sections.is_empty() { 0 } else { separator_chars };

            if corpus.char_count + cost > max_chars {
                corpus.dropped_urls = ok_pages[i..].iter().map(|p| p.url.clone()).collect();
                debug!(
                    url = %page.url,
                    section_chars,
                    used = corpus.char_count,
                    max_chars,
                    dropped = corpus.dropped_urls.len(),
                    "Corpus cap reached"
                );
                break;
            }

            if !corpus.sections.is_empty() {
                corpus.text.push_str(SECTION_SEPARATOR);
            }
            corpus.text.push_str(&header);
            corpus.text.push('\n');
            corpus.text.push_str(&page.extracted_text);
            corpus.char_count += cost;
            corpus.sections.push(CorpusSection {
                url: page.url.clone(),
                chars: section_chars,
            });
        }

        info!(
            sections = corpus.sections.len(),
            chars = corpus.char_count,
            dropped = corpus.dropped_urls.len(),
            "Corpus aggregated"
        );
        corpus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::FetchStatus;
    use proptest::prelude::*;

    fn aggregator(max: usize) -> ContentAggregator {
        ContentAggregator::new(AggregationConfig { max_corpus_chars: max })
    }

    #[test]
    fn test_orders_by_rank_and_skips_failures() {
        let pages = vec![
            PageContent::ok("https://acme.test/b", 1, "Second"),
            PageContent::failed("https://acme.test/x", 2, FetchStatus::Timeout),
            PageContent::ok("https://acme.test/a", 0, "First"),
        ];

        let corpus = aggregator(10_000).aggregate(&pages);

        assert_eq!(
            corpus.text,
            "=== SOURCE: https://acme.test/a ===\nFirst\n\n=== SOURCE: https://acme.test/b ===\nSecond"
        );
        assert_eq!(corpus.char_count, corpus.text.chars().count());
        assert_eq!(corpus.source_urls(), vec!["https://acme.test/a", "https://acme.test/b"]);
        assert!(!corpus.budget_exceeded());
    }

    #[test]
    fn test_stops_at_first_section_that_does_not_fit() {
        let pages = vec![
            PageContent::ok("https://acme.test/a", 0, "a".repeat(50)),
            PageContent::ok("https://acme.test/b", 1, "b".repeat(500)),
            PageContent::ok("https://acme.test/c", 2, "c"),
        ];
        let first_section = section_header("https://acme.test/a").chars().count() + 1 + 50;

        let corpus = aggregator(first_section + 100).aggregate(&pages);

        assert_eq!(corpus.source_urls(), vec!["https://acme.test/a"]);
        // the small page after the oversized one is dropped too
        assert_eq!(corpus.dropped_urls, vec!["https://acme.test/b", "https://acme.test/c"]);
        assert!(corpus.budget_exceeded());
    }

    #[test]
    fn test_no_ok_pages_is_empty() {
        let pages = vec![PageContent::failed("https://acme.test/a", 0, FetchStatus::HttpError)];

        let corpus = aggregator(100).aggregate(&pages);

        assert!(corpus.is_empty());
        assert_eq!(corpus.char_count, 0);
        assert!(corpus.text.is_empty());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let pages = vec![PageContent::ok("https://acme.test/ü", 0, "héllo")];
        let corpus = aggregator(10_000).aggregate(&pages);
        assert_eq!(corpus.char_count, corpus.text.chars().count());
    }

    proptest! {
        #[test]
        fn prop_corpus_respects_cap_and_priority(
            texts in proptest::collection::vec("[a-zé ]{1,300}", 0..15),
            max in 0usize..3000,
        ) {
            let pages: Vec<PageContent> = texts
                .iter()
                .enumerate()
                .map(|(i, t)| PageContent::ok(format!("https://acme.test/{}", i), i, t.clone()))
                .collect();

            let corpus = aggregator(max).aggregate(&pages);

            prop_assert!(corpus.char_count <= max);
            prop_assert_eq!(corpus.char_count, corpus.text.chars().count());

            // included pages are a prefix of the ranked list
            let included = corpus.sections.len();
            for (i, section) in corpus.sections.iter().enumerate() {
                prop_assert_eq!(&section.url, &format!("https://acme.test/{}", i));
                let header = section_header(&section.url);
                prop_assert!(corpus.text.contains(&header));
            }
            prop_assert_eq!(included + corpus.dropped_urls.len(), pages.len());
        }
    }
}
