//! LLM prompts for page selection and fact extraction.

use sha2::{Digest, Sha256};

use crate::types::schema::FieldSchema;

/// Prompt for choosing which discovered pages to read.
pub const SELECT_PAGES_PROMPT: &str = r#"You are choosing pages from a company website to research the company.

Website: {website}

We need to fill in these fields:
{fields}

Candidate pages (one URL per line):
{candidates}

Pick at most {max_pages} pages most likely to contain the information above.
Prefer about, team, leadership, contact, careers, services and product pages.
Use only URLs from the candidate list.

Output JSON, best page first:
{
    "selected_pages": [
        {
            "url": "https://...",
            "priority": 0.0 to 1.0,
            "reasoning": "what this page should tell us"
        }
    ]
}"#;

/// Prompt for extracting business facts from the aggregated corpus.
pub const EXTRACT_FACTS_PROMPT: &str = r#"Extract business facts about a company from the website text below.

Fields to extract:
{fields}

Rules:
1. Use only information stated in the text
2. Use null for anything the text does not state
3. Lists are JSON arrays of strings; numbers are JSON numbers; booleans are true or false

Output one JSON object with exactly these keys: {keys}

Website text:
{corpus}"#;

/// Hash of both prompt templates, logged so runs can be tied to a prompt version.
pub fn prompt_version() -> String {
    let mut hasher = Sha256::new();
    hasher.update(SELECT_PAGES_PROMPT.as_bytes());
    hasher.update(EXTRACT_FACTS_PROMPT.as_bytes());
    format!("{:x}", hasher.finalize())[..12].to_string()
}

/// Render schema fields as `- name (type): description` lines.
pub fn format_fields(schema: &FieldSchema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| format!("- {} ({}): {}", f.name, f.field_type.label(), f.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the page selection prompt.
pub fn format_select_pages_prompt<'a>(
    website: &str,
    candidates: impl IntoIterator<Item = &'a str>,
    schema: &FieldSchema,
    max_pages: usize,
) -> String {
    let candidates_text = candidates.into_iter().collect::<Vec<_>>().join("\n");

    SELECT_PAGES_PROMPT
        .replace("{website}", website)
        .replace("{fields}", &format_fields(schema))
        .replace("{max_pages}", &max_pages.to_string())
        .replace("{candidates}", &candidates_text)
}

/// Format the extraction prompt.
pub fn format_extract_facts_prompt(schema: &FieldSchema, corpus: &str) -> String {
    let keys = schema.names().collect::<Vec<_>>().join(", ");

    EXTRACT_FACTS_PROMPT
        .replace("{fields}", &format_fields(schema))
        .replace("{keys}", &keys)
        .replace("{corpus}", corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::FieldSpec;

    fn schema() -> FieldSchema {
        FieldSchema::new(vec![
            FieldSpec::text("industry", "Primary sector"),
            FieldSpec::list("key_services", "Main services"),
        ])
        .unwrap()
    }

    #[test]
    fn test_prompt_version_is_stable() {
        assert_eq!(prompt_version(), prompt_version());
        assert_eq!(prompt_version().len(), 12);
    }

    #[test]
    fn test_select_prompt_lists_candidates_and_fields() {
        let prompt = format_select_pages_prompt(
            "https://acme.test/",
            ["https://acme.test/about", "https://acme.test/team"],
            &schema(),
            5,
        );

        assert!(prompt.contains("https://acme.test/about\nhttps://acme.test/team"));
        assert!(prompt.contains("- key_services (list of strings): Main services"));
        assert!(prompt.contains("at most 5 pages"));
    }

    #[test]
    fn test_extract_prompt_inserts_corpus_last() {
        let prompt = format_extract_facts_prompt(&schema(), "text mentioning {fields}");

        assert!(prompt.contains("exactly these keys: industry, key_services"));
        assert!(prompt.ends_with("text mentioning {fields}"));
    }
}
