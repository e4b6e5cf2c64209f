//! Business-fact extraction from the aggregated corpus.
//!
//! One LLM call per company. The answer is parsed defensively: whatever
//! the model returns, the result holds exactly the schema's fields, with
//! `null` for anything missing or unusable.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::prompts::format_extract_facts_prompt;
use super::response::find_json_value;
use crate::error::{ErrorKind, LlmError};
use crate::traits::llm::LlmProvider;
use crate::types::{
    config::ExtractionConfig,
    corpus::AggregatedCorpus,
    record::{CompanyFields, CompanyRecord},
    schema::{FieldSchema, FieldType},
};

/// Strings models use to mean "no value".
const PLACEHOLDERS: &[&str] = &[
    "", "n/a", "na", "unknown", "not found", "null", "none", "not available", "not specified",
    "not mentioned", "-",
];

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap());

/// Why extraction produced no fields.
#[derive(Debug, Clone, Error)]
pub enum ExtractionFailure {
    #[error("corpus is empty")]
    EmptyCorpus,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("unparseable LLM response: {0}")]
    Unparseable(String),
}

impl ExtractionFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionFailure::EmptyCorpus => ErrorKind::Empty,
            ExtractionFailure::Llm(e) => e.kind(),
            ExtractionFailure::Unparseable(_) => ErrorKind::Parse,
        }
    }
}

/// Outcome of an extraction attempt.
#[derive(Debug, Clone)]
pub enum ParseResult {
    /// Every schema field, in schema order (possibly all null)
    Success(CompanyFields),
    Failure(ExtractionFailure),
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ParseResult::Success(_))
    }

    pub fn failure(&self) -> Option<&ExtractionFailure> {
        match self {
            ParseResult::Success(_) => None,
            ParseResult::Failure(f) => Some(f),
        }
    }

    /// Build a record holding every schema field; failures are all null.
    pub fn into_record(
        self,
        company_name: impl Into<String>,
        website: impl Into<String>,
        schema: &FieldSchema,
    ) -> CompanyRecord {
        match self {
            ParseResult::Success(mut fields) => {
                let complete = schema
                    .names()
                    .map(|name| (name.to_string(), fields.swap_remove(name).unwrap_or(Value::Null)))
                    .collect();
                CompanyRecord::with_fields(company_name, website, complete)
            }
            ParseResult::Failure(_) => CompanyRecord::empty(company_name, website, schema),
        }
    }
}

/// Extracts schema fields from a corpus with one LLM call.
pub struct FactExtractor<L: LlmProvider> {
    llm: L,
    config: ExtractionConfig,
}

impl<L: LlmProvider> FactExtractor<L> {
    pub fn new(llm: L, config: ExtractionConfig) -> Self {
        Self { llm, config }
    }

    pub async fn extract(&self, corpus: &AggregatedCorpus, schema: &FieldSchema) -> ParseResult {
        if corpus.is_empty() {
            debug!("Skipping extraction of empty corpus");
            return ParseResult::Failure(ExtractionFailure::EmptyCorpus);
        }

        let prompt = format_extract_facts_prompt(schema, &corpus.text);
        let timeout = self.config.llm_timeout();

        let answer = match tokio::time::timeout(timeout, self.llm.complete(&prompt, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout { after: timeout }),
        };

        let text = match answer {
            Ok(text) => text,
            Err(e) => {
                warn!(provider = self.llm.name(), error = %e, "Extraction LLM call failed");
                return ParseResult::Failure(e.into());
            }
        };

        match parse_fields(&text, schema) {
            Ok(fields) => {
                let populated = fields.values().filter(|v| !v.is_null()).count();
                info!(populated, fields = schema.len(), "Business facts extracted");
                ParseResult::Success(fields)
            }
            Err(reason) => {
                warn!(reason = %reason, response_len = text.len(), "Could not parse extraction response");
                ParseResult::Failure(ExtractionFailure::Unparseable(reason))
            }
        }
    }
}

/// Parse an extraction answer into exactly the schema's fields.
///
/// Fails only when no JSON object can be found.
pub fn parse_fields(text: &str, schema: &FieldSchema) -> Result<CompanyFields, String> {
    let mut object = match find_json_value(text, holds_object) {
        Some(Value::Object(map)) => map,
        Some(Value::Array(items)) => match items.into_iter().next() {
            Some(Value::Object(map)) => map,
            _ => return Err("no JSON object in response".to_string()),
        },
        _ => return Err("no JSON object in response".to_string()),
    };

    // {"fields": {...}} wrapper, unless "fields" is itself a schema field
    if schema.get("fields").is_none() {
        if let Some(Value::Object(inner)) = object.remove("fields") {
            object = inner;
        }
    }

    let mut fields = CompanyFields::new();
    for spec in schema.fields() {
        let raw = take_field(&mut object, &spec.name).unwrap_or(Value::Null);
        fields.insert(spec.name.clone(), coerce(raw, spec.field_type));
    }

    let extra: Vec<&String> = object.keys().collect();
    if !extra.is_empty() {
        debug!(extra = ?extra, "Dropping keys not in schema");
    }
    Ok(fields)
}

/// An object, or an array whose first item is one.
fn holds_object(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => items.first().is_some_and(Value::is_object),
        _ => false,
    }
}

/// Remove a key, matching exactly first and then loosely
/// (case, spaces and hyphens ignored).
fn take_field(object: &mut Map<String, Value>, name: &str) -> Option<Value> {
    if let Some(value) = object.remove(name) {
        return Some(value);
    }
    let wanted = loose_key(name);
    let key = object.keys().find(|k| loose_key(k) == wanted)?.clone();
    object.remove(&key)
}

fn loose_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

fn is_placeholder(s: &str) -> bool {
    PLACEHOLDERS.contains(&s.trim().to_lowercase().as_str())
}

/// Coerce a raw value to a field type, or `null` when it cannot be.
pub fn coerce(value: Value, field_type: FieldType) -> Value {
    if let Value::String(s) = &value {
        if is_placeholder(s) {
            return Value::Null;
        }
    }

    match field_type {
        FieldType::Text => coerce_text(value),
        FieldType::Number => coerce_number(value),
        FieldType::Boolean => coerce_boolean(value),
        FieldType::List => coerce_list(value),
    }
}

fn coerce_text(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(if b { "Yes" } else { "No" }.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.into_iter().filter_map(render_item).collect();
            if parts.is_empty() {
                Value::Null
            } else {
                Value::String(parts.join(", "))
            }
        }
        Value::Object(map) => render_object(&map).map(Value::String).unwrap_or(Value::Null),
        Value::Null => Value::Null,
    }
}

fn coerce_number(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::Number(n),
        Value::String(s) => parse_number(&s).unwrap_or(Value::Null),
        Value::Array(items) if items.len() == 1 => {
            items.into_iter().next().map(coerce_number).unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn parse_number(s: &str) -> Option<Value> {
    let token = NUMBER_PATTERN.find(s)?.as_str().replace(',', "");
    if let Ok(i) = token.parse::<i64>() {
        return Some(Value::from(i));
    }
    token
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
}

fn coerce_boolean(value: Value) -> Value {
    match value {
        Value::Bool(b) => Value::Bool(b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "yes" | "y" | "true" | "1" => Value::Bool(true),
            "no" | "n" | "false" | "0" => Value::Bool(false),
            _ => Value::Null,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Value::Bool(true),
            Some(0) => Value::Bool(false),
            _ => Value::Null,
        },
        _ => Value::Null,
    }
}

fn coerce_list(value: Value) -> Value {
    let items: Vec<String> = match value {
        Value::Array(items) => items.into_iter().filter_map(render_item).collect(),
        Value::String(s) => s
            .split([',', ';', '\n'])
            .map(str::trim)
            .filter(|part| !is_placeholder(part))
            .map(str::to_string)
            .collect(),
        Value::Number(n) => vec![n.to_string()],
        Value::Object(map) => render_object(&map).into_iter().collect(),
        Value::Bool(_) | Value::Null => Vec::new(),
    };

    if items.is_empty() {
        Value::Null
    } else {
        Value::Array(items.into_iter().map(Value::String).collect())
    }
}

/// Render one list item as text, skipping empties and placeholders.
fn render_item(item: Value) -> Option<String> {
    match item {
        Value::String(s) if is_placeholder(&s) => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => render_object(&map),
        Value::Array(_) | Value::Null => None,
    }
}

/// `key: value` pairs joined with `; `, skipping nulls and placeholders.
fn render_object(map: &Map<String, Value>) -> Option<String> {
    let parts: Vec<String> = map
        .iter()
        .filter_map(|(k, v)| render_item(v.clone()).map(|v| format!("{}: {}", k, v)))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}
