//! Final structured output of a research run.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::FieldSchema;

/// Field values keyed by schema field name, in schema order.
///
/// Every schema field is present; unextractable values are `Value::Null`.
pub type CompanyFields = IndexMap<String, Value>;

/// Business facts extracted for one company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub company_name: String,
    pub website: String,

    /// One entry per schema field
    pub fields: CompanyFields,

    /// Pages whose text fed the extraction, in priority order
    #[serde(default)]
    pub source_urls: Vec<String>,

    pub researched_at: DateTime<Utc>,
}

impl CompanyRecord {
    /// A record with every schema field set to null.
    pub fn empty(
        company_name: impl Into<String>,
        website: impl Into<String>,
        schema: &FieldSchema,
    ) -> Self {
        let fields = schema
            .names()
            .map(|name| (name.to_string(), Value::Null))
            .collect();
        Self::with_fields(company_name, website, fields)
    }

    /// A record built from already-normalized fields.
    pub fn with_fields(
        company_name: impl Into<String>,
        website: impl Into<String>,
        fields: CompanyFields,
    ) -> Self {
        Self {
            company_name: company_name.into(),
            website: website.into(),
            fields,
            source_urls: Vec::new(),
            researched_at: Utc::now(),
        }
    }

    pub fn with_source_urls(mut self, urls: Vec<String>) -> Self {
        self.source_urls = urls;
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Number of fields holding a value.
    pub fn populated_count(&self) -> usize {
        self.fields.values().filter(|v| !v.is_null()).count()
    }

    /// True when no field holds a value.
    pub fn is_blank(&self) -> bool {
        self.populated_count() == 0
    }

    /// Text used to embed the record for similarity search.
    pub fn embedding_text(&self) -> String {
        let mut lines = vec![format!("Company: {}", self.company_name)];
        for (name, value) in &self.fields {
            let rendered = match value {
                Value::Null => continue,
                Value::String(s) => s.clone(),
                Value::Array(items) => items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(", "),
                other => other.to_string(),
            };
            lines.push(format!("{}: {}", name, rendered));
        }
        lines.join("\n")
    }

    /// Flat metadata for a vector store upsert.
    pub fn metadata(&self) -> serde_json::Map<String, Value> {
        let mut meta = serde_json::Map::new();
        meta.insert("company_name".into(), Value::String(self.company_name.clone()));
        meta.insert("website".into(), Value::String(self.website.clone()));
        meta.insert(
            "researched_at".into(),
            Value::String(self.researched_at.to_rfc3339()),
        );
        for (name, value) in &self.fields {
            if !value.is_null() {
                meta.insert(name.clone(), value.clone());
            }
        }
        meta
    }
}
