//! Business-fact field schema.
//!
//! The schema is configuration input: an ordered list of fields the
//! extractor must attempt to populate. Validation happens once, when the
//! schema is built, so the pipeline can rely on unique non-blank names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ResearchError, Result};

/// Expected value shape for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    List,
}

impl FieldType {
    /// Short label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            FieldType::Text => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::List => "list of strings",
        }
    }
}

/// One field the extractor should populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: FieldType,
}

fn default_field_type() -> FieldType {
    FieldType::Text
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            field_type,
        }
    }

    pub fn text(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, FieldType::Text)
    }

    pub fn number(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, FieldType::Number)
    }

    pub fn list(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, FieldType::List)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, FieldType::Boolean)
    }
}

/// Validated, ordered list of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct FieldSchema {
    fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Build a schema, rejecting empty lists and blank or duplicate names.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self> {
        if fields.is_empty() {
            return Err(ResearchError::InvalidSchema {
                reason: "schema has no fields".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for field in &fields {
            let name = field.name.trim();
            if name.is_empty() {
                return Err(ResearchError::InvalidSchema {
                    reason: "field name is blank".to_string(),
                });
            }
            if name != field.name {
                return Err(ResearchError::InvalidSchema {
                    reason: format!("field name has surrounding whitespace: {:?}", field.name),
                });
            }
            if !seen.insert(name.to_string()) {
                return Err(ResearchError::InvalidSchema {
                    reason: format!("duplicate field: {}", name),
                });
            }
        }

        Ok(Self { fields })
    }

    /// Parse a JSON array of field specs.
    pub fn from_json(json: &str) -> Result<Self> {
        let fields: Vec<FieldSpec> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    /// The standard company profile fields.
    pub fn business_defaults() -> Self {
        Self {
            fields: vec![
                FieldSpec::text("company_description", "One-paragraph description of what the company does"),
                FieldSpec::text("industry", "Primary industry or sector"),
                FieldSpec::text("business_model", "How the company makes money (B2B, B2C, SaaS, marketplace, services)"),
                FieldSpec::text("target_market", "Customers or segments the company sells to"),
                FieldSpec::list("key_services", "Main products or services offered"),
                FieldSpec::text("value_proposition", "What differentiates the company from competitors"),
                FieldSpec::list("leadership_team", "Named executives or founders with their titles"),
                FieldSpec::number("founding_year", "Year the company was founded"),
                FieldSpec::text("company_size", "Employee count or size range"),
                FieldSpec::text("location", "Headquarters city and country"),
                FieldSpec::text("contact_info", "Public email, phone or contact page details"),
                FieldSpec::boolean("has_job_listings", "Whether the site advertises open positions"),
                FieldSpec::list("tech_stack", "Technologies, platforms or tools the company mentions using"),
            ],
        }
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldSpec>> for FieldSchema {
    type Error = ResearchError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self> {
        Self::new(fields)
    }
}

impl From<FieldSchema> for Vec<FieldSpec> {
    fn from(schema: FieldSchema) -> Self {
        schema.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_schema() {
        assert!(FieldSchema::new(vec![]).is_err());
    }

    #[test]
    fn test_rejects_duplicates_and_blanks() {
        let dup = FieldSchema::new(vec![
            FieldSpec::text("industry", "a"),
            FieldSpec::text("industry", "b"),
        ]);
        assert!(matches!(dup, Err(ResearchError::InvalidSchema { .. })));

        let blank = FieldSchema::new(vec![FieldSpec::text("  ", "a")]);
        assert!(blank.is_err());
    }

    #[test]
    fn test_from_json_defaults_type_to_text() {
        let schema = FieldSchema::from_json(
            r#"[
                {"name": "industry", "description": "Sector"},
                {"name": "founding_year", "description": "Year", "type": "number"}
            ]"#,
        )
        .unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.fields()[0].field_type, FieldType::Text);
        assert_eq!(schema.get("founding_year").unwrap().field_type, FieldType::Number);
    }

    #[test]
    fn test_deserialize_validates() {
        let result: std::result::Result<FieldSchema, _> = serde_json::from_str("[]");
        assert!(result.is_err());
    }

    #[test]
    fn test_business_defaults_are_valid() {
        let defaults = FieldSchema::business_defaults();
        assert!(FieldSchema::new(defaults.fields().to_vec()).is_ok());
        assert!(defaults.get("industry").is_some());
    }
}
