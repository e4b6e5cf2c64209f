use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use theodore::{FieldSchema, ResearchConfig};

use crate::Cli;

/// CLI configuration loaded from environment variables, then overridden
/// by command-line flags.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: Option<String>,
    pub model: String,
    pub embedding_model: String,
    pub research_config_path: Option<PathBuf>,
    pub schema_path: Option<PathBuf>,
    pub requests_per_second: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            model: env::var("THEODORE_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_model: env::var("THEODORE_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            research_config_path: env::var("THEODORE_CONFIG").ok().map(PathBuf::from),
            schema_path: env::var("THEODORE_SCHEMA").ok().map(PathBuf::from),
            requests_per_second: env::var("THEODORE_REQUESTS_PER_SECOND")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("THEODORE_REQUESTS_PER_SECOND must be a valid number")?,
        })
    }

    /// Apply flags given on the command line.
    pub fn with_overrides(mut self, cli: &Cli) -> Self {
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(url) = &cli.base_url {
            self.openai_base_url = Some(url.clone());
        }
        if let Some(path) = &cli.config {
            self.research_config_path = Some(path.clone());
        }
        if let Some(path) = &cli.schema {
            self.schema_path = Some(path.clone());
        }
        if let Some(rps) = cli.requests_per_second {
            self.requests_per_second = rps;
        }
        self
    }

    /// Pipeline configuration from the JSON file, or defaults.
    pub fn research_config(&self, cli: &Cli) -> Result<ResearchConfig> {
        let mut config = match &self.research_config_path {
            Some(path) => {
                let json = read(path)?;
                serde_json::from_str(&json)
                    .with_context(|| format!("invalid research config in {}", path.display()))?
            }
            None => ResearchConfig::default(),
        };

        if let Some(max) = cli.max_pages {
            config = config.with_max_pages_to_select(max);
        }
        if let Some(secs) = cli.budget_secs {
            config = config.with_research_budget(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Field schema from the JSON file, or the standard business fields.
    pub fn schema(&self) -> Result<FieldSchema> {
        match &self.schema_path {
            Some(path) => {
                let json = read(path)?;
                FieldSchema::from_json(&json)
                    .with_context(|| format!("invalid field schema in {}", path.display()))
            }
            None => Ok(FieldSchema::business_defaults()),
        }
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
