//! Theodore CLI
//!
//! Researches one company and prints the outcome as JSON.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use theodore::ai::OpenAiProvider;
use theodore::{
    index_record, MemoryVectorStore, RateLimitedHttpClient, ReqwestHttpClient, Researcher,
    RetryingLlm,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "theodore", about = "Research a company from its website")]
pub struct Cli {
    /// Company name
    company: String,

    /// Company website (a bare domain is treated as https)
    website: String,

    /// Chat model (overrides THEODORE_MODEL)
    #[arg(long)]
    model: Option<String>,

    /// OpenAI-compatible base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// JSON research config (overrides THEODORE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON field schema (overrides THEODORE_SCHEMA)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Maximum pages to select
    #[arg(long)]
    max_pages: Option<usize>,

    /// Overall research budget in seconds
    #[arg(long)]
    budget_secs: Option<u64>,

    /// HTTP requests per second across the run
    #[arg(long)]
    requests_per_second: Option<u32>,

    /// Embed the record and store it in the in-memory vector store
    #[arg(long)]
    index: bool,

    /// Print only the record instead of the full outcome
    #[arg(long)]
    record_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,theodore=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?.with_overrides(&cli);
    let research_config = config.research_config(&cli)?;
    let schema = config.schema()?;

    let mut provider = OpenAiProvider::new(config.openai_api_key.clone())
        .with_model(&config.model)
        .with_embedding_model(&config.embedding_model);
    if let Some(url) = &config.openai_base_url {
        provider = provider.with_base_url(url);
    }
    let provider = Arc::new(provider);

    let http = ReqwestHttpClient::with_user_agent(&research_config.discovery.user_agent)
        .context("failed to build HTTP client")?;
    let http = RateLimitedHttpClient::new(http, config.requests_per_second)?;

    tracing::info!(
        model = %config.model,
        schema_fields = schema.len(),
        requests_per_second = config.requests_per_second,
        "Starting research"
    );

    let researcher = Researcher::new(RetryingLlm::new(provider.clone()), http, research_config, schema)?;
    let outcome = researcher.research(&cli.company, &cli.website).await?;

    if cli.index && outcome.is_completed() {
        let store = MemoryVectorStore::new();
        let id = index_record(&outcome.record, provider.as_ref(), &store)
            .await
            .context("failed to index record")?;
        tracing::info!(id = %id, "Record indexed in memory store");
    }

    let json = if cli.record_only {
        serde_json::to_string_pretty(&outcome.record)?
    } else {
        serde_json::to_string_pretty(&outcome)?
    };
    println!("{}", json);

    if !outcome.is_completed() {
        anyhow::bail!("research for {} failed", cli.company);
    }
    Ok(())
}
