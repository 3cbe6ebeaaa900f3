//! # Polaris Digest
//!
//! A news curation pipeline that takes an already acquired batch of
//! articles, asks an LLM relevance oracle to classify each one, and picks one
//! top article per (region, category) bucket for downstream summarization.
//!
//! ## Features
//!
//! - Bounded-concurrency classification over an OpenAI-compatible API
//! - Throttling-aware retry with exponential backoff and per-call timeouts
//! - Tolerant parsing of noisy model output
//! - Keyword × source-weight scoring on top of the model's own score
//! - Taxonomy label normalization and one-per-bucket selection with placeholders
//!
//! ## Usage
//!
//! ```sh
//! polaris_digest curate -i ./batch.json -o ./out
//! polaris_digest merge -b ./out/2025-05-06/categorized -o ./selected.json
//! ```
//!
//! ## Architecture
//!
//! 1. **Loading**: read config and taxonomy, then the article batch
//! 2. **Classifying**: fan the batch out to the oracle, at most N calls at a time
//! 3. **Scoring & normalizing**: combine scores, canonicalize labels
//! 4. **Selecting**: one article per bucket, placeholders for empty buckets
//! 5. **Output**: classified dump, per-bucket files and the selection as JSON

use clap::Parser;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod inputs;
mod models;
mod outputs;
mod pipeline;
mod prompt;
mod taxonomy;
mod utils;

use api::{HttpOracle, OracleClient, RetryPolicy};
use cli::{Cli, Command};
use config::CurationConfig;
use outputs::json;
use pipeline::Pipeline;
use pipeline::orchestrator::Orchestrator;
use pipeline::scorer::Scorer;
use pipeline::select::merge_first_wins;
use prompt::PromptTemplate;
use utils::{ensure_writable_dir, local_date};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("polaris_digest starting up");

    let args = Cli::parse();
    debug!(config = %args.config.display(), command = ?args.command, "Parsed CLI arguments");

    let config = match CurationConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %args.config.display(), error = %e, "Cannot load curation config");
            return Err(e.into());
        }
    };

    match args.command {
        Command::Curate { input, output_dir } => {
            curate(&config, args.api_key, &input, &output_dir).await?;
        }
        Command::Merge { bucket_dir, output } => {
            merge(&config, &bucket_dir, &output).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

#[instrument(level = "info", skip_all, fields(input = %input.display()))]
async fn curate(
    config: &CurationConfig,
    api_key: Option<String>,
    input: &Path,
    output_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let articles = match inputs::load_articles(input).await {
        Ok(articles) => articles,
        Err(e) => {
            error!(path = %input.display(), error = %e, "Cannot read article batch");
            return Err(e);
        }
    };

    let transport = HttpOracle::new(&config.oracle, api_key)?;
    if config.oracle.probe_on_startup {
        if let Err(e) = transport.probe().await {
            error!(error = %e, "Oracle startup check failed; aborting before any article is processed");
            return Err(e.into());
        }
    }

    let prompt = PromptTemplate::new(
        config.oracle.prompt.as_deref(),
        &config.taxonomy,
        config.oracle.max_content_words,
    );
    let client = OracleClient::new(transport, RetryPolicy::from(&config.oracle), prompt);
    let pipeline = Pipeline::new(
        Orchestrator::new(config.oracle.concurrency),
        client,
        Scorer::from(&config.scoring),
        config.taxonomy.clone(),
        config.placeholder.clone(),
    );

    let report = pipeline.curate(&articles).await;
    let run_dir = json::write_report(&report, output_dir, &local_date()).await?;
    info!(run_dir = %run_dir.display(), "Curation outputs ready");
    Ok(())
}

#[instrument(level = "info", skip_all, fields(bucket_dir = %bucket_dir.display()))]
async fn merge(config: &CurationConfig, bucket_dir: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let articles = inputs::load_bucket_files(bucket_dir, &config.taxonomy).await?;
    let selection = merge_first_wins(articles, &config.taxonomy, &config.placeholder);
    info!(
        buckets = selection.len(),
        placeholders = selection.iter().filter(|e| e.is_placeholder()).count(),
        "Merged bucket files"
    );
    json::write_selection(output, &selection).await
}
