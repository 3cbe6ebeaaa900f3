//! Command-line interface definitions for Polaris Digest.
//!
//! Global options select the config file and the oracle API key; the
//! subcommand picks the fresh `curate` path or the `merge` path over
//! persisted per-bucket files.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the Polaris Digest application.
///
/// # Examples
///
/// ```sh
/// # Fresh run over today's batch
/// polaris_digest curate -i ./batch.json -o ./out
///
/// # Re-select from per-bucket files of an earlier run
/// polaris_digest merge -b ./out/2025-05-06/categorized -o ./selected.json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the curation config (taxonomy, oracle, scoring)
    #[arg(short, long, global = true, default_value = "config/curation.yaml")]
    pub config: PathBuf,

    /// API key for the oracle endpoint; overrides `oracle.api_key` in the config
    #[arg(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify, score and select over a batch of acquired articles
    Curate {
        /// JSON array of articles produced by the acquisition stage
        #[arg(short, long)]
        input: PathBuf,

        /// Base directory for run outputs; a dated subdirectory is created
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,
    },
    /// Select one article per bucket from persisted per-bucket files
    Merge {
        /// Directory holding `<region>_<category>.json` files
        #[arg(short, long)]
        bucket_dir: PathBuf,

        /// Where to write the merged selection
        #[arg(short, long)]
        output: PathBuf,
    },
}
