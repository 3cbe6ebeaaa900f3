//! JSON output for downstream summarization and delivery.
//!
//! Files are grouped under a directory named after the local date of the run:
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── classified_articles.json
//!     ├── rejected_articles.json
//!     ├── selected_articles.json
//!     └── categorized/<region>_<category>.json
//! ```
//!
//! The per-bucket files hold every candidate of a bucket, best first. They
//! are the input of the `merge` subcommand.

use crate::models::{Article, BucketKey, CuratedEntry};
use crate::pipeline::CurationReport;
use crate::utils::bucket_file_name;
use serde::Serialize;
use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

pub const CLASSIFIED_FILE: &str = "classified_articles.json";
pub const REJECTED_FILE: &str = "rejected_articles.json";
pub const SELECTED_FILE: &str = "selected_articles.json";
pub const CATEGORIZED_DIR: &str = "categorized";

/// Serialize `value` as pretty JSON to `path`, creating parent directories.
pub async fn write_json<T>(path: &Path, value: &T) -> Result<(), Box<dyn Error>>
where
    T: Serialize + ?Sized,
{
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }
    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote JSON");
    Ok(())
}

/// Write one file per non-empty bucket into `dir`.
pub async fn write_buckets(dir: &Path, buckets: &[(BucketKey, Vec<Article>)]) -> Result<usize, Box<dyn Error>> {
    let mut written = 0;
    for (key, articles) in buckets.iter().filter(|(_, a)| !a.is_empty()) {
        let path = dir.join(bucket_file_name(&key.region, &key.category));
        write_json(&path, articles).await?;
        written += 1;
    }
    Ok(written)
}

pub async fn write_selection(path: &Path, selection: &[CuratedEntry]) -> Result<(), Box<dyn Error>> {
    write_json(path, selection).await
}

/// Write every artifact of a fresh run under `<output_dir>/<date>/`.
///
/// Returns the dated run directory.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir.display(), date = %date))]
pub async fn write_report(
    report: &CurationReport,
    output_dir: &Path,
    date: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let run_dir = output_dir.join(date);
    info!(run_dir = %run_dir.display(), "Ensuring run directory exists");
    fs::create_dir_all(&run_dir).await?;

    write_json(&run_dir.join(CLASSIFIED_FILE), &report.classified).await?;
    write_json(&run_dir.join(REJECTED_FILE), &report.rejected).await?;
    let buckets = write_buckets(&run_dir.join(CATEGORIZED_DIR), &report.buckets).await?;
    write_selection(&run_dir.join(SELECTED_FILE), &report.selection).await?;

    info!(
        classified = report.classified.len(),
        rejected = report.rejected.len(),
        bucket_files = buckets,
        selected = report.selection.iter().filter(|e| !e.is_placeholder()).count(),
        "Wrote run outputs"
    );
    Ok(run_dir)
}
