//! Utility functions for log formatting, file naming and output directories.

use chrono::Local;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary) with
/// an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// File-name-safe slug for a label.
///
/// Lowercases, turns `&` into `and`, drops other punctuation and joins words
/// with underscores.
///
/// ```ignore
/// assert_eq!(slugify("East Asia"), "east_asia");
/// assert_eq!(slugify("Applied AI & FinTech"), "applied_ai_and_fintech");
/// ```
pub fn slugify(label: &str) -> String {
    label
        .to_lowercase()
        .replace('&', " and ")
        .replace(|c: char| !c.is_alphanumeric() && !c.is_whitespace() && c != '_', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Per-bucket file name, e.g. `east_asia_fintech.json`.
pub fn bucket_file_name(region: &str, category: &str) -> String {
    format!("{}_{}.json", slugify(region), slugify(category))
}

/// Today's local date in `YYYY-MM-DD` format, used to name the run directory.
pub fn local_date() -> String {
    Local::now().date_naive().to_string()
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and deletes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
