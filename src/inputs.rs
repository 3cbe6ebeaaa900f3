//! Reading the article batch and persisted per-bucket files.

use crate::models::Article;
use crate::taxonomy::Taxonomy;
use crate::utils::bucket_file_name;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Load the acquired batch: a JSON array of articles.
///
/// Any read or parse failure is returned to the caller; the batch is unusable.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_articles(path: &Path) -> Result<Vec<Article>, Box<dyn Error>> {
    let text = fs::read_to_string(path).await?;
    let articles: Vec<Article> = serde_json::from_str(&text)?;
    info!(count = articles.len(), "Loaded article batch");
    Ok(articles)
}

/// Concatenate the per-bucket files under `dir` in taxonomy order.
///
/// A missing file means an empty bucket. A file that cannot be parsed is
/// skipped with a warning so one bad bucket does not sink the merge.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub async fn load_bucket_files(dir: &Path, taxonomy: &Taxonomy) -> Result<Vec<Article>, Box<dyn Error>> {
    let mut articles = Vec::new();
    let mut files_read = 0usize;

    for key in taxonomy.bucket_keys() {
        let path = dir.join(bucket_file_name(&key.region, &key.category));
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No bucket file");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Vec<Article>>(&text) {
            Ok(mut bucket) => {
                files_read += 1;
                for article in &mut bucket {
                    if article.region.is_none() {
                        article.region = Some(key.region.clone());
                    }
                    if article.category.is_none() {
                        article.category = Some(key.category.clone());
                    }
                }
                articles.append(&mut bucket);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Malformed bucket file; skipping");
            }
        }
    }

    info!(files = files_read, articles = articles.len(), "Loaded bucket files");
    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::sample;
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("polaris_inputs_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_articles() {
        let dir = scratch("batch");
        let path = dir.join("batch.json");
        std::fs::write(
            &path,
            r#"[
                {"title": "A", "content": "body", "source": {"name": "TechCrunch"}, "url": "https://a", "publishedAt": "2025-05-06T08:00:00Z"},
                {"title": "B", "description": "summary", "source": "Decrypt", "url": "https://b"}
            ]"#,
        )
        .unwrap();

        let articles = load_articles(&path).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].source, "TechCrunch");
        assert_eq!(articles[1].body(), Some("summary"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_load_articles_rejects_bad_input() {
        let dir = scratch("bad_batch");
        let path = dir.join("batch.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        assert!(load_articles(&path).await.is_err());
        assert!(load_articles(&dir.join("missing.json")).await.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_bucket_files_in_taxonomy_order() {
        let dir = scratch("buckets");
        std::fs::write(
            dir.join("east_asia_fintech.json"),
            r#"[{"title": "ea fintech", "url": "https://c"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("global_startup.json"),
            r#"[{"title": "g startup 1", "url": "https://a"}, {"title": "g startup 2", "url": "https://b"}]"#,
        )
        .unwrap();
        std::fs::write(dir.join("global_blockchain.json"), "not json").unwrap();

        let articles = load_bucket_files(&dir, &sample()).await.unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["g startup 1", "g startup 2", "ea fintech"]);
        assert_eq!(articles[2].region.as_deref(), Some("East Asia"));
        assert_eq!(articles[2].category.as_deref(), Some("FinTech"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
