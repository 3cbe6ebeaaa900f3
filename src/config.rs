//! YAML configuration for a curation run.
//!
//! Everything except the taxonomy has a default, so a minimal config file only
//! needs the `taxonomy` section. A missing or invalid taxonomy is a fatal
//! error: the run aborts before any article is classified.

use crate::error::ConfigError;
use crate::taxonomy::Taxonomy;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct CurationConfig {
    #[serde(default)]
    pub oracle: OracleConfig,
    pub taxonomy: Taxonomy,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub placeholder: PlaceholderConfig,
}

/// Connection and request settings for the classification oracle.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub api_base: String,
    /// Bearer key. `--api-key` / `OPENAI_API_KEY` takes precedence.
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    /// Ask the service for a JSON object response.
    pub json_mode: bool,
    pub timeout_secs: u64,
    /// Maximum simultaneous in-flight oracle calls.
    pub concurrency: usize,
    /// Total attempts per article, first call included.
    pub max_attempts: usize,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub jitter_ms: u64,
    /// Article bodies are cut to this many words before prompting.
    pub max_content_words: usize,
    /// Check that the endpoint answers before processing any article.
    pub probe_on_startup: bool,
    /// Replaces the built-in instruction prompt.
    pub prompt: Option<String>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            json_mode: true,
            timeout_secs: 60,
            concurrency: 3,
            max_attempts: 5,
            backoff_base_ms: 1000,
            backoff_max_ms: 30_000,
            jitter_ms: 250,
            max_content_words: 1000,
            probe_on_startup: true,
            prompt: None,
        }
    }
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

/// Static lookup tables for the deterministic half of the score.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub keywords: Vec<String>,
    pub source_weights: HashMap<String, i64>,
    pub default_source_weight: i64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let source_weights = [("TechCrunch", 3), ("VentureBeat", 3), ("Decrypt", 2)]
            .into_iter()
            .map(|(name, w)| (name.to_string(), w))
            .collect();
        Self {
            keywords: Vec::new(),
            source_weights,
            default_source_weight: 1,
        }
    }
}

/// Text used for buckets that ended up without an article.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    pub title: String,
    pub marker: String,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            title: "(No article selected)".to_string(),
            marker: "No relevant news today.".to_string(),
        }
    }
}

impl CurationConfig {
    /// Parse and validate a config from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: CurationConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the config file at `path`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&yaml)?;
        info!(
            regions = config.taxonomy.regions.len(),
            categories = config.taxonomy.categories.len(),
            aliases = config.taxonomy.aliases.len(),
            keywords = config.scoring.keywords.len(),
            concurrency = config.oracle.concurrency,
            "Loaded curation config"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.taxonomy.validate()?;
        if self.oracle.concurrency == 0 {
            return Err(ConfigError::Invalid("oracle.concurrency must be at least 1".into()));
        }
        if self.oracle.max_attempts == 0 {
            return Err(ConfigError::Invalid("oracle.max_attempts must be at least 1".into()));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(ConfigError::Invalid("oracle.timeout_secs must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
taxonomy:
  regions: [Global, East Asia]
  categories: [Startup, FinTech, Blockchain]
"#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = CurationConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.oracle.concurrency, 3);
        assert_eq!(config.oracle.max_attempts, 5);
        assert_eq!(config.oracle.max_content_words, 1000);
        assert_eq!(config.scoring.default_source_weight, 1);
        assert_eq!(config.scoring.source_weights.get("TechCrunch"), Some(&3));
        assert_eq!(config.placeholder.title, "(No article selected)");
        assert_eq!(config.taxonomy.default_region, "Global");
    }

    #[test]
    fn test_partial_oracle_section_keeps_other_defaults() {
        let yaml = format!("{MINIMAL}oracle:\n  concurrency: 8\n  model: local-qwen\n");
        let config = CurationConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.oracle.concurrency, 8);
        assert_eq!(config.oracle.model, "local-qwen");
        assert_eq!(config.oracle.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_missing_taxonomy_is_an_error() {
        let err = CurationConfig::from_yaml("oracle:\n  concurrency: 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let yaml = format!("{MINIMAL}oracle:\n  concurrency: 0\n");
        let err = CurationConfig::from_yaml(&yaml).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn test_invalid_taxonomy_is_rejected() {
        let yaml = "taxonomy:\n  regions: []\n  categories: [Startup]\n";
        assert!(matches!(
            CurationConfig::from_yaml(yaml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = CurationConfig::load(Path::new("/nonexistent/curation.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let yaml = include_str!("../config/curation.yaml");
        let config = CurationConfig::from_yaml(yaml).unwrap();
        assert!(config.taxonomy.categories.contains(&"Blockchain".to_string()));
        assert!(!config.scoring.keywords.is_empty());
    }
}
