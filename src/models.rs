//! Data models for candidate articles, oracle verdicts and the curated output.
//!
//! - [`Article`]: a candidate article as delivered by the acquisition stage
//! - [`ClassificationResult`]: the oracle's verdict for one article
//! - [`BucketKey`]: a (region, category) pair from the taxonomy
//! - [`RejectedArticle`]: a submitted article the oracle did not keep
//! - [`CuratedEntry`]: one slot of the final selection, real or placeholder
//!
//! Field names follow the JSON written by the acquisition stage
//! (`publishedAt`, `content`/`description`), so input files round-trip
//! through the pipeline unchanged apart from the fields it fills in.

use serde::{Deserialize, Deserializer, Serialize};

/// A candidate news article.
///
/// The URL identifies the article within a batch. `region`, `category` and
/// `score` are empty on input and filled in by the pipeline.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Article {
    #[serde(default)]
    pub title: String,
    /// Full article text, when the feed supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Feed summary, used as the body when `content` is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source name. Feeds deliver either `"TechCrunch"` or `{"name": "TechCrunch"}`.
    #[serde(default, deserialize_with = "de_source_name")]
    pub source: String,
    #[serde(default)]
    pub url: String,
    #[serde(
        rename = "publishedAt",
        alias = "published_at",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Article {
    /// The text sent to the oracle: `content`, falling back to `description`.
    pub fn body(&self) -> Option<&str> {
        [self.content.as_deref(), self.description.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.trim().is_empty())
    }

    /// Whether the article satisfies the structural precondition for classification.
    pub fn is_classifiable(&self) -> bool {
        !self.title.trim().is_empty() && self.body().is_some()
    }

    /// Source name, or the domain of the URL when the feed gave no name.
    ///
    /// For example `https://techcrunch.com/2025/...` -> `techcrunch`.
    pub fn source_name(&self) -> String {
        if !self.source.trim().is_empty() {
            return self.source.trim().to_string();
        }
        url::Url::parse(&self.url)
            .ok()
            .and_then(|parsed| {
                let host = parsed.host_str()?.to_string();
                let parts: Vec<&str> = host.split('.').collect();
                (parts.len() >= 2).then(|| parts[parts.len() - 2].to_string())
            })
            .unwrap_or_default()
    }
}

fn de_source_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SourceField {
        Name(String),
        Object { name: Option<String> },
        Other(serde_json::Value),
    }

    Ok(match Option::<SourceField>::deserialize(deserializer)? {
        Some(SourceField::Name(name)) => name,
        Some(SourceField::Object { name }) => name.unwrap_or_default(),
        Some(SourceField::Other(_)) | None => String::new(),
    })
}

/// The oracle's verdict for a single article.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub keep: bool,
    /// Raw category label as returned by the oracle, not yet normalized.
    pub category: String,
    /// Raw region label as returned by the oracle, not yet normalized.
    pub region: String,
    pub score: f64,
}

impl ClassificationResult {
    /// The verdict used when the oracle gave no usable answer.
    pub fn reject() -> Self {
        Self {
            keep: false,
            category: String::new(),
            region: "Global".to_string(),
            score: 0.0,
        }
    }
}

impl Default for ClassificationResult {
    fn default() -> Self {
        Self::reject()
    }
}

/// A (region, category) pair drawn from the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BucketKey {
    pub region: String,
    pub category: String,
}

impl BucketKey {
    pub fn new(region: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            category: category.into(),
        }
    }
}

/// Stand-in for a bucket that had no candidate article.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Placeholder {
    pub region: String,
    pub category: String,
    pub title: String,
    pub content: String,
    /// Human-readable "nothing today" marker shown in place of a summary.
    pub summary: String,
    pub url: String,
    pub placeholder: bool,
}

/// Why an article did not become a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The oracle answered and did not keep the article.
    Declined,
    /// The oracle call failed, so the default reject applied.
    NoVerdict,
}

/// A submitted article that was not kept, with the oracle's raw labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedArticle {
    #[serde(flatten)]
    pub article: Article,
    pub rejected: RejectReason,
}

/// One slot of the final selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CuratedEntry {
    Selected(Article),
    Placeholder(Placeholder),
}

impl CuratedEntry {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, CuratedEntry::Placeholder(_))
    }

    pub fn region(&self) -> &str {
        match self {
            CuratedEntry::Selected(a) => a.region.as_deref().unwrap_or_default(),
            CuratedEntry::Placeholder(p) => &p.region,
        }
    }

    pub fn category(&self) -> &str {
        match self {
            CuratedEntry::Selected(a) => a.category.as_deref().unwrap_or_default(),
            CuratedEntry::Placeholder(p) => &p.category,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_deserialization_with_source_object() {
        let json = r#"{
            "title": "Bank rolls out LLM assistant",
            "description": "A short summary",
            "source": {"id": null, "name": "TechCrunch"},
            "url": "https://techcrunch.com/a",
            "publishedAt": "2025-05-06T08:00:00Z"
        }"#;

        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.source, "TechCrunch");
        assert_eq!(article.body(), Some("A short summary"));
        assert_eq!(article.published_at.as_deref(), Some("2025-05-06T08:00:00Z"));
        assert!(article.is_classifiable());
    }

    #[test]
    fn test_article_deserialization_with_source_string() {
        let json = r#"{"title": "t", "content": "c", "source": "Decrypt"}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.source, "Decrypt");
        assert_eq!(article.body(), Some("c"));
    }

    #[test]
    fn test_article_with_null_source() {
        let json = r#"{"title": "t", "content": "c", "source": null}"#;
        let article: Article = serde_json::from_str(json).unwrap();
        assert_eq!(article.source, "");
    }

    #[test]
    fn test_body_prefers_content_and_skips_blank() {
        let article = Article {
            title: "t".into(),
            content: Some("   ".into()),
            description: Some("desc".into()),
            ..Default::default()
        };
        assert_eq!(article.body(), Some("desc"));

        let missing = Article {
            title: "t".into(),
            ..Default::default()
        };
        assert!(!missing.is_classifiable());
    }

    #[test]
    fn test_source_name_falls_back_to_domain() {
        let article = Article {
            url: "https://www.techcrunch.com/2025/05/06/story".into(),
            ..Default::default()
        };
        assert_eq!(article.source_name(), "techcrunch");

        let named = Article {
            source: " VentureBeat ".into(),
            url: "https://venturebeat.com/x".into(),
            ..Default::default()
        };
        assert_eq!(named.source_name(), "VentureBeat");

        assert_eq!(Article::default().source_name(), "");
    }

    #[test]
    fn test_unset_fields_are_not_serialized() {
        let article = Article {
            title: "t".into(),
            content: Some("c".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&article).unwrap();
        assert!(!json.contains("score"));
        assert!(!json.contains("publishedAt"));
    }

    #[test]
    fn test_curated_entry_serializes_flat() {
        let entry = CuratedEntry::Placeholder(Placeholder {
            region: "Global".into(),
            category: "Blockchain".into(),
            title: "(No article selected)".into(),
            content: String::new(),
            summary: "No relevant news today.".into(),
            url: "#".into(),
            placeholder: true,
        });
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["category"], "Blockchain");
        assert_eq!(value["placeholder"], true);
        assert!(entry.is_placeholder());
        assert_eq!(entry.region(), "Global");
    }

    #[test]
    fn test_reject_defaults() {
        let r = ClassificationResult::default();
        assert!(!r.keep);
        assert_eq!(r.region, "Global");
        assert_eq!(r.category, "");
        assert_eq!(r.score, 0.0);
    }
}
