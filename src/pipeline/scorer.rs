//! Combined rank: the oracle's score plus a deterministic keyword signal.
//!
//! `rank = oracle_score + keyword_hits * source_weight`
//!
//! Keyword hits are counted with a case-insensitive substring match over
//! `title + " " + body`; each configured keyword counts at most once.

use crate::config::ScoringConfig;
use crate::models::{Article, ClassificationResult};
use std::collections::HashMap;

/// Keyword table, stored lowercased.
#[derive(Debug, Clone, Default)]
pub struct KeywordTable {
    keywords: Vec<String>,
}

impl KeywordTable {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Number of distinct keywords occurring in `text`.
    pub fn score(&self, text: &str) -> i64 {
        let lowered = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| lowered.contains(kw.as_str()))
            .count() as i64
    }
}

/// Credibility weight per source name, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct SourceWeights {
    weights: HashMap<String, i64>,
    default_weight: i64,
}

impl SourceWeights {
    pub fn new(weights: &HashMap<String, i64>, default_weight: i64) -> Self {
        Self {
            weights: weights
                .iter()
                .map(|(name, w)| (name.trim().to_lowercase(), *w))
                .collect(),
            default_weight,
        }
    }

    pub fn weight(&self, source: &str) -> i64 {
        self.weights
            .get(&source.trim().to_lowercase())
            .copied()
            .unwrap_or(self.default_weight)
    }
}

#[derive(Debug, Clone)]
pub struct Scorer {
    keywords: KeywordTable,
    weights: SourceWeights,
}

impl From<&ScoringConfig> for Scorer {
    fn from(config: &ScoringConfig) -> Self {
        Self::new(
            KeywordTable::new(&config.keywords),
            SourceWeights::new(&config.source_weights, config.default_source_weight),
        )
    }
}

impl Scorer {
    pub fn new(keywords: KeywordTable, weights: SourceWeights) -> Self {
        Self { keywords, weights }
    }

    /// Combined rank, or `None` for articles the oracle did not keep.
    pub fn score(&self, article: &Article, verdict: &ClassificationResult) -> Option<f64> {
        if !verdict.keep {
            return None;
        }
        let text = format!("{} {}", article.title, article.body().unwrap_or_default());
        let hits = self.keywords.score(&text);
        let weight = self.weights.weight(&article.source_name());
        Some(verdict.score + (hits * weight) as f64)
    }
}
