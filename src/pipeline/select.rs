//! Reduce scored articles to one representative per taxonomy bucket.
//!
//! Two entry points share the completion step:
//!
//! - [`select_top`]: fresh runs. Highest combined score wins, ties go to the
//!   article that came first in the batch.
//! - [`merge_first_wins`]: merging persisted per-bucket files. Those files
//!   are already ranked, so the first entry seen for a bucket wins and later
//!   ones are dropped.
//!
//! Either way the output holds exactly one entry per bucket in
//! regions × categories order, with a placeholder where nothing was found.

use crate::config::PlaceholderConfig;
use crate::models::{Article, BucketKey, CuratedEntry, Placeholder};
use crate::pipeline::normalize::bucket_for;
use crate::taxonomy::Taxonomy;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// A kept, scored and normalized article.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Position in the original batch, used as the tie-breaker.
    pub position: usize,
    pub bucket: BucketKey,
    pub score: f64,
    pub article: Article,
}

impl Candidate {
    /// Higher score first, then earlier batch position.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.position.cmp(&other.position))
    }
}

pub fn placeholder_for(key: &BucketKey, config: &PlaceholderConfig) -> Placeholder {
    Placeholder {
        region: key.region.clone(),
        category: key.category.clone(),
        title: config.title.clone(),
        content: String::new(),
        summary: config.marker.clone(),
        url: "#".to_string(),
        placeholder: true,
    }
}

fn complete(
    mut chosen: HashMap<BucketKey, Article>,
    taxonomy: &Taxonomy,
    placeholder: &PlaceholderConfig,
) -> Vec<CuratedEntry> {
    taxonomy
        .bucket_keys()
        .into_iter()
        .map(|key| match chosen.remove(&key) {
            Some(article) => CuratedEntry::Selected(article),
            None => {
                debug!(region = %key.region, category = %key.category, "Bucket empty; using placeholder");
                CuratedEntry::Placeholder(placeholder_for(&key, placeholder))
            }
        })
        .collect()
}

/// Best candidate per bucket, completed with placeholders.
///
/// Candidates in buckets outside the taxonomy are ignored.
pub fn select_top(
    candidates: &[Candidate],
    taxonomy: &Taxonomy,
    placeholder: &PlaceholderConfig,
) -> Vec<CuratedEntry> {
    let mut best: HashMap<&BucketKey, &Candidate> = HashMap::new();
    for candidate in candidates.iter().filter(|c| taxonomy.contains(&c.bucket)) {
        best.entry(&candidate.bucket)
            .and_modify(|current| {
                if candidate.rank_cmp(*current) == Ordering::Less {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    let chosen = best
        .into_iter()
        .map(|(key, c)| (key.clone(), c.article.clone()))
        .collect();
    complete(chosen, taxonomy, placeholder)
}

/// First entry per bucket wins; buckets are resolved from each article's
/// own region/category labels.
pub fn merge_first_wins(
    articles: Vec<Article>,
    taxonomy: &Taxonomy,
    placeholder: &PlaceholderConfig,
) -> Vec<CuratedEntry> {
    let mut chosen: HashMap<BucketKey, Article> = HashMap::new();
    for mut article in articles {
        let key = bucket_for(
            taxonomy,
            article.region.as_deref().unwrap_or_default(),
            article.category.as_deref().unwrap_or_default(),
        );
        if !taxonomy.contains(&key) {
            debug!(url = %article.url, category = %key.category, "Unmapped bucket; skipping");
            continue;
        }
        match chosen.entry(key) {
            Entry::Occupied(e) => {
                debug!(url = %article.url, region = %e.key().region, category = %e.key().category, "Bucket already filled; dropping later entry");
            }
            Entry::Vacant(e) => {
                article.region = Some(e.key().region.clone());
                article.category = Some(e.key().category.clone());
                e.insert(article);
            }
        }
    }
    complete(chosen, taxonomy, placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::sample;

    fn candidate(position: usize, region: &str, category: &str, score: f64) -> Candidate {
        Candidate {
            position,
            bucket: BucketKey::new(region, category),
            score,
            article: Article {
                title: format!("article {position}"),
                region: Some(region.into()),
                category: Some(category.into()),
                score: Some(score),
                ..Default::default()
            },
        }
    }

    fn selected_title(entries: &[CuratedEntry], region: &str, category: &str) -> Option<String> {
        entries
            .iter()
            .find(|e| e.region() == region && e.category() == category)
            .and_then(|e| match e {
                CuratedEntry::Selected(a) => Some(a.title.clone()),
                CuratedEntry::Placeholder(_) => None,
            })
    }

    #[test]
    fn test_highest_score_wins() {
        let t = sample();
        let candidates = vec![
            candidate(0, "Global", "FinTech", 5.0),
            candidate(1, "Global", "FinTech", 9.0),
        ];
        let out = select_top(&candidates, &t, &PlaceholderConfig::default());
        assert_eq!(selected_title(&out, "Global", "FinTech").as_deref(), Some("article 1"));
        let fintech: Vec<_> = out
            .iter()
            .filter(|e| e.region() == "Global" && e.category() == "FinTech")
            .collect();
        assert_eq!(fintech.len(), 1);
    }

    #[test]
    fn test_ties_go_to_earliest_position() {
        let t = sample();
        let candidates = vec![
            candidate(4, "East Asia", "Startup", 7.0),
            candidate(2, "East Asia", "Startup", 7.0),
            candidate(3, "East Asia", "Startup", 7.0),
        ];
        let out = select_top(&candidates, &t, &PlaceholderConfig::default());
        assert_eq!(selected_title(&out, "East Asia", "Startup").as_deref(), Some("article 2"));
    }

    #[test]
    fn test_every_bucket_is_represented() {
        let t = sample();
        let out = select_top(
            &[candidate(0, "Global", "FinTech", 3.0)],
            &t,
            &PlaceholderConfig::default(),
        );
        assert_eq!(out.len(), t.bucket_keys().len());
        for (entry, key) in out.iter().zip(t.bucket_keys()) {
            assert_eq!(entry.region(), key.region);
            assert_eq!(entry.category(), key.category);
        }

        let blockchain = out
            .iter()
            .find(|e| e.region() == "Global" && e.category() == "Blockchain")
            .unwrap();
        match blockchain {
            CuratedEntry::Placeholder(p) => {
                assert_eq!(p.title, "(No article selected)");
                assert_eq!(p.content, "");
                assert_eq!(p.summary, "No relevant news today.");
                assert!(p.placeholder);
            }
            CuratedEntry::Selected(_) => panic!("expected placeholder"),
        }
    }

    #[test]
    fn test_empty_input_gives_all_placeholders() {
        let t = sample();
        let out = select_top(&[], &t, &PlaceholderConfig::default());
        assert_eq!(out.len(), 6);
        assert!(out.iter().all(CuratedEntry::is_placeholder));
    }

    #[test]
    fn test_unmapped_buckets_are_ignored() {
        let t = sample();
        let out = select_top(
            &[candidate(0, "Global", "Quantum", 10.0)],
            &t,
            &PlaceholderConfig::default(),
        );
        assert!(out.iter().all(CuratedEntry::is_placeholder));
    }

    #[test]
    fn test_merge_keeps_first_occurrence() {
        let t = sample();
        let first = Article {
            title: "first".into(),
            region: Some("Global".into()),
            category: Some("Applied AI & FinTech".into()),
            score: Some(2.0),
            ..Default::default()
        };
        let second = Article {
            title: "second".into(),
            region: Some("global".into()),
            category: Some("FinTech".into()),
            score: Some(9.0),
            ..Default::default()
        };
        let out = merge_first_wins(vec![first, second], &t, &PlaceholderConfig::default());
        assert_eq!(out.len(), 6);
        assert_eq!(selected_title(&out, "Global", "FinTech").as_deref(), Some("first"));

        let entry = out
            .iter()
            .find(|e| !e.is_placeholder())
            .unwrap();
        assert_eq!(entry.category(), "FinTech");
    }

    #[test]
    fn test_merge_defaults_missing_region() {
        let t = sample();
        let article = Article {
            title: "no region".into(),
            category: Some("blockchain_ai".into()),
            ..Default::default()
        };
        let out = merge_first_wins(vec![article], &t, &PlaceholderConfig::default());
        assert_eq!(selected_title(&out, "Global", "Blockchain").as_deref(), Some("no region"));
    }
}
