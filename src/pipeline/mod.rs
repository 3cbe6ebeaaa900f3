//! The curation pipeline.
//!
//! ```text
//! articles ─▶ Orchestrator ─▶ (OracleClient ─▶ parser) ─▶ Scorer ─▶ normalize ─▶ select
//! ```
//!
//! # Submodules
//!
//! - [`orchestrator`]: bounded-concurrency fan-out over the batch
//! - [`parser`]: tolerant extraction of the oracle's JSON verdict
//! - [`scorer`]: oracle score plus keyword × source-weight signal
//! - [`normalize`]: label canonicalization against the taxonomy
//! - [`select`]: one article per bucket, placeholders for the rest
//!
//! Only the orchestrator suspends; every stage after it is synchronous.

pub mod normalize;
pub mod orchestrator;
pub mod parser;
pub mod scorer;
pub mod select;

use crate::api::{OracleClient, OracleTransport};
use crate::config::PlaceholderConfig;
use crate::models::{Article, BucketKey, ClassificationResult, CuratedEntry, RejectReason, RejectedArticle};
use crate::taxonomy::Taxonomy;
use itertools::Itertools;
use normalize::bucket_for;
use orchestrator::{Classified, Orchestrator};
use scorer::Scorer;
use select::{Candidate, select_top};
use std::fmt;
use tracing::{info, instrument};

/// Counters for one run, logged at the end of [`Pipeline::curate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub total: usize,
    pub submitted: usize,
    /// Oracle calls that ended without a verdict.
    pub failed: usize,
    /// Verdicts with `keep = false`, failures included.
    pub rejected: usize,
    pub kept: usize,
    /// Kept articles whose labels fall outside the taxonomy.
    pub unmapped: usize,
}

/// Everything a fresh run produces.
#[derive(Debug)]
pub struct CurationReport {
    /// Kept articles with normalized labels and combined score, in batch order.
    pub classified: Vec<Article>,
    /// Submitted articles that were not kept, in batch order.
    pub rejected: Vec<RejectedArticle>,
    /// Candidates per taxonomy bucket, best first, in bucket order.
    pub buckets: Vec<(BucketKey, Vec<Article>)>,
    /// Exactly one entry per taxonomy bucket.
    pub selection: Vec<CuratedEntry>,
    pub stats: RunStats,
}

pub struct Pipeline<T> {
    orchestrator: Orchestrator,
    client: OracleClient<T>,
    scorer: Scorer,
    taxonomy: Taxonomy,
    placeholder: PlaceholderConfig,
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("orchestrator", &self.orchestrator)
            .field("regions", &self.taxonomy.regions)
            .field("categories", &self.taxonomy.categories)
            .finish()
    }
}

impl<T> Pipeline<T>
where
    T: OracleTransport + fmt::Debug,
{
    pub fn new(
        orchestrator: Orchestrator,
        client: OracleClient<T>,
        scorer: Scorer,
        taxonomy: Taxonomy,
        placeholder: PlaceholderConfig,
    ) -> Self {
        Self {
            orchestrator,
            client,
            scorer,
            taxonomy,
            placeholder,
        }
    }

    /// Classify, score, normalize and select over one batch.
    #[instrument(level = "info", skip_all, fields(batch = articles.len()))]
    pub async fn curate(&self, articles: &[Article]) -> CurationReport {
        let classified = self.orchestrator.classify_batch(&self.client, articles).await;

        let mut stats = RunStats {
            total: articles.len(),
            submitted: classified.len(),
            ..Default::default()
        };

        let mut candidates = Vec::new();
        let mut rejected = Vec::new();
        for Classified { position, result } in classified {
            let reason = match result {
                Some(_) => RejectReason::Declined,
                None => {
                    stats.failed += 1;
                    RejectReason::NoVerdict
                }
            };
            let verdict = result.unwrap_or_else(ClassificationResult::reject);
            let source = &articles[position];

            let Some(score) = self.scorer.score(source, &verdict) else {
                stats.rejected += 1;
                rejected.push(rejected_entry(source, &verdict, reason));
                continue;
            };

            let bucket = bucket_for(&self.taxonomy, &verdict.region, &verdict.category);
            if !self.taxonomy.contains(&bucket) {
                stats.unmapped += 1;
            }

            let mut article = source.clone();
            article.region = Some(bucket.region.clone());
            article.category = Some(bucket.category.clone());
            article.score = Some(score);
            candidates.push(Candidate {
                position,
                bucket,
                score,
                article,
            });
        }
        stats.kept = candidates.len();

        let selection = select_top(&candidates, &self.taxonomy, &self.placeholder);
        let buckets = self.group_by_bucket(&candidates);

        info!(
            total = stats.total,
            submitted = stats.submitted,
            failed = stats.failed,
            rejected = stats.rejected,
            kept = stats.kept,
            unmapped = stats.unmapped,
            placeholders = selection.iter().filter(|e| e.is_placeholder()).count(),
            "Curation finished"
        );

        CurationReport {
            classified: candidates.into_iter().map(|c| c.article).collect(),
            rejected,
            buckets,
            selection,
            stats,
        }
    }

    fn group_by_bucket(&self, candidates: &[Candidate]) -> Vec<(BucketKey, Vec<Article>)> {
        let mut groups = candidates
            .iter()
            .filter(|c| self.taxonomy.contains(&c.bucket))
            .sorted_by(|a, b| a.rank_cmp(b))
            .into_group_map_by(|c| c.bucket.clone());

        self.taxonomy
            .bucket_keys()
            .into_iter()
            .map(|key| {
                let articles = groups
                    .remove(&key)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|c| c.article.clone())
                    .collect();
                (key, articles)
            })
            .collect()
    }
}

/// Record a non-kept article with whatever the oracle said about it.
fn rejected_entry(source: &Article, verdict: &ClassificationResult, reason: RejectReason) -> RejectedArticle {
    let mut article = source.clone();
    if reason == RejectReason::Declined {
        if !verdict.category.is_empty() {
            article.category = Some(verdict.category.clone());
        }
        article.region = Some(verdict.region.clone());
        article.score = Some(verdict.score);
    }
    RejectedArticle {
        article,
        rejected: reason,
    }
}
