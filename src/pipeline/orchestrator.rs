//! Bounded-concurrency fan-out of classification requests over a batch.
//!
//! The orchestrator owns the permit pool. Every oracle call holds a permit
//! for its whole duration, retries and backoff included, and the permit is
//! released when the call's future completes or is dropped. Results are
//! gathered in submission order, not completion order.

use crate::api::{OracleClient, OracleTransport};
use crate::models::{Article, ClassificationResult};
use futures::future::join_all;
use std::fmt;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

/// Outcome for one submitted article.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Index of the article in the batch handed to [`Orchestrator::classify_batch`].
    pub position: usize,
    /// `None` when the oracle call failed terminally.
    pub result: Option<ClassificationResult>,
}

pub struct Orchestrator {
    permits: Semaphore,
    concurrency: usize,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("concurrency", &self.concurrency)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

impl Orchestrator {
    /// `concurrency` is clamped to at least one in-flight call.
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            permits: Semaphore::new(concurrency),
            concurrency,
        }
    }

    /// Classify every structurally valid article in `articles`.
    ///
    /// Articles without a title or body are skipped before submission. The
    /// returned vector is parallel to the remaining articles, in input order.
    #[instrument(level = "info", skip_all, fields(batch = articles.len(), concurrency = self.concurrency))]
    pub async fn classify_batch<T>(&self, client: &OracleClient<T>, articles: &[Article]) -> Vec<Classified>
    where
        T: OracleTransport + fmt::Debug,
    {
        let t0 = Instant::now();
        let submitted: Vec<(usize, &Article)> = articles
            .iter()
            .enumerate()
            .filter(|(i, article)| {
                let ok = article.is_classifiable();
                if !ok {
                    debug!(index = i, url = %article.url, "Missing title or body; not submitting");
                }
                ok
            })
            .collect();

        info!(
            submitted = submitted.len(),
            skipped = articles.len() - submitted.len(),
            "Submitting articles to oracle"
        );

        let results = join_all(
            submitted
                .into_iter()
                .map(|(position, article)| self.classify_one(client, position, article)),
        )
        .await;

        let failed = results.iter().filter(|c| c.result.is_none()).count();
        info!(
            completed = results.len() - failed,
            failed,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Oracle fan-out finished"
        );
        results
    }

    async fn classify_one<T>(&self, client: &OracleClient<T>, position: usize, article: &Article) -> Classified
    where
        T: OracleTransport + fmt::Debug,
    {
        let result = match self.permits.acquire().await {
            Ok(_permit) => match client.classify(article).await {
                Ok(result) => {
                    debug!(index = position, keep = result.keep, score = result.score, "Article classified");
                    Some(result)
                }
                Err(e) => {
                    warn!(index = position, url = %article.url, error = %e, "Oracle call failed; article gets no verdict");
                    None
                }
            },
            Err(e) => {
                warn!(index = position, error = %e, "Permit pool closed");
                None
            }
        };
        Classified { position, result }
    }
}
