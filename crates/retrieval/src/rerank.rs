use crate::config::RetryConfig;
use crate::error::{Result, ScorerError, SearchError};
use crate::scorer::RelevanceScorer;
use context_vector_store::Candidate;
use std::cmp::Ordering;
use std::sync::Arc;

pub const DEFAULT_RERANK_BATCH_SIZE: usize = 32;

/// Rescores candidates with an external scorer, sorts them best-first and keeps `top_n`.
///
/// Texts go to the scorer in sequential fixed-size batches. A failed batch is retried
/// with exponential backoff until `retry.max_attempts` calls have been made.
pub struct RerankerAdapter {
    scorer: Arc<dyn RelevanceScorer>,
    batch_size: usize,
    retry: RetryConfig,
}

impl RerankerAdapter {
    pub fn new(scorer: Arc<dyn RelevanceScorer>, batch_size: usize, retry: RetryConfig) -> Self {
        Self {
            scorer,
            batch_size: batch_size.max(1),
            retry,
        }
    }

    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<Candidate>,
        top_n: usize,
    ) -> Result<Vec<Candidate>> {
        if candidates.is_empty() || top_n == 0 {
            return Ok(Vec::new());
        }

        let mut scores = Vec::with_capacity(candidates.len());
        for (batch_idx, batch) in candidates.chunks(self.batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let batch_scores = self.score_with_retry(query, &texts, batch_idx).await?;
            scores.extend(batch_scores);
        }

        let total = candidates.len();
        let mut reranked: Vec<Candidate> = candidates
            .into_iter()
            .zip(scores)
            .map(|(candidate, score)| candidate.with_score(score))
            .collect();

        // `sort_by` is stable: equal scores keep their incoming order.
        reranked.sort_by(|a, b| compare_scores_desc(a.score, b.score));
        reranked.truncate(top_n);

        log::debug!(
            "Reranked {} candidates in {} batch(es), kept {}",
            total,
            total.div_ceil(self.batch_size),
            reranked.len()
        );
        Ok(reranked)
    }

    async fn score_with_retry(
        &self,
        query: &str,
        texts: &[&str],
        batch_idx: usize,
    ) -> Result<Vec<f32>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let failure = match self.scorer.score(query, texts).await {
                Ok(scores) if scores.len() == texts.len() => return Ok(scores),
                Ok(scores) => ScorerError::LengthMismatch {
                    expected: texts.len(),
                    actual: scores.len(),
                },
                Err(err) => err,
            };

            if attempt >= max_attempts {
                return Err(SearchError::RerankerCallFailed {
                    attempts: attempt,
                    message: failure.to_string(),
                });
            }

            let delay = self.retry.backoff_for(attempt);
            log::warn!(
                "Reranker batch {} failed (attempt {}/{}): {}; retrying in {:?}",
                batch_idx,
                attempt,
                max_attempts,
                failure,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Descending by score; NaN sorts last
fn compare_scores_desc(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
