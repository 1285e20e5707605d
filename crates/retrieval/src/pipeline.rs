use crate::config::PipelineConfig;
use crate::cutoff::similarity_cutoff;
use crate::dedup::dedup;
use crate::error::{PipelineError, Result, SearchError};
use crate::expansion::NeighborExpander;
use crate::rerank::RerankerAdapter;
use crate::scorer::RelevanceScorer;
use crate::stage::{Stage, StageName};
use context_vector_store::{Candidate, SearchFilters, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Post-retrieval pipeline over a shared index and reranker.
///
/// Two fixed variants:
/// - collect: `search(collect_limit) → dedup`
/// - ranked: `search(k) → dedup → expand(pre) → dedup → rerank(top_n) → expand(post) → dedup`
///
/// Stages of one query run in order; separate queries may run concurrently on the same
/// pipeline. The pipeline keeps no per-query state, so a call either returns the final
/// list or fails with the stage that broke.
pub struct RetrievalPipeline {
    index: Arc<dyn VectorIndex>,
    pre_expander: Arc<NeighborExpander>,
    post_expander: Arc<NeighborExpander>,
    reranker: Arc<RerankerAdapter>,
    config: PipelineConfig,
}

impl RetrievalPipeline {
    /// Build a pipeline around caller-owned index and scorer handles
    pub fn new(
        index: Arc<dyn VectorIndex>,
        scorer: Arc<dyn RelevanceScorer>,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.validate()?;

        let pre_expander = NeighborExpander::new(
            Arc::clone(&index),
            config.pre_expansion,
            config.neighbor_fanout,
        );
        let post_expander = NeighborExpander::new(
            Arc::clone(&index),
            config.post_expansion,
            config.neighbor_fanout,
        );
        let reranker = RerankerAdapter::new(scorer, config.rerank_batch_size, config.retry);

        Ok(Self {
            index,
            pre_expander: Arc::new(pre_expander),
            post_expander: Arc::new(post_expander),
            reranker: Arc::new(reranker),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full ranked retrieval returning at most `result_count` anchors plus their
    /// post-expansion neighbors
    pub async fn run_ranked(
        &self,
        query: &str,
        result_count: usize,
        filters: &SearchFilters,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<Candidate>, PipelineError> {
        let stages = self.ranked_stages(result_count, filters);
        let results = self.execute("ranked", query, stages, cancel).await?;
        log::info!(
            "Ranked pipeline '{}' returned {} candidates (result_count={})",
            query,
            results.len(),
            result_count
        );
        Ok(results)
    }

    /// Broad unranked retrieval: deduplicated similarity hits only
    pub async fn run_collect(
        &self,
        query: &str,
        filters: &SearchFilters,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<Candidate>, PipelineError> {
        let stages = self.collect_stages(filters);
        let results = self.execute("collect", query, stages, cancel).await?;
        log::info!(
            "Collect pipeline '{}' returned {} candidates",
            query,
            results.len()
        );
        Ok(results)
    }

    pub(crate) fn ranked_stages(&self, result_count: usize, filters: &SearchFilters) -> Vec<Stage> {
        let mut stages = vec![self.search_stage(filters, self.config.ranked_search_k(result_count))];
        stages.extend(self.cutoff_stage());
        stages.push(Stage::pure(StageName::DedupSearch, dedup));

        let expander = Arc::clone(&self.pre_expander);
        stages.push(Stage::new(StageName::ExpandPre, move |_query, candidates| {
            let expander = Arc::clone(&expander);
            async move { expander.expand(candidates).await }
        }));
        stages.push(Stage::pure(StageName::DedupPre, dedup));

        let reranker = Arc::clone(&self.reranker);
        stages.push(Stage::new(StageName::Rerank, move |query, candidates| {
            let reranker = Arc::clone(&reranker);
            async move { reranker.rerank(&query, candidates, result_count).await }
        }));

        let expander = Arc::clone(&self.post_expander);
        stages.push(Stage::new(StageName::ExpandPost, move |_query, candidates| {
            let expander = Arc::clone(&expander);
            async move { expander.expand(candidates).await }
        }));
        stages.push(Stage::pure(StageName::DedupPost, dedup));
        stages
    }

    pub(crate) fn collect_stages(&self, filters: &SearchFilters) -> Vec<Stage> {
        let mut stages = vec![self.search_stage(filters, self.config.collect_limit)];
        stages.extend(self.cutoff_stage());
        stages.push(Stage::pure(StageName::Dedup, dedup));
        stages
    }

    fn search_stage(&self, filters: &SearchFilters, k: usize) -> Stage {
        let index = Arc::clone(&self.index);
        let filters = Arc::new(filters.clone());
        Stage::new(StageName::Search, move |query, _candidates| {
            let index = Arc::clone(&index);
            let filters = Arc::clone(&filters);
            async move {
                index
                    .search(&query, &filters, k)
                    .await
                    .map_err(SearchError::from)
            }
        })
    }

    fn cutoff_stage(&self) -> Option<Stage> {
        let min_similarity = self.config.min_similarity?;
        Some(Stage::pure(StageName::SimilarityCutoff, move |candidates| {
            similarity_cutoff(candidates, min_similarity)
        }))
    }

    async fn execute(
        &self,
        pipeline: &str,
        query: &str,
        stages: Vec<Stage>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Vec<Candidate>, PipelineError> {
        if query.trim().is_empty() {
            log::debug!("{} pipeline skipped: blank query", pipeline);
            return Ok(Vec::new());
        }

        let shared_query: Arc<str> = Arc::from(query);
        let deadline = self
            .config
            .timeout()
            .map(|timeout| (Instant::now() + timeout, timeout));

        let mut working: Vec<Candidate> = Vec::new();
        for stage in stages {
            let name = stage.name();
            let before = working.len();
            let run = stage.run(Arc::clone(&shared_query), working);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(SearchError::Cancelled),
                result = with_deadline(run, deadline) => result,
            };
            working = outcome.map_err(|source| {
                log::warn!("{} pipeline stage {} failed for '{}': {}", pipeline, name, query, source);
                PipelineError::new(name, query, source)
            })?;

            log::debug!(
                "{} pipeline stage {}: {} -> {} candidates",
                pipeline,
                name,
                before,
                working.len()
            );
        }
        Ok(working)
    }
}

async fn with_deadline<F>(run: F, deadline: Option<(Instant, Duration)>) -> Result<Vec<Candidate>>
where
    F: std::future::Future<Output = Result<Vec<Candidate>>>,
{
    match deadline {
        None => run.await,
        Some((at, timeout)) => tokio::time::timeout_at(at, run)
            .await
            .unwrap_or(Err(SearchError::TimedOut(timeout))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scorer::LexicalScorer;
    use context_vector_store::InMemoryIndex;
    use pretty_assertions::assert_eq;

    fn pipeline(config: PipelineConfig) -> RetrievalPipeline {
        let index = InMemoryIndex::from_documents(vec![(
            "guide.md",
            vec!["install".to_string(), "configure cache".to_string()],
        )])
        .unwrap();
        RetrievalPipeline::new(Arc::new(index), Arc::new(LexicalScorer::default()), config)
            .unwrap()
    }

    fn names(stages: &[Stage]) -> Vec<StageName> {
        stages.iter().map(Stage::name).collect()
    }

    #[test]
    fn ranked_stage_order_is_fixed() {
        let p = pipeline(PipelineConfig::default());
        assert_eq!(
            names(&p.ranked_stages(5, &SearchFilters::default())),
            vec![
                StageName::Search,
                StageName::DedupSearch,
                StageName::ExpandPre,
                StageName::DedupPre,
                StageName::Rerank,
                StageName::ExpandPost,
                StageName::DedupPost,
            ]
        );
    }

    #[test]
    fn cutoff_stage_follows_search_when_configured() {
        let p = pipeline(PipelineConfig {
            min_similarity: Some(0.2),
            ..PipelineConfig::default()
        });
        assert_eq!(
            names(&p.collect_stages(&SearchFilters::default())),
            vec![StageName::Search, StageName::SimilarityCutoff, StageName::Dedup]
        );
        assert_eq!(
            names(&p.ranked_stages(3, &SearchFilters::default()))[..3],
            [StageName::Search, StageName::SimilarityCutoff, StageName::DedupSearch]
        );
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let index = Arc::new(InMemoryIndex::new());
        let result = RetrievalPipeline::new(
            index,
            Arc::new(LexicalScorer::default()),
            PipelineConfig {
                candidate_pool: 0,
                ..PipelineConfig::default()
            },
        );
        assert!(matches!(result, Err(SearchError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn blank_query_returns_empty_list() {
        let p = pipeline(PipelineConfig::default());
        let cancel = CancellationToken::new();

        let collected = p
            .run_collect("   ", &SearchFilters::default(), &cancel)
            .await
            .unwrap();
        let ranked = p
            .run_ranked("", 3, &SearchFilters::default(), &cancel)
            .await
            .unwrap();

        assert!(collected.is_empty());
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn collect_returns_deduplicated_hits() {
        let p = pipeline(PipelineConfig::default());
        let out = p
            .run_collect("cache", &SearchFilters::default(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, "guide.md#1");
        assert!(!out[0].is_expanded);
    }
}
