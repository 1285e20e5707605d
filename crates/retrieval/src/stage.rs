use crate::error::{Result, SearchError};
use context_vector_store::Candidate;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Name tagged onto pipeline errors and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Search,
    SimilarityCutoff,
    DedupSearch,
    ExpandPre,
    DedupPre,
    Rerank,
    ExpandPost,
    DedupPost,
    Dedup,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::SimilarityCutoff => "similarity_cutoff",
            Self::DedupSearch => "dedup_search",
            Self::ExpandPre => "expand_pre",
            Self::DedupPre => "dedup_pre",
            Self::Rerank => "rerank",
            Self::ExpandPost => "expand_post",
            Self::DedupPost => "dedup_post",
            Self::Dedup => "dedup",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type StageFuture = Pin<Box<dyn Future<Output = Result<Vec<Candidate>>> + Send>>;

type StageFn = Box<dyn Fn(Arc<str>, Vec<Candidate>) -> StageFuture + Send + Sync>;

/// One step of a pipeline: `(query, candidates) -> candidates | error`
pub struct Stage {
    name: StageName,
    run: StageFn,
}

impl Stage {
    pub fn new<F, Fut>(name: StageName, run: F) -> Self
    where
        F: Fn(Arc<str>, Vec<Candidate>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<Candidate>>> + Send + 'static,
    {
        Self {
            name,
            run: Box::new(move |query: Arc<str>, candidates: Vec<Candidate>| -> StageFuture {
                Box::pin(run(query, candidates))
            }),
        }
    }

    /// Stage backed by a synchronous, infallible transform
    pub fn pure<F>(name: StageName, transform: F) -> Self
    where
        F: Fn(Vec<Candidate>) -> Vec<Candidate> + Send + Sync + Clone + 'static,
    {
        Self::new(name, move |_query, candidates| {
            let transform = transform.clone();
            async move { Ok::<_, SearchError>(transform(candidates)) }
        })
    }

    pub fn name(&self) -> StageName {
        self.name
    }

    pub fn run(&self, query: Arc<str>, candidates: Vec<Candidate>) -> StageFuture {
        (self.run)(query, candidates)
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pure_stage_ignores_query() {
        let stage = Stage::pure(StageName::Dedup, |mut candidates: Vec<Candidate>| {
            candidates.reverse();
            candidates
        });
        let input = vec![
            Candidate::new("a", "doc", 0, "a", 1.0),
            Candidate::new("b", "doc", 1, "b", 1.0),
        ];

        let out = stage.run(Arc::from("q"), input).await.unwrap();

        assert_eq!(stage.name(), StageName::Dedup);
        assert_eq!(out[0].id, "b");
    }

    #[test]
    fn stage_names_render_snake_case() {
        assert_eq!(StageName::ExpandPost.to_string(), "expand_post");
        assert_eq!(StageName::DedupSearch.to_string(), "dedup_search");
    }
}
