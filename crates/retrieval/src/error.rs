use crate::stage::StageName;
use context_vector_store::VectorStoreError;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Index unavailable: {0}")]
    IndexUnavailable(#[from] VectorStoreError),

    #[error("Reranker call failed after {attempts} attempt(s): {message}")]
    RerankerCallFailed { attempts: u32, message: String },

    #[error("Cancelled")]
    Cancelled,

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl SearchError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Failure of a single scorer call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScorerError {
    #[error("Scorer request failed: {0}")]
    Request(String),

    #[error("Scorer returned {actual} scores for {expected} texts")]
    LengthMismatch { expected: usize, actual: usize },
}

impl ScorerError {
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }
}

/// Pipeline failure tagged with the stage that produced it and the query being served
#[derive(Error, Debug)]
#[error("{stage} stage failed for query '{query}': {source}")]
pub struct PipelineError {
    pub stage: StageName,
    pub query: String,
    #[source]
    pub source: SearchError,
}

impl PipelineError {
    pub fn new(stage: StageName, query: impl Into<String>, source: SearchError) -> Self {
        Self {
            stage,
            query: query.into(),
            source,
        }
    }
}
