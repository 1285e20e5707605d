use crate::error::{Result, SearchError};
use crate::limits;
use context_vector_store::NeighborDirection;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which siblings neighbor expansion walks towards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionDirection {
    Prev,
    Next,
    Both,
}

impl ExpansionDirection {
    pub fn directions(self) -> &'static [NeighborDirection] {
        match self {
            Self::Prev => &[NeighborDirection::Prev],
            Self::Next => &[NeighborDirection::Next],
            Self::Both => &[NeighborDirection::Prev, NeighborDirection::Next],
        }
    }
}

/// Neighbor expansion window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Maximum sibling hops per direction (0 disables expansion)
    pub window_size: usize,

    pub direction: ExpansionDirection,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            window_size: 1,
            direction: ExpansionDirection::Both,
        }
    }
}

impl ExpansionConfig {
    pub fn new(window_size: usize, direction: ExpansionDirection) -> Self {
        Self {
            window_size,
            direction,
        }
    }
}

/// Retry policy for reranker calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per batch, including the first call
    pub max_attempts: u32,

    pub initial_backoff_ms: u64,

    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

impl RetryConfig {
    /// Delay before the retry that follows failed attempt number `attempt` (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self
            .initial_backoff_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff_ms);
        Duration::from_millis(delay)
    }
}

/// Configuration of both retrieval pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Initial hits fetched by the ranked pipeline (raised to the result count when smaller)
    pub candidate_pool: usize,

    /// Hits fetched by the collect pipeline
    pub collect_limit: usize,

    /// Expansion before reranking
    pub pre_expansion: ExpansionConfig,

    /// Expansion of the reranked survivors
    pub post_expansion: ExpansionConfig,

    pub rerank_batch_size: usize,

    pub retry: RetryConfig,

    /// Concurrent neighbor lookups per expansion pass
    pub neighbor_fanout: usize,

    /// Drop search hits scoring below this similarity
    pub min_similarity: Option<f32>,

    /// Whole-query deadline
    pub timeout_ms: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            candidate_pool: 20,
            collect_limit: 200,
            pre_expansion: ExpansionConfig::default(),
            post_expansion: ExpansionConfig::default(),
            rerank_batch_size: crate::rerank::DEFAULT_RERANK_BATCH_SIZE,
            retry: RetryConfig::default(),
            neighbor_fanout: 8,
            min_similarity: None,
            timeout_ms: None,
        }
    }
}

impl PipelineConfig {
    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| SearchError::invalid_config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CONTEXT_RETRIEVAL_NEIGHBOR_FANOUT` if set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.neighbor_fanout = limits::neighbor_fanout_from_env(self.neighbor_fanout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Initial hit count for a ranked query returning `result_count` items
    pub fn ranked_search_k(&self, result_count: usize) -> usize {
        self.candidate_pool.max(result_count)
    }

    pub fn validate(&self) -> Result<()> {
        if self.candidate_pool == 0 {
            return Err(SearchError::invalid_config("candidate_pool must be > 0"));
        }
        if self.collect_limit == 0 {
            return Err(SearchError::invalid_config("collect_limit must be > 0"));
        }
        if self.rerank_batch_size == 0 {
            return Err(SearchError::invalid_config("rerank_batch_size must be > 0"));
        }
        if self.neighbor_fanout == 0 {
            return Err(SearchError::invalid_config("neighbor_fanout must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(SearchError::invalid_config("retry.max_attempts must be > 0"));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(SearchError::invalid_config(format!(
                "retry.initial_backoff_ms ({}) cannot exceed retry.max_backoff_ms ({})",
                self.retry.initial_backoff_ms, self.retry.max_backoff_ms
            )));
        }
        if let Some(min) = self.min_similarity {
            if !min.is_finite() {
                return Err(SearchError::invalid_config("min_similarity must be finite"));
            }
        }
        Ok(())
    }
}
