//! # Context Retrieval
//!
//! Turns raw similarity hits into a deduplicated, context-complete, reranked result list.
//!
//! ## Architecture
//!
//! ```text
//! query
//!     │
//!     ├──> VectorIndex::search ─────────────> Candidate[]
//!     │
//!     ├──> Deduplicator         (id + content hash, first seen wins)
//!     ├──> NeighborExpander     (pre: sibling chunks, bounded fan-out)
//!     ├──> Deduplicator
//!     ├──> RerankerAdapter      (batched scorer calls, retry + backoff, top_n)
//!     ├──> NeighborExpander     (post: context for the survivors)
//!     └──> Deduplicator ────────────────────> bounded result list
//! ```
//!
//! The collect pipeline skips expansion and reranking: `search → dedup`.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use context_retrieval::{LexicalScorer, PipelineConfig, RetrievalPipeline};
//! use context_vector_store::{InMemoryIndex, SearchFilters};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = InMemoryIndex::from_documents(vec![(
//!         "guide.md",
//!         vec!["Install first".to_string(), "Then configure the cache".to_string()],
//!     )])?;
//!     let pipeline = RetrievalPipeline::new(
//!         Arc::new(index),
//!         Arc::new(LexicalScorer::default()),
//!         PipelineConfig::default(),
//!     )?;
//!
//!     let results = pipeline
//!         .run_ranked("configure cache", 3, &SearchFilters::default(), &CancellationToken::new())
//!         .await?;
//!     for candidate in results {
//!         println!("{} {:.3} {}", candidate.id, candidate.score, candidate.text);
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod cutoff;
mod dedup;
mod error;
mod expansion;
mod limits;
mod pipeline;
mod rerank;
mod scorer;
mod stage;

pub use config::{ExpansionConfig, ExpansionDirection, PipelineConfig, RetryConfig};
pub use cutoff::similarity_cutoff;
pub use dedup::dedup;
pub use error::{PipelineError, Result, ScorerError, SearchError};
pub use expansion::NeighborExpander;
pub use limits::NEIGHBOR_FANOUT_ENV;
pub use pipeline::RetrievalPipeline;
pub use rerank::{RerankerAdapter, DEFAULT_RERANK_BATCH_SIZE};
pub use scorer::{Bm25Config, LexicalScorer, RelevanceScorer};
pub use stage::{Stage, StageFuture, StageName};

pub use context_vector_store::{Candidate, SearchFilters};
