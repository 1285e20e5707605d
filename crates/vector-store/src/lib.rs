//! # Context Vector Store
//!
//! The index boundary consumed by the retrieval pipeline.
//!
//! ## Features
//!
//! - **`Candidate`** - the chunk value object every retrieval stage passes along
//! - **`VectorIndex`** - async similarity search + single-hop sibling lookup
//! - **`SearchFilters`** - document prefix / pattern filters pushed down to the index
//! - **`InMemoryIndex`** - deterministic lexical index for tests and local corpora
//!
//! ## Architecture
//!
//! ```text
//! query
//!     │
//!     ├──> VectorIndex::search(query, filters, k)
//!     │      └─> Candidate[] (best first)
//!     │
//!     └──> VectorIndex::fetch_neighbor(doc_id, ordinal, prev|next)
//!            └─> Candidate | None
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use context_vector_store::{InMemoryIndex, SearchFilters, VectorIndex};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let index = InMemoryIndex::from_documents(vec![(
//!         "guide.md",
//!         vec!["Install first".to_string(), "Then configure".to_string()],
//!     )])?;
//!
//!     for hit in index.search("configure", &SearchFilters::default(), 5).await? {
//!         println!("{}: {:.3}", hit.id, hit.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod error;
mod filters;
mod index;
mod memory;
mod types;

pub use error::{Result, VectorStoreError};
pub use filters::SearchFilters;
pub use index::VectorIndex;
pub use memory::InMemoryIndex;
pub use types::{content_hash, Candidate, NeighborDirection, Relationships};
