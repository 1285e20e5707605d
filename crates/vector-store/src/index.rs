use crate::error::Result;
use crate::filters::SearchFilters;
use crate::types::{Candidate, NeighborDirection};
use async_trait::async_trait;

/// Read-only handle to a vector index.
///
/// Implementations are shared across concurrent queries, so they must be
/// `Send + Sync` and must not rely on per-query mutable state.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Top-`k` chunks by initial similarity, best first
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        k: usize,
    ) -> Result<Vec<Candidate>>;

    /// Single-hop sibling lookup.
    ///
    /// `Ok(None)` means there is no sibling in that direction; it is not an error.
    async fn fetch_neighbor(
        &self,
        doc_id: &str,
        anchor_ordinal: usize,
        direction: NeighborDirection,
    ) -> Result<Option<Candidate>>;
}
