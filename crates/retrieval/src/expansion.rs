use crate::config::ExpansionConfig;
use crate::error::{Result, SearchError};
use context_vector_store::{Candidate, NeighborDirection, VectorIndex};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Folds sibling chunks of each hit into the working set.
///
/// Every non-expanded candidate is an anchor. For each configured direction the expander
/// walks up to `window_size` hops through the index, one `fetch_neighbor` call per hop,
/// and stops early on the first miss. Discovered neighbors inherit the anchor's score,
/// are flagged `is_expanded`, and are appended after the existing candidates; existing
/// candidates are never removed or reordered.
///
/// Chains run concurrently, at most `fanout` at a time.
pub struct NeighborExpander {
    index: Arc<dyn VectorIndex>,
    config: ExpansionConfig,
    fanout: usize,
}

type ChainKey = (usize, NeighborDirection);

impl NeighborExpander {
    pub fn new(index: Arc<dyn VectorIndex>, config: ExpansionConfig, fanout: usize) -> Self {
        Self {
            index,
            config,
            fanout: fanout.max(1),
        }
    }

    pub fn config(&self) -> ExpansionConfig {
        self.config
    }

    pub async fn expand(&self, candidates: Vec<Candidate>) -> Result<Vec<Candidate>> {
        let window = self.config.window_size;
        if candidates.is_empty() || window == 0 {
            return Ok(candidates);
        }

        let semaphore = Arc::new(Semaphore::new(self.fanout));
        let mut tasks: JoinSet<Result<(ChainKey, Vec<Candidate>)>> = JoinSet::new();

        for (slot, anchor) in candidates.iter().enumerate() {
            if anchor.is_expanded {
                continue;
            }
            for &direction in self.config.direction.directions() {
                let index = Arc::clone(&self.index);
                let semaphore = Arc::clone(&semaphore);
                let anchor = anchor.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed; acquire failures are not expected.
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .unwrap_or_else(|_| unreachable!("neighbor fan-out semaphore closed"));
                    let chain = walk_chain(index.as_ref(), &anchor, direction, window).await?;
                    Ok(((slot, direction), chain))
                });
            }
        }

        let dispatched = tasks.len();
        let mut chains: HashMap<ChainKey, Vec<Candidate>> = HashMap::with_capacity(dispatched);
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| SearchError::Other(format!("neighbor lookup task failed: {e}")))
                .and_then(|chain| chain);
            match outcome {
                Ok((key, chain)) => {
                    chains.insert(key, chain);
                }
                Err(err) => {
                    // Wait for in-flight lookups to wind down before surfacing the error.
                    tasks.shutdown().await;
                    return Err(err);
                }
            }
        }

        let before = candidates.len();
        let mut seen: HashSet<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let mut expanded = candidates;
        let mut appended = Vec::new();

        for slot in 0..before {
            if let Some(mut prev) = chains.remove(&(slot, NeighborDirection::Prev)) {
                // Walked nearest-first; emit in document order.
                prev.reverse();
                appended.extend(prev);
            }
            if let Some(next) = chains.remove(&(slot, NeighborDirection::Next)) {
                appended.extend(next);
            }
            for neighbor in appended.drain(..) {
                if seen.insert(neighbor.id.clone()) {
                    expanded.push(neighbor);
                }
            }
        }

        log::debug!(
            "Expanded {} candidates into {} ({} chains, window={}, direction={:?})",
            before,
            expanded.len(),
            dispatched,
            window,
            self.config.direction
        );
        Ok(expanded)
    }
}

async fn walk_chain(
    index: &dyn VectorIndex,
    anchor: &Candidate,
    direction: NeighborDirection,
    window: usize,
) -> Result<Vec<Candidate>> {
    // Chains usually end on a miss long before `window` hops.
    let mut found = Vec::new();
    let mut ordinal = anchor.ordinal;
    for _ in 0..window {
        match index
            .fetch_neighbor(&anchor.doc_id, ordinal, direction)
            .await?
        {
            Some(neighbor) => {
                ordinal = neighbor.ordinal;
                found.push(neighbor.expanded_from(anchor));
            }
            None => {
                log::trace!(
                    "No {} neighbor for {} at ordinal {}",
                    direction.as_str(),
                    anchor.id,
                    ordinal
                );
                break;
            }
        }
    }
    Ok(found)
}
