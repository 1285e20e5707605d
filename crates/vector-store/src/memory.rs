use crate::error::{Result, VectorStoreError};
use crate::filters::SearchFilters;
use crate::index::VectorIndex;
use crate::types::{Candidate, NeighborDirection, Relationships};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone)]
struct StoredChunk {
    candidate: Candidate,
    terms: HashMap<String, f32>,
    norm: f32,
}

/// In-process index over pre-chunked documents.
///
/// Similarity is the cosine between lexical term-frequency vectors, which keeps the
/// index deterministic and free of model downloads. Chunk ids are `{doc_id}#{ordinal}`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIndex {
    documents: BTreeMap<String, Vec<StoredChunk>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents<I, S>(documents: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<String>)>,
        S: Into<String>,
    {
        let mut index = Self::new();
        for (doc_id, chunks) in documents {
            index.add_document(doc_id, chunks)?;
        }
        Ok(index)
    }

    /// Add a document as an ordered list of chunk texts
    pub fn add_document(&mut self, doc_id: impl Into<String>, chunks: Vec<String>) -> Result<()> {
        let doc_id = doc_id.into();
        if doc_id.trim().is_empty() {
            return Err(VectorStoreError::invalid_document("doc_id must not be empty"));
        }
        if self.documents.contains_key(&doc_id) {
            return Err(VectorStoreError::invalid_document(format!(
                "duplicate doc_id '{doc_id}'"
            )));
        }

        let last = chunks.len().saturating_sub(1);
        let stored: Vec<StoredChunk> = chunks
            .into_iter()
            .enumerate()
            .map(|(ordinal, text)| {
                let relationships = Relationships {
                    prev_id: ordinal.checked_sub(1).map(|prev| chunk_id(&doc_id, prev)),
                    next_id: (ordinal < last).then(|| chunk_id(&doc_id, ordinal + 1)),
                };
                let terms = term_frequencies(&text);
                let norm = vector_norm(&terms);
                StoredChunk {
                    candidate: Candidate::new(chunk_id(&doc_id, ordinal), &doc_id, ordinal, text, 0.0)
                        .with_relationships(relationships),
                    terms,
                    norm,
                }
            })
            .collect();

        log::debug!("Indexed document '{}' ({} chunks)", doc_id, stored.len());
        self.documents.insert(doc_id, stored);
        Ok(())
    }

    /// Total number of chunks
    pub fn len(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    fn chunk_at(&self, doc_id: &str, ordinal: usize) -> Option<&StoredChunk> {
        self.documents.get(doc_id).and_then(|chunks| chunks.get(ordinal))
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
        k: usize,
    ) -> Result<Vec<Candidate>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_terms = term_frequencies(query);
        let query_norm = vector_norm(&query_terms);
        if query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<Candidate> = self
            .documents
            .iter()
            .filter(|(doc_id, _)| filters.allows(doc_id))
            .flat_map(|(_, chunks)| chunks.iter())
            .filter_map(|chunk| {
                let score = cosine(&query_terms, query_norm, &chunk.terms, chunk.norm);
                (score > 0.0).then(|| chunk.candidate.clone().with_score(score))
            })
            .collect();

        // BTreeMap iteration already yields (doc_id, ordinal) order, so a stable sort
        // keeps that as the tie-break.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        log::debug!("In-memory search '{}': {} hits (k={})", query, hits.len(), k);
        Ok(hits)
    }

    async fn fetch_neighbor(
        &self,
        doc_id: &str,
        anchor_ordinal: usize,
        direction: NeighborDirection,
    ) -> Result<Option<Candidate>> {
        let ordinal = match direction {
            NeighborDirection::Prev => anchor_ordinal.checked_sub(1),
            NeighborDirection::Next => anchor_ordinal.checked_add(1),
        };
        Ok(ordinal
            .and_then(|ordinal| self.chunk_at(doc_id, ordinal))
            .map(|chunk| chunk.candidate.clone()))
    }
}

fn chunk_id(doc_id: &str, ordinal: usize) -> String {
    format!("{doc_id}#{ordinal}")
}

fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut terms = HashMap::new();
    for word in text.unicode_words() {
        *terms.entry(word.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn vector_norm(terms: &HashMap<String, f32>) -> f32 {
    terms.values().map(|v| v * v).sum::<f32>().sqrt()
}

fn cosine(
    query: &HashMap<String, f32>,
    query_norm: f32,
    doc: &HashMap<String, f32>,
    doc_norm: f32,
) -> f32 {
    if query_norm == 0.0 || doc_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query
        .iter()
        .filter_map(|(term, weight)| doc.get(term).map(|w| w * weight))
        .sum();
    dot / (query_norm * doc_norm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_index() -> InMemoryIndex {
        InMemoryIndex::from_documents(vec![
            (
                "guide/setup.md",
                vec![
                    "Install the toolchain first".to_string(),
                    "Configure the cache directory".to_string(),
                    "Run the cache warmup job".to_string(),
                ],
            ),
            (
                "faq/billing.md",
                vec!["Invoices are sent monthly".to_string()],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn relationships_follow_document_order() {
        let index = sample_index();
        let first = &index.chunk_at("guide/setup.md", 0).unwrap().candidate;
        let middle = &index.chunk_at("guide/setup.md", 1).unwrap().candidate;
        let last = &index.chunk_at("guide/setup.md", 2).unwrap().candidate;

        assert_eq!(first.relationships.prev_id, None);
        assert_eq!(first.relationships.next_id.as_deref(), Some("guide/setup.md#1"));
        assert_eq!(middle.relationships.prev_id.as_deref(), Some("guide/setup.md#0"));
        assert_eq!(last.relationships.next_id, None);
        assert_eq!(index.len(), 4);
        assert_eq!(index.doc_count(), 2);
    }

    #[test]
    fn rejects_duplicate_and_blank_documents() {
        let mut index = sample_index();
        assert!(index.add_document("faq/billing.md", vec![]).is_err());
        assert!(index.add_document("  ", vec!["x".to_string()]).is_err());
    }

    #[tokio::test]
    async fn search_ranks_by_similarity_and_respects_k() {
        let index = sample_index();
        let hits = index
            .search("cache", &SearchFilters::default(), 1)
            .await
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, "guide/setup.md");
        assert!(hits[0].score > 0.0);
        assert!(!hits[0].is_expanded);
    }

    #[tokio::test]
    async fn search_applies_filters_and_skips_misses() {
        let index = sample_index();
        let filters = SearchFilters {
            include_docs: vec!["faq".to_string()],
            ..SearchFilters::default()
        };

        let hits = index.search("cache", &filters, 10).await.unwrap();
        assert!(hits.is_empty());

        let hits = index.search("invoices", &filters, 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "faq/billing.md#0");
    }

    #[tokio::test]
    async fn blank_query_and_zero_k_return_nothing() {
        let index = sample_index();
        assert!(index.search("   ", &SearchFilters::default(), 5).await.unwrap().is_empty());
        assert!(index.search("cache", &SearchFilters::default(), 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_neighbor_walks_one_hop() {
        let index = sample_index();

        let next = index
            .fetch_neighbor("guide/setup.md", 1, NeighborDirection::Next)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(next.ordinal, 2);

        let prev = index
            .fetch_neighbor("guide/setup.md", 0, NeighborDirection::Prev)
            .await
            .unwrap();
        assert!(prev.is_none());

        let past_end = index
            .fetch_neighbor("guide/setup.md", 2, NeighborDirection::Next)
            .await
            .unwrap();
        assert!(past_end.is_none());

        let unknown = index
            .fetch_neighbor("missing.md", 0, NeighborDirection::Next)
            .await
            .unwrap();
        assert!(unknown.is_none());
    }
}
