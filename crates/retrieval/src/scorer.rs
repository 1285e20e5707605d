use crate::error::ScorerError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

/// External relevance model scoring `(query, text)` pairs.
///
/// Must return exactly one score per text, in input order. Implementations are shared
/// across concurrent queries.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>, ScorerError>;
}

/// BM25 parameters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bm25Config {
    pub k1: f32,
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Model-free scorer: BM25 of the query terms over the batch being scored.
///
/// Term statistics come from the batch itself, so scores are only comparable within
/// one call.
#[derive(Clone, Debug, Default)]
pub struct LexicalScorer {
    cfg: Bm25Config,
}

impl LexicalScorer {
    pub fn new(cfg: Bm25Config) -> Self {
        Self { cfg }
    }

    fn score_batch(&self, query: &str, texts: &[&str]) -> Vec<f32> {
        let query_terms: Vec<String> = {
            let mut seen = HashSet::new();
            tokenize(query)
                .into_iter()
                .filter(|t| seen.insert(t.clone()))
                .collect()
        };
        if query_terms.is_empty() {
            return vec![0.0; texts.len()];
        }

        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();
        let total_len: usize = docs.iter().map(Vec::len).sum();
        let doc_count = docs.len().max(1) as f32;
        let avg_len = total_len as f32 / doc_count;

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for doc in &docs {
            let unique: HashSet<&str> = doc.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        docs.iter()
            .map(|doc| {
                if doc.is_empty() {
                    return 0.0;
                }
                let dl = doc.len() as f32;
                let mut score = 0.0;
                for term in &query_terms {
                    let freq = term_frequency(doc, term);
                    if freq <= 0.0 {
                        continue;
                    }
                    let df = *doc_freq.get(term.as_str()).unwrap_or(&0) as f32;
                    let idf = bm25_idf(doc_count, df);
                    let denom = freq
                        + self.cfg.k1
                            * (1.0 - self.cfg.b + self.cfg.b * dl / avg_len.max(1e-3));
                    if denom > 0.0 {
                        score += idf * (freq * (self.cfg.k1 + 1.0)) / denom;
                    }
                }
                score
            })
            .collect()
    }
}

#[async_trait]
impl RelevanceScorer for LexicalScorer {
    async fn score(&self, query: &str, texts: &[&str]) -> Result<Vec<f32>, ScorerError> {
        Ok(self.score_batch(query, texts))
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).collect()
}

fn term_frequency(doc_tokens: &[String], needle: &str) -> f32 {
    doc_tokens
        .iter()
        .filter(|token| token.as_str() == needle)
        .count() as f32
}

fn bm25_idf(total_docs: f32, df: f32) -> f32 {
    ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_one_score_per_text() {
        let scorer = LexicalScorer::default();
        let scores = scorer
            .score("cache warmup", &["run the cache warmup", "unrelated", ""])
            .await
            .unwrap();

        assert_eq!(scores.len(), 3);
        assert!(scores[0] > 0.0);
        assert_eq!(scores[1], 0.0);
        assert_eq!(scores[2], 0.0);
    }

    #[tokio::test]
    async fn rarer_terms_weigh_more() {
        let scorer = LexicalScorer::default();
        let scores = scorer
            .score(
                "invoice refund",
                &[
                    "invoice invoice invoice",
                    "refund policy",
                    "invoice schedule",
                    "invoice archive",
                ],
            )
            .await
            .unwrap();

        // "refund" appears in one document, "invoice" in three.
        assert!(scores[1] > scores[2]);
        assert!(scores[1] > scores[3]);
    }

    #[tokio::test]
    async fn blank_query_scores_zero() {
        let scorer = LexicalScorer::new(Bm25Config::default());
        let scores = scorer.score("  ", &["anything"]).await.unwrap();
        assert_eq!(scores, vec![0.0]);
    }

    #[tokio::test]
    async fn empty_batch_is_valid() {
        let scorer = LexicalScorer::default();
        assert!(scorer.score("q", &[]).await.unwrap().is_empty());
    }
}
