use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Links from a chunk to its siblings inside the same document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationships {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_id: Option<String>,
}

/// One retrieved chunk flowing through the retrieval pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Chunk identity, stable across queries
    pub id: String,

    /// SHA-256 of the whitespace-normalized text
    pub content_hash: String,

    pub text: String,

    pub doc_id: String,

    /// Position of the chunk within `doc_id`
    pub ordinal: usize,

    pub score: f32,

    #[serde(default)]
    pub relationships: Relationships,

    /// Set on chunks added by neighbor expansion; they are never expanded again
    #[serde(default)]
    pub is_expanded: bool,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        doc_id: impl Into<String>,
        ordinal: usize,
        text: impl Into<String>,
        score: f32,
    ) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            content_hash: content_hash(&text),
            text,
            doc_id: doc_id.into(),
            ordinal,
            score,
            relationships: Relationships::default(),
            is_expanded: false,
        }
    }

    #[must_use]
    pub fn with_relationships(mut self, relationships: Relationships) -> Self {
        self.relationships = relationships;
        self
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = score;
        self
    }

    /// Mark this chunk as a neighbor discovered from `anchor`.
    ///
    /// The neighbor inherits the anchor's score.
    #[must_use]
    pub fn expanded_from(mut self, anchor: &Candidate) -> Self {
        self.score = anchor.score;
        self.is_expanded = true;
        self
    }
}

/// Direction of a single-hop sibling lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborDirection {
    Prev,
    Next,
}

impl NeighborDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Next => "next",
        }
    }
}

/// Deterministic hash of the normalized chunk text.
///
/// Normalization trims the text and collapses whitespace runs to a single space,
/// so chunks that differ only in layout alias the same hash.
pub fn content_hash(text: &str) -> String {
    let normalized = normalize_text(text);
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
