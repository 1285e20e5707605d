use anyhow::{Context as AnyhowContext, Result};
use context_vector_store::InMemoryIndex;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Corpus file: documents already split into ordered chunks
#[derive(Debug, Deserialize)]
pub(crate) struct CorpusFile {
    pub documents: Vec<CorpusDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CorpusDocument {
    pub doc_id: String,
    #[serde(default)]
    pub chunks: Vec<String>,
}

pub(crate) fn load_index(path: &Path) -> Result<InMemoryIndex> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read corpus {}", path.display()))?;
    let corpus: CorpusFile = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid corpus JSON in {}", path.display()))?;

    let documents = corpus.documents.len();
    let index = InMemoryIndex::from_documents(
        corpus
            .documents
            .into_iter()
            .map(|doc| (doc.doc_id, doc.chunks)),
    )
    .context("Failed to build in-memory index")?;

    log::debug!(
        "Loaded corpus {}: {} documents, {} chunks",
        path.display(),
        documents,
        index.len()
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn loads_documents_in_chunk_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(
            &path,
            r#"{"documents":[{"doc_id":"a.md","chunks":["one","two"]},{"doc_id":"b.md"}]}"#,
        )
        .unwrap();

        let index = load_index(&path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.doc_count(), 2);
    }

    #[test]
    fn duplicate_doc_ids_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        fs::write(
            &path,
            r#"{"documents":[{"doc_id":"a.md","chunks":["x"]},{"doc_id":"a.md","chunks":["y"]}]}"#,
        )
        .unwrap();

        assert!(load_index(&path).is_err());
    }

    #[test]
    fn malformed_json_names_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();

        let err = load_index(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
