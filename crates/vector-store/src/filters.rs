use serde::{Deserialize, Serialize};

/// Document-level filters applied by the index during similarity search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Only documents under one of these `/`-separated prefixes
    #[serde(default)]
    pub include_docs: Vec<String>,

    /// Documents under these prefixes are dropped, even when included
    #[serde(default)]
    pub exclude_docs: Vec<String>,

    /// Substring, or glob when it contains `*` / `?`
    #[serde(default)]
    pub doc_pattern: Option<String>,
}

impl SearchFilters {
    pub fn is_active(&self) -> bool {
        self.include_docs
            .iter()
            .any(|p| !normalize_filter_prefix(p).is_empty())
            || self
                .exclude_docs
                .iter()
                .any(|p| !normalize_filter_prefix(p).is_empty())
            || self
                .doc_pattern
                .as_deref()
                .map(str::trim)
                .is_some_and(|p| !p.is_empty())
    }

    pub fn allows(&self, doc_id: &str) -> bool {
        let doc_id = doc_id.replace('\\', "/");

        let includes: Vec<String> = self
            .include_docs
            .iter()
            .map(|p| normalize_filter_prefix(p))
            .filter(|p| !p.is_empty())
            .collect();
        if !includes.is_empty()
            && !includes
                .iter()
                .any(|prefix| prefix_matches_normalized(prefix, &doc_id))
        {
            return false;
        }

        for exclude in &self.exclude_docs {
            let normalized = normalize_filter_prefix(exclude);
            if normalized.is_empty() {
                continue;
            }
            if prefix_matches_normalized(&normalized, &doc_id) {
                return false;
            }
        }

        matches_doc_pattern(
            &doc_id,
            self.doc_pattern
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty()),
        )
    }
}

fn normalize_filter_prefix(raw: &str) -> String {
    let mut value = raw.trim().replace('\\', "/");
    while let Some(rest) = value.strip_prefix("./") {
        value = rest.to_string();
    }
    let value = value.trim_matches('/');
    if value == "." {
        return String::new();
    }
    value.to_string()
}

fn prefix_matches_normalized(prefix: &str, doc_id: &str) -> bool {
    if doc_id == prefix {
        return true;
    }

    if !doc_id.starts_with(prefix) {
        return false;
    }

    doc_id.as_bytes().get(prefix.len()) == Some(&b'/')
}

fn matches_doc_pattern(doc_id: &str, pattern: Option<&str>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };

    if !pattern.contains('*') && !pattern.contains('?') {
        return doc_id.contains(pattern);
    }

    glob::Pattern::new(pattern)
        .map(|p| p.matches(doc_id))
        .unwrap_or(false)
}
