use context_vector_store::Candidate;
use std::collections::HashSet;

/// Drop candidates whose id or content hash was already emitted, keeping first occurrences.
///
/// Only emitted candidates register their id/hash, so a dropped candidate never shadows
/// a later one. The result has pairwise-distinct ids and hashes, which makes the pass
/// idempotent.
pub fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    if candidates.is_empty() {
        return candidates;
    }

    let before = candidates.len();
    let mut seen_ids: HashSet<String> = HashSet::with_capacity(before);
    let mut seen_hashes: HashSet<String> = HashSet::with_capacity(before);

    let mut kept = Vec::with_capacity(before);
    for candidate in candidates {
        if seen_ids.contains(&candidate.id) || seen_hashes.contains(&candidate.content_hash) {
            continue;
        }
        seen_ids.insert(candidate.id.clone());
        seen_hashes.insert(candidate.content_hash.clone());
        kept.push(candidate);
    }

    if kept.len() < before {
        log::debug!("Dedup removed {} of {} candidates", before - kept.len(), before);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn cand(id: &str, text: &str) -> Candidate {
        Candidate::new(id, "doc", 0, text, 0.5)
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn drops_identity_and_content_duplicates() {
        let input = vec![
            cand("a", "x"),
            cand("b", "x"),
            cand("a", "z"),
            cand("c", "y"),
        ];
        assert_eq!(ids(&dedup(input)), vec!["a", "c"]);
    }

    #[test]
    fn dropped_candidates_do_not_shadow_later_ones() {
        // "b" loses to "a" on content; a later "b" with fresh content survives.
        let input = vec![cand("a", "x"), cand("b", "x"), cand("b", "y")];
        let out = dedup(input);
        assert_eq!(ids(&out), vec!["a", "b"]);
        assert_eq!(out[1].text, "y");
    }

    #[test]
    fn whitespace_variants_are_content_duplicates() {
        let input = vec![cand("a", "hello   world"), cand("b", " hello world\n")];
        assert_eq!(ids(&dedup(input)), vec!["a"]);
    }

    #[test]
    fn empty_input_is_valid() {
        assert!(dedup(Vec::new()).is_empty());
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
        prop::collection::vec((0u8..6, 0u8..6), 0..24).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(id, text)| cand(&format!("c{id}"), &format!("text {text}")))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn proptest_dedup_is_idempotent(input in arb_candidates()) {
            let once = dedup(input);
            let twice = dedup(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn proptest_dedup_output_is_unique(input in arb_candidates()) {
            let out = dedup(input);
            let ids: HashSet<&str> = out.iter().map(|c| c.id.as_str()).collect();
            let hashes: HashSet<&str> = out.iter().map(|c| c.content_hash.as_str()).collect();
            prop_assert_eq!(ids.len(), out.len());
            prop_assert_eq!(hashes.len(), out.len());
        }

        #[test]
        fn proptest_dedup_preserves_relative_order(input in arb_candidates()) {
            let out = dedup(input.clone());
            // `out` must be a subsequence of `input`.
            let mut cursor = input.iter();
            for kept in &out {
                prop_assert!(cursor.any(|c| c == kept));
            }
        }
    }
}
