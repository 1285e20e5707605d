use context_vector_store::Candidate;

/// Keep hits whose similarity reaches `min_similarity`, in their original order.
///
/// NaN scores never pass.
pub fn similarity_cutoff(candidates: Vec<Candidate>, min_similarity: f32) -> Vec<Candidate> {
    let before = candidates.len();
    let kept: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| c.score >= min_similarity)
        .collect();
    if kept.len() < before {
        log::debug!(
            "Similarity cutoff {:.3} removed {} of {} candidates",
            min_similarity,
            before - kept.len(),
            before
        );
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_scores_at_or_above_threshold() {
        let input = vec![
            Candidate::new("a", "doc", 0, "a", 0.9),
            Candidate::new("b", "doc", 1, "b", 0.2),
            Candidate::new("c", "doc", 2, "c", 0.5),
            Candidate::new("d", "doc", 3, "d", f32::NAN),
        ];
        let kept: Vec<String> = similarity_cutoff(input, 0.5)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn empty_input_is_valid() {
        assert!(similarity_cutoff(Vec::new(), 0.1).is_empty());
    }
}
