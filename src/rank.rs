//! Candidate disambiguation.

use crate::models::SearchCandidate;

/// Picks the best candidate from an already-ranked list.
///
/// The extractor sorts candidates by relevance before they reach this
/// point, so the best match is simply the head of the list. Kept as a
/// named seam so a richer policy (year proximity, popularity) can slot in
/// without touching callers.
#[must_use]
pub fn best_match(candidates: &[SearchCandidate]) -> Option<&SearchCandidate> {
    candidates.first()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_match_takes_head() {
        let candidates = vec![
            SearchCandidate::new("Exact Match", 1.0),
            SearchCandidate::new("Weaker Match", 0.5),
        ];
        assert_eq!(best_match(&candidates).map(|c| c.title.as_str()), Some("Exact Match"));
    }

    #[test]
    fn test_best_match_empty() {
        assert!(best_match(&[]).is_none());
    }
}
