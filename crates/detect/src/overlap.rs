//! Overlap resolution between candidate mentions.

use std::cmp::Ordering;

use crate::models::CurrencyMention;

/// Reduces overlapping candidates to a non-overlapping set.
pub struct OverlapResolver;

impl OverlapResolver {
    /// Keep the best non-overlapping candidates.
    ///
    /// Candidates are ranked by confidence (descending), then by start
    /// position (ascending); full ties keep their input order. Walking that
    /// ranking, a candidate is kept when it overlaps nothing already kept.
    /// The output is in ranking order, so the first mention is the best one.
    ///
    /// Resolving an already-resolved list returns it unchanged.
    pub fn resolve(candidates: Vec<CurrencyMention>) -> Vec<CurrencyMention> {
        let mut ranked = candidates;
        ranked.sort_by(rank);

        let mut kept: Vec<CurrencyMention> = Vec::with_capacity(ranked.len());
        for candidate in ranked {
            if !kept.iter().any(|k| k.overlaps(&candidate)) {
                kept.push(candidate);
            }
        }
        kept
    }
}

fn rank(a: &CurrencyMention, b: &CurrencyMention) -> Ordering {
    b.confidence
        .total_cmp(&a.confidence)
        .then_with(|| a.start().cmp(&b.start()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MentionFormat;
    use rust_decimal_macros::dec;
    use std::ops::Range;

    fn candidate(range: Range<usize>, confidence: f64, code: &str) -> CurrencyMention {
        CurrencyMention {
            amount: dec!(10),
            currency_code: code.to_string(),
            source_text: String::new(),
            range,
            format: MentionFormat::SymbolPrefix,
            confidence,
        }
    }

    #[test]
    fn test_higher_confidence_wins_overlap() {
        let resolved = OverlapResolver::resolve(vec![
            candidate(0..10, 0.7, "USD"),
            candidate(2..6, 0.9, "EUR"),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].currency_code, "EUR");
    }

    #[test]
    fn test_confidence_tie_prefers_earlier_start() {
        let resolved = OverlapResolver::resolve(vec![
            candidate(3..8, 0.8, "GBP"),
            candidate(0..5, 0.8, "USD"),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].currency_code, "USD");
    }

    #[test]
    fn test_length_does_not_break_ties() {
        let resolved = OverlapResolver::resolve(vec![
            candidate(1..12, 0.8, "EUR"),
            candidate(0..3, 0.8, "USD"),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].currency_code, "USD");
    }

    #[test]
    fn test_full_tie_keeps_input_order() {
        let resolved = OverlapResolver::resolve(vec![
            candidate(0..5, 0.7, "CAD"),
            candidate(0..5, 0.7, "AUD"),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].currency_code, "CAD");
    }

    #[test]
    fn test_adjacent_spans_both_survive() {
        let resolved = OverlapResolver::resolve(vec![
            candidate(0..4, 0.8, "USD"),
            candidate(4..9, 0.9, "EUR"),
        ]);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].currency_code, "EUR");
        assert_eq!(resolved[1].currency_code, "USD");
    }

    #[test]
    fn test_chain_of_overlaps() {
        // B beats A and C; A and C do not overlap each other but both lose.
        let resolved = OverlapResolver::resolve(vec![
            candidate(0..4, 0.8, "A"),
            candidate(3..7, 0.9, "B"),
            candidate(6..10, 0.8, "C"),
        ]);
        let codes: Vec<_> = resolved.iter().map(|m| m.currency_code.as_str()).collect();
        assert_eq!(codes, vec!["B"]);
    }

    #[test]
    fn test_idempotent() {
        let once = OverlapResolver::resolve(vec![
            candidate(0..4, 0.8, "A"),
            candidate(3..7, 0.9, "B"),
            candidate(8..10, 0.7, "C"),
        ]);
        let twice = OverlapResolver::resolve(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty() {
        assert!(OverlapResolver::resolve(Vec::new()).is_empty());
    }
}
