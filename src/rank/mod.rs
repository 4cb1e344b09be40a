//! Deterministic ordering of ranked entries.
//!
//! Ordering is total: value descending (`f64::total_cmp`), then entity id
//! ascending. Two runs over the same inputs always produce the same order.

use std::cmp::Ordering;

use crate::domain::{ComparisonResult, RankEntry};
use crate::error::EngineError;

/// Comparator used by every ranking.
pub fn rank_order(a: &RankEntry, b: &RankEntry) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Sort `entries`, optionally keep the first `top_n`, and wrap them.
///
/// `top_n = Some(0)` is rejected with `InvalidLimit`.
pub fn build_ranking(
    sort_key: impl Into<String>,
    year: i32,
    mut entries: Vec<RankEntry>,
    top_n: Option<usize>,
) -> Result<ComparisonResult, EngineError> {
    if let Some(0) = top_n {
        return Err(EngineError::InvalidLimit(0));
    }
    entries.sort_by(rank_order);
    if let Some(n) = top_n {
        entries.truncate(n);
    }
    Ok(ComparisonResult {
        sort_key: sort_key.into(),
        year,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, value: f64) -> RankEntry {
        RankEntry {
            entity_id: id.to_string(),
            value,
        }
    }

    #[test]
    fn sorts_descending_with_lexical_tie_break() {
        let entries = vec![entry("Mali", 0.3), entry("USA", 0.7), entry("China", 0.7), entry("Algeria", 0.3)];
        let result = build_ranking("probability", 2050, entries, None).unwrap();
        assert_eq!(result.ids(), vec!["China", "USA", "Algeria", "Mali"]);
        assert_eq!(result.year, 2050);
    }

    #[test]
    fn truncates_and_rejects_zero_limit() {
        let entries = vec![entry("a", 0.1), entry("b", 0.2), entry("c", 0.3)];
        let top = build_ranking("p", 2030, entries.clone(), Some(2)).unwrap();
        assert_eq!(top.ids(), vec!["c", "b"]);

        let all = build_ranking("p", 2030, entries.clone(), Some(10)).unwrap();
        assert_eq!(all.entries.len(), 3);

        assert_eq!(
            build_ranking("p", 2030, entries, Some(0)).unwrap_err(),
            EngineError::InvalidLimit(0)
        );
    }

    #[test]
    fn ordering_is_independent_of_input_order() {
        let a = vec![entry("x", 0.5), entry("y", 0.5), entry("z", 0.9)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(
            build_ranking("p", 2040, a, None).unwrap(),
            build_ranking("p", 2040, b, None).unwrap()
        );
    }
}
