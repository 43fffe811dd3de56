//! Property test for the highlight-merging invariant: after
//! [`crate::core::enhance::merge_overlapping_spans`] runs, no two spans in
//! the result overlap.

use proptest::prelude::*;

use crate::core::enhance::{merge_overlapping_spans, HighlightKind, HighlightSpan};

fn arb_kind() -> impl Strategy<Value = HighlightKind> {
    prop_oneof![
        Just(HighlightKind::Exact),
        Just(HighlightKind::Partial),
        Just(HighlightKind::Compound),
        Just(HighlightKind::Fuzzy),
    ]
}

fn arb_span() -> impl Strategy<Value = HighlightSpan> {
    (0usize..30, 1usize..15, arb_kind(), 0.0f64..1.0).prop_map(|(start, len, kind, confidence)| HighlightSpan {
        start,
        end: start + len,
        surface: "x".repeat(len),
        kind,
        confidence,
        matched_query: None,
    })
}

proptest! {
    /// Invariant 7: whatever overlapping spans go in, the merged output has
    /// no two spans left overlapping (sorted by start, each span's start is
    /// strictly past the previous span's end).
    #[test]
    fn merge_leaves_no_overlapping_spans(spans in prop::collection::vec(arb_span(), 0..25)) {
        let merged = merge_overlapping_spans(spans);
        for window in merged.windows(2) {
            prop_assert!(window[0].end < window[1].start);
        }
    }

    /// Merging is idempotent: running it twice gives the same spans.
    #[test]
    fn merge_is_idempotent(spans in prop::collection::vec(arb_span(), 0..25)) {
        let once = merge_overlapping_spans(spans);
        let twice = merge_overlapping_spans(once.clone());
        prop_assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            prop_assert_eq!(a.start, b.start);
            prop_assert_eq!(a.end, b.end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spans_merge_to_empty() {
        assert!(merge_overlapping_spans(Vec::new()).is_empty());
    }
}
