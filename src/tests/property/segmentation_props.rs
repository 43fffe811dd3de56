//! Property tests for [`crate::core::segmenter::Segmenter`]: every
//! segmentation must cover the whole input, reconstruct it exactly when
//! tokens are concatenated back together, and be deterministic for the same
//! input and engine.

use proptest::prelude::*;

use crate::core::segmenter::Segmenter;

/// One arbitrary character drawn from Thai letters, Thai combining marks,
/// ASCII letters, digits, punctuation and whitespace — the mix the
/// segmenter's run-splitting has to handle.
fn arb_char() -> impl Strategy<Value = char> {
    prop_oneof![
        3 => prop::char::range('\u{0E01}', '\u{0E2E}'), // Thai consonants
        1 => prop::char::range('\u{0E30}', '\u{0E4D}'), // Thai vowels/tone marks
        2 => prop::char::range('a', 'z'),
        1 => prop::char::range('0', '9'),
        1 => Just(' '),
        1 => Just(','),
    ]
}

fn arb_text() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_char(), 0..40).prop_map(|chars| chars.into_iter().collect())
}

fn newmm() -> Segmenter {
    Segmenter::new("newmm", false, None).unwrap()
}

proptest! {
    /// Invariant 1: the token surfaces, concatenated in order, reconstruct
    /// the original input exactly — whitespace runs are kept as their own
    /// tokens, not dropped, except for the whitespace-only short-circuit
    /// which yields no tokens at all.
    #[test]
    fn reconstruction_matches_input(text in arb_text()) {
        let segmenter = newmm();
        let result = segmenter.segment(&text);
        let reconstructed: String = result.tokens.iter().map(|t| t.surface.as_str()).collect();
        let expected = if text.trim().is_empty() { String::new() } else { text.clone() };
        prop_assert_eq!(reconstructed, expected);
    }

    /// Invariant 2: boundaries start at 0 (or are empty only when there are
    /// no tokens) and always end at the byte length of the input, with no
    /// gaps between a token's end and the next token's start. Whitespace-only
    /// input is a special case (short-circuits to a single `[0]` boundary)
    /// and is excluded here.
    #[test]
    fn boundaries_cover_the_input_without_gaps(text in arb_text()) {
        prop_assume!(!text.trim().is_empty());
        let segmenter = newmm();
        let result = segmenter.segment(&text);
        prop_assert_eq!(*result.boundaries.last().unwrap(), text.len());
        for window in result.tokens.windows(2) {
            prop_assert!(window[0].end_byte <= window[1].start_byte);
        }
    }

    /// Invariant 4: segmenting the same text with the same engine twice
    /// produces identical tokens, byte offsets included.
    #[test]
    fn segmentation_is_deterministic(text in arb_text()) {
        let segmenter = newmm();
        let first = segmenter.segment(&text);
        let second = segmenter.segment(&text);
        prop_assert_eq!(first.tokens.len(), second.tokens.len());
        for (a, b) in first.tokens.iter().zip(second.tokens.iter()) {
            prop_assert_eq!(&a.surface, &b.surface);
            prop_assert_eq!(a.start_byte, b.start_byte);
            prop_assert_eq!(a.end_byte, b.end_byte);
        }
    }

    /// Compound segmentation must keep the same reconstruction guarantee as
    /// plain segmentation.
    #[test]
    fn compound_segmentation_also_reconstructs_input(text in arb_text()) {
        let segmenter = newmm();
        let result = segmenter.segment_compound(&text);
        let reconstructed: String = result.tokens.iter().map(|t| t.surface.as_str()).collect();
        let expected = if text.trim().is_empty() { String::new() } else { text.clone() };
        prop_assert_eq!(reconstructed, expected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_trivial_boundaries() {
        let segmenter = newmm();
        let result = segmenter.segment("");
        assert_eq!(result.boundaries, vec![0]);
    }
}
