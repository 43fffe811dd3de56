//! Token post-processing: boundary marking and compound-word splitting.
//!
//! Converts a [`SegmentationResult`] into the marker-laden token stream the
//! search engine indexes. Thai tokens get a word-boundary marker and, when
//! they look like compounds, a split; Latin and numeric tokens get
//! space-padded so whitespace-splitting engines treat them as isolated
//! words.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::classify::{classify_content, ContentType};
use crate::core::segmenter::{SegmentationResult, THAI_COMPOUND_PREFIXES, THAI_COMPOUND_SUFFIXES};

/// Separates tokens in the joined, indexable text.
pub const WORD_MARKER: &str = "\u{200B}";
/// Separates the halves of a split compound word.
pub const COMPOUND_MARKER: &str = "\u{200B}\u{200B}";

/// Words long enough to look like compounds but that should never be split:
/// greetings, thanks, and well-known proper nouns.
const KNOWN_LONG_WORDS: &[&str] = &[
    "สวัสดีครับ",
    "สวัสดีค่ะ",
    "ขอบคุณครับ",
    "ขอบคุณค่ะ",
    "ประเทศไทย",
    "กรุงเทพมหานคร",
    "มหาวิทยาลัย",
];

static COMPOUND_PREFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    THAI_COMPOUND_PREFIXES
        .iter()
        .map(|p| Regex::new(&format!("^{p}.+")).expect("static compound prefix pattern"))
        .collect()
});

static COMPOUND_SUFFIX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    THAI_COMPOUND_SUFFIXES
        .iter()
        .map(|s| Regex::new(&format!(".+{s}$")).expect("static compound suffix pattern"))
        .collect()
});

/// Configuration for a [`process_token`] / [`process_tokenization_result`]
/// pass. The default mirrors the source's `TokenProcessor` defaults:
/// compound handling on, the standard known-long-word allowlist.
#[derive(Debug, Clone)]
pub struct TokenProcessorConfig {
    pub handle_compounds: bool,
    pub known_long_words: HashSet<String>,
}

impl Default for TokenProcessorConfig {
    fn default() -> Self {
        Self {
            handle_compounds: true,
            known_long_words: KNOWN_LONG_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TokenProcessorConfig {
    /// Extends the known-long-word allowlist with caller-supplied entries.
    pub fn with_extra_long_words<I: IntoIterator<Item = String>>(mut self, words: I) -> Self {
        self.known_long_words.extend(words);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedToken {
    pub original: String,
    pub processed: String,
    pub content_type: ContentType,
    pub is_compound: bool,
    pub sub_tokens: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenProcessingResult {
    pub tokens: Vec<ProcessedToken>,
    pub tokenized_text: String,
    pub token_count: usize,
    pub compound_count: usize,
}

fn is_known_long_word(surface: &str, config: &TokenProcessorConfig) -> bool {
    config.known_long_words.contains(surface)
}

/// Potentially-compound: long enough, primarily Thai, and not allowlisted.
fn is_potential_compound(surface: &str, content_type: ContentType, config: &TokenProcessorConfig) -> bool {
    surface.chars().count() > 6 && content_type == ContentType::Thai && !is_known_long_word(surface, config)
}

/// Splits on the first matching compound affix pattern. Prefix patterns are
/// tried before suffix patterns, mirroring the fixed ordered list of
/// compound predicates.
fn split_on_compound_pattern(surface: &str) -> Option<Vec<String>> {
    for (pattern, prefix) in COMPOUND_PREFIX_PATTERNS.iter().zip(THAI_COMPOUND_PREFIXES) {
        if pattern.is_match(surface) {
            if let Some(rest) = surface.strip_prefix(prefix) {
                if !rest.is_empty() {
                    return Some(vec![(*prefix).to_string(), rest.to_string()]);
                }
            }
        }
    }
    for (pattern, suffix) in COMPOUND_SUFFIX_PATTERNS.iter().zip(THAI_COMPOUND_SUFFIXES) {
        if pattern.is_match(surface) {
            if let Some(rest) = surface.strip_suffix(suffix) {
                if !rest.is_empty() {
                    return Some(vec![rest.to_string(), (*suffix).to_string()]);
                }
            }
        }
    }
    None
}

fn midpoint_split(surface: &str) -> Vec<String> {
    let chars: Vec<char> = surface.chars().collect();
    let mid = chars.len() / 2;
    vec![chars[..mid].iter().collect(), chars[mid..].iter().collect()]
}

/// Processes a single segmenter token against the default configuration.
pub fn process_token(surface: &str) -> ProcessedToken {
    process_token_with_config(surface, &TokenProcessorConfig::default())
}

/// Processes a single segmenter token, applying rules 1-4 of the
/// post-processor contract.
pub fn process_token_with_config(surface: &str, config: &TokenProcessorConfig) -> ProcessedToken {
    let content_type = classify_content(surface);

    match content_type {
        ContentType::Thai => process_thai_token(surface, config),
        ContentType::Latin | ContentType::Numeric => ProcessedToken {
            original: surface.to_string(),
            processed: format!(" {surface} "),
            content_type,
            is_compound: false,
            sub_tokens: None,
        },
        ContentType::Punctuation | ContentType::Whitespace => ProcessedToken {
            original: surface.to_string(),
            processed: surface.to_string(),
            content_type,
            is_compound: false,
            sub_tokens: None,
        },
        ContentType::Mixed => process_mixed_token(surface, config),
    }
}

fn process_thai_token(surface: &str, config: &TokenProcessorConfig) -> ProcessedToken {
    if config.handle_compounds && is_potential_compound(surface, ContentType::Thai, config) {
        let sub_tokens = split_on_compound_pattern(surface).unwrap_or_else(|| midpoint_split(surface));
        let processed = format!("{}{WORD_MARKER}", sub_tokens.join(COMPOUND_MARKER));
        return ProcessedToken {
            original: surface.to_string(),
            processed,
            content_type: ContentType::Thai,
            is_compound: true,
            sub_tokens: Some(sub_tokens),
        };
    }

    ProcessedToken {
        original: surface.to_string(),
        processed: format!("{surface}{WORD_MARKER}"),
        content_type: ContentType::Thai,
        is_compound: false,
        sub_tokens: None,
    }
}

/// Rule 5: scan a mixed token, split into maximal single-category runs, and
/// process each run by rules 2-4, concatenating the results.
fn process_mixed_token(surface: &str, config: &TokenProcessorConfig) -> ProcessedToken {
    let mut runs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_type: Option<ContentType> = None;

    for c in surface.chars() {
        let char_type = classify_content(&c.to_string());
        match current_type {
            Some(t) if t == char_type => current.push(c),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
                current.push(c);
                current_type = Some(char_type);
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    let sub_tokens: Vec<ProcessedToken> = runs.iter().map(|r| process_token_with_config(r, config)).collect();
    let processed: String = sub_tokens.iter().map(|t| t.processed.as_str()).collect();
    let is_compound = sub_tokens.iter().any(|t| t.is_compound);

    ProcessedToken {
        original: surface.to_string(),
        processed,
        content_type: ContentType::Mixed,
        is_compound,
        sub_tokens: None,
    }
}

/// Processes every token in a segmentation result against the default
/// configuration, joining the results into the text that gets indexed.
pub fn process_tokenization_result(result: &SegmentationResult) -> TokenProcessingResult {
    process_tokenization_result_with_config(result, &TokenProcessorConfig::default())
}

pub fn process_tokenization_result_with_config(
    result: &SegmentationResult,
    config: &TokenProcessorConfig,
) -> TokenProcessingResult {
    let tokens: Vec<ProcessedToken> = result
        .tokens
        .iter()
        .map(|t| process_token_with_config(&t.surface, config))
        .collect();

    let tokenized_text = tokens.iter().map(|t| t.processed.as_str()).collect::<String>();

    let compound_count = tokens.iter().filter(|t| t.is_compound).count();
    let token_count = tokens
        .iter()
        .map(|t| match &t.sub_tokens {
            Some(subs) => subs.len(),
            None => 1,
        })
        .sum();

    TokenProcessingResult {
        tokens,
        tokenized_text,
        token_count,
        compound_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::segmenter::Segmenter;

    #[test]
    fn short_thai_token_is_not_split() {
        let token = process_token("บ้าน");
        assert!(!token.is_compound);
        assert_eq!(token.processed, format!("บ้าน{WORD_MARKER}"));
    }

    #[test]
    fn known_long_word_is_never_split() {
        let token = process_token("ประเทศไทย");
        assert!(!token.is_compound);
    }

    #[test]
    fn long_word_matching_prefix_pattern_splits_on_prefix() {
        let token = process_token("การศึกษาศาสตร์");
        assert!(token.is_compound);
        let subs = token.sub_tokens.unwrap();
        assert_eq!(subs[0], "การ");
        let rejoined: String = subs.concat();
        assert_eq!(rejoined, "การศึกษาศาสตร์");
    }

    #[test]
    fn long_word_without_pattern_match_falls_back_to_midpoint_split() {
        let token = process_token("เทคโนโลยีสารสนเทศ");
        assert!(token.is_compound);
        let subs = token.sub_tokens.unwrap();
        assert_eq!(subs.len(), 2);
        let rejoined: String = subs.concat();
        assert_eq!(rejoined, "เทคโนโลยีสารสนเทศ");
    }

    #[test]
    fn non_thai_token_passes_through() {
        let token = process_token("hello");
        assert!(!token.is_compound);
        assert_eq!(token.content_type, ContentType::Latin);
    }

    #[test]
    fn latin_token_is_space_padded() {
        let token = process_token("Apple");
        assert_eq!(token.processed, " Apple ");
    }

    #[test]
    fn numeric_token_is_space_padded() {
        let token = process_token("45,900");
        assert_eq!(token.processed, " 45,900 ");
    }

    #[test]
    fn disabling_compounds_keeps_long_token_whole() {
        let config = TokenProcessorConfig {
            handle_compounds: false,
            ..TokenProcessorConfig::default()
        };
        let token = process_token_with_config("เทคโนโลยีสารสนเทศ", &config);
        assert!(!token.is_compound);
    }

    #[test]
    fn tokenization_result_joins_with_word_marker() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let seg = segmenter.segment("hello world");
        let processed = process_tokenization_result(&seg);
        assert!(processed.tokenized_text.contains(' '));
    }
}
