//! Character and token classification (content-type detection).

use serde::{Deserialize, Serialize};

/// Inclusive Unicode range covering the Thai script block.
const THAI_RANGE: std::ops::RangeInclusive<char> = '\u{0E00}'..='\u{0E7F}';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Thai,
    Latin,
    Numeric,
    Punctuation,
    Whitespace,
    Mixed,
}

pub fn is_thai_char(c: char) -> bool {
    THAI_RANGE.contains(&c)
}

/// Fraction of non-whitespace characters in `text` that fall in the Thai block.
pub fn thai_ratio(text: &str) -> f64 {
    let total = text.chars().filter(|c| !c.is_whitespace()).count();
    if total == 0 {
        return 0.0;
    }
    let thai = text.chars().filter(|c| is_thai_char(*c)).count();
    thai as f64 / total as f64
}

/// True when Thai characters make up a strict majority of `text`.
pub fn is_thai_text(text: &str) -> bool {
    thai_ratio(text) > 0.5
}

/// True when `text` contains both Thai and non-Thai alphanumeric characters.
pub fn has_mixed_content(text: &str) -> bool {
    let thai = text.chars().any(is_thai_char);
    let other_alnum = text.chars().any(|c| c.is_alphanumeric() && !is_thai_char(c));
    thai && other_alnum
}

/// Classifies a token by its dominant character class. A class wins only if
/// it covers a strict majority of the token's characters; otherwise the
/// token is Mixed.
pub fn classify_content(token: &str) -> ContentType {
    if token.trim().is_empty() {
        return ContentType::Whitespace;
    }

    let total = token.chars().count() as f64;
    let thai = token.chars().filter(|c| is_thai_char(*c)).count() as f64;
    let latin = token
        .chars()
        .filter(|c| c.is_alphabetic() && !is_thai_char(*c))
        .count() as f64;
    let numeric = token.chars().filter(|c| c.is_numeric()).count() as f64;
    let punctuation = token
        .chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count() as f64;

    if thai / total > 0.5 {
        ContentType::Thai
    } else if latin / total > 0.5 {
        ContentType::Latin
    } else if numeric / total > 0.5 {
        ContentType::Numeric
    } else if punctuation / total > 0.5 {
        ContentType::Punctuation
    } else {
        ContentType::Mixed
    }
}
