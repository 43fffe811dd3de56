//! Query processing: normalization, classification, variant generation and
//! completion suggestions for partial/compound Thai queries.

use std::collections::HashSet;
use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::classify::{has_mixed_content, thai_ratio};
use crate::core::segmenter::Segmenter;

const THAI_PREFIXES: &[&str] = &["การ", "ความ", "นัก", "ผู้", "คน", "เจ้า"];
const THAI_SUFFIXES: &[&str] = &["ศาสตร์", "วิทยา", "กรรม", "ภาพ", "การ", "ความ"];

/// Compound patterns with capture groups: used both to classify a token as
/// Compound and, via the captured groups, to recover its component parts.
static COMPOUND_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new("^การ(.+)$").unwrap(),
        Regex::new("^(.+)ความ(.+)$").unwrap(),
        Regex::new("^(.+)โรง(.+)$").unwrap(),
        Regex::new("^(.+)ศาสตร์$").unwrap(),
        Regex::new("^(.+)วิทยา$").unwrap(),
        Regex::new("^(.+)กรรม$").unwrap(),
        Regex::new("^(.+)ภาพ$").unwrap(),
    ]
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Simple,
    Compound,
    Partial,
    Mixed,
    Phrase,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryToken {
    pub original: String,
    pub processed: String,
    pub kind: QueryKind,
    pub is_partial: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compound_parts: Option<Vec<String>>,
    pub variants: Vec<String>,
    pub boost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryMetadata {
    pub original_token_count: usize,
    pub processed_token_count: usize,
    pub thai_tokens: usize,
    pub partial_tokens: usize,
    pub compound_tokens: usize,
    pub elapsed_ms: f64,
    pub query_expansion_enabled: bool,
    pub partial_matching_enabled: bool,
    pub query_type: QueryKind,
    #[serde(default)]
    pub compound_enhanced: bool,
    #[serde(default)]
    pub additional_variants_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryProcessingResult {
    pub original: String,
    pub processed: String,
    pub tokens: Vec<QueryToken>,
    pub variants: Vec<String>,
    pub completions: Vec<String>,
    pub metadata: QueryMetadata,
}

/// Query-side Thai detection is intentionally more permissive than the
/// document-side >50% rule: short queries skew easily, so >30% is enough to
/// treat a query as Thai.
pub fn is_thai_query_text(text: &str) -> bool {
    thai_ratio(text) > 0.3
}

pub fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_compound_pattern_match(token: &str) -> bool {
    COMPOUND_PATTERNS.iter().any(|re| re.is_match(token))
}

/// Recovers a compound token's components from whichever pattern matched,
/// falling back to a midpoint split for tokens longer than six characters.
fn extract_compound_parts(token: &str) -> Option<Vec<String>> {
    for pattern in COMPOUND_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(token) {
            let parts: Vec<String> = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .filter(|s| s.chars().count() > 1)
                .collect();
            if parts.len() > 1 {
                return Some(parts);
            }
        }
    }
    if token.chars().count() > 6 {
        return Some(midpoint_split(token));
    }
    None
}

fn midpoint_split(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    let mid = chars.len() / 2;
    vec![chars[..mid].iter().collect(), chars[mid..].iter().collect()]
}

/// A token looks partial if it's very short, or if it ends with a string
/// that's normally a *prefix* (suggesting the real prefix got truncated
/// off the front), or starts with a string that's normally a *suffix*
/// (suggesting the word continues but its suffix arrived without a head).
fn is_partial_token(token: &str) -> bool {
    if !is_thai_query_text(token) {
        return false;
    }
    let char_len = token.chars().count();
    if char_len <= 2 {
        return true;
    }
    for prefix in THAI_PREFIXES {
        if token.ends_with(prefix) && char_len > prefix.chars().count() {
            return true;
        }
    }
    for suffix in THAI_SUFFIXES {
        if token.starts_with(suffix) && char_len > suffix.chars().count() {
            return true;
        }
    }
    false
}

/// Non-Thai single token -> Simple; compound-pattern match -> Compound;
/// mixed-script token -> Mixed; internal whitespace -> Phrase; short or
/// edge-truncated Thai -> Partial; else Simple.
fn classify_token_kind(token: &str) -> QueryKind {
    if !is_thai_query_text(token) {
        return QueryKind::Simple;
    }
    if is_compound_pattern_match(token) {
        return QueryKind::Compound;
    }
    if has_mixed_content(token) {
        return QueryKind::Mixed;
    }
    if token.trim().contains(' ') {
        return QueryKind::Phrase;
    }
    if is_partial_token(token) {
        return QueryKind::Partial;
    }
    QueryKind::Simple
}

/// Prefix-matched tokens (they start with a known prefix) get a suffix
/// appended to their end; suffix-matched tokens get a prefix prepended to
/// their start. This asymmetry mirrors how a truncated query is usually
/// missing the *other* half of the word.
fn generate_completions(token: &str) -> Vec<String> {
    let mut completions = Vec::new();
    if THAI_PREFIXES.iter().any(|p| token.starts_with(p)) {
        completions.push(format!("{token}การ"));
        completions.push(format!("{token}ความ"));
    }
    if THAI_SUFFIXES.iter().any(|s| token.ends_with(s)) {
        completions.push(format!("การ{token}"));
        completions.push(format!("ความ{token}"));
    }
    completions
}

fn calculate_boost_score(token: &str, kind: QueryKind) -> f64 {
    let mut score = 1.0;
    if kind == QueryKind::Compound {
        score *= 1.2;
    }
    let char_len = token.chars().count();
    if char_len > 6 {
        score *= 1.1;
    }
    if char_len <= 2 {
        score *= 0.8;
    }
    score
}

/// Wildcard-style variants, kept as opaque strings: the downstream search
/// engine interprets `*` itself, this layer never expands them.
fn generate_variants(token: &str) -> Vec<String> {
    vec![format!("{token}*"), format!("*{token}"), format!("*{token}*")]
}

/// Captured-group and midpoint compound variants, used to widen matching
/// for tokens that look like part of a longer compound.
fn generate_compound_variants(token: &str) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    let mut push = |variants: &mut Vec<String>, seen: &mut HashSet<String>, s: String| {
        if seen.insert(s.clone()) {
            variants.push(s);
        }
    };

    for pattern in COMPOUND_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(token) {
            let groups: Vec<String> = captures
                .iter()
                .skip(1)
                .flatten()
                .map(|m| m.as_str().to_string())
                .collect();
            for group in &groups {
                if group.chars().count() > 1 {
                    push(&mut variants, &mut seen, group.clone());
                }
            }
            if groups.len() >= 2 {
                push(&mut variants, &mut seen, groups.concat());
            }
        }
    }

    let char_len = token.chars().count();
    if char_len / 2 > 2 {
        let chars: Vec<char> = token.chars().collect();
        let mid = chars.len() / 2;
        push(&mut variants, &mut seen, chars[..mid].iter().collect());
        push(&mut variants, &mut seen, chars[mid..].iter().collect());
    }

    variants
}

/// Full search-variant set for one token: the token itself, wildcard forms,
/// and (for tokens longer than four characters) compound variants.
fn build_token_variants(token: &str) -> Vec<String> {
    if !is_thai_query_text(token) {
        return vec![token.to_string()];
    }
    let mut variants = vec![token.to_string()];
    variants.extend(generate_variants(token));
    if token.chars().count() > 4 {
        variants.extend(generate_compound_variants(token));
    }
    variants
}

fn process_token_for_search(token: &str, kind: QueryKind) -> String {
    if !is_thai_query_text(token) {
        return token.to_string();
    }
    if kind == QueryKind::Compound {
        return format!("{token}\u{200B}");
    }
    token.to_string()
}

fn dedup_preserve_order(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

fn is_phrase_query(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.len() > 1 && trimmed.starts_with('"') && trimmed.ends_with('"')
}

/// Normalizes, segments and classifies a search query.
pub fn process_query(raw: &str, segmenter: &Segmenter) -> QueryProcessingResult {
    let start = Instant::now();

    if raw.trim().is_empty() {
        return QueryProcessingResult {
            original: raw.to_string(),
            processed: raw.to_string(),
            tokens: Vec::new(),
            variants: Vec::new(),
            completions: Vec::new(),
            metadata: QueryMetadata {
                original_token_count: 0,
                processed_token_count: 0,
                thai_tokens: 0,
                partial_tokens: 0,
                compound_tokens: 0,
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                query_expansion_enabled: true,
                partial_matching_enabled: true,
                query_type: QueryKind::Simple,
                compound_enhanced: false,
                additional_variants_count: 0,
            },
        };
    }

    let normalized = normalize(raw);
    let segmentation = segmenter.segment(&normalized);

    let tokens: Vec<QueryToken> = segmentation
        .tokens
        .iter()
        .filter(|t| !t.surface.trim().is_empty())
        .map(|t| {
            let surface = t.surface.clone();
            let kind = classify_token_kind(&surface);
            let is_partial = is_partial_token(&surface);
            let boost = calculate_boost_score(&surface, kind);
            let variants = build_token_variants(&surface);
            let compound_parts = if kind == QueryKind::Compound {
                extract_compound_parts(&surface)
            } else {
                None
            };
            let processed = process_token_for_search(&surface, kind);

            QueryToken {
                original: surface,
                processed,
                kind,
                is_partial,
                compound_parts,
                variants,
                boost,
            }
        })
        .collect();

    let processed = tokens
        .iter()
        .filter(|t| !t.processed.trim().is_empty())
        .map(|t| t.processed.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let variants = dedup_preserve_order(tokens.iter().flat_map(|t| t.variants.clone()));

    let completions: Vec<String> = dedup_preserve_order(
        tokens
            .iter()
            .filter(|t| t.is_partial)
            .flat_map(|t| generate_completions(&t.original)),
    )
    .into_iter()
    .take(10)
    .collect();

    let thai_tokens = tokens.iter().filter(|t| is_thai_query_text(&t.original)).count();
    let partial_tokens = tokens.iter().filter(|t| t.is_partial).count();
    let compound_tokens = tokens.iter().filter(|t| t.kind == QueryKind::Compound).count();

    let query_type = if is_phrase_query(raw) {
        QueryKind::Phrase
    } else if tokens.iter().any(|t| is_thai_query_text(&t.original)) && tokens.iter().any(|t| !is_thai_query_text(&t.original))
    {
        QueryKind::Mixed
    } else if compound_tokens > 0 {
        QueryKind::Compound
    } else if partial_tokens > 0 {
        QueryKind::Partial
    } else {
        QueryKind::Simple
    };

    QueryProcessingResult {
        original: raw.to_string(),
        processed,
        metadata: QueryMetadata {
            original_token_count: segmentation.tokens.len(),
            processed_token_count: tokens.len(),
            thai_tokens,
            partial_tokens,
            compound_tokens,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            query_expansion_enabled: true,
            partial_matching_enabled: true,
            query_type,
            compound_enhanced: false,
            additional_variants_count: 0,
        },
        tokens,
        variants,
        completions,
    }
}

/// Second entry point for compound-leaning queries: re-examines every token
/// for a compound affix *anywhere* in the surface (not just edge-anchored),
/// boosting and widening variants for anything the first pass missed.
pub fn process_partial_compound_query(raw: &str, segmenter: &Segmenter) -> QueryProcessingResult {
    let mut result = process_query(raw, segmenter);
    let mut additional_variants = Vec::new();

    for token in result.tokens.iter_mut() {
        let substring_compound = THAI_PREFIXES.iter().any(|p| token.original.contains(p))
            || THAI_SUFFIXES.iter().any(|s| token.original.contains(s))
            || is_compound_pattern_match(&token.original);
        if substring_compound && token.kind != QueryKind::Compound {
            token.kind = QueryKind::Compound;
            token.is_partial = true;
            token.boost = 1.2;
            token.compound_parts = extract_compound_parts(&token.original);
            let compound_variants = generate_compound_variants(&token.original);
            additional_variants.extend(compound_variants.iter().cloned());
            token.variants = dedup_preserve_order(token.variants.iter().cloned().chain(compound_variants));
        }
    }

    result.variants = dedup_preserve_order(result.variants.into_iter().chain(additional_variants.clone()));
    result.metadata.compound_tokens = result.tokens.iter().filter(|t| t.kind == QueryKind::Compound).count();
    result.metadata.compound_enhanced = true;
    result.metadata.additional_variants_count = additional_variants.len();
    if result.metadata.compound_tokens > 0 && result.metadata.query_type == QueryKind::Simple {
        result.metadata.query_type = QueryKind::Compound;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> Segmenter {
        Segmenter::new("newmm", false, None).unwrap()
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  สวัสดี   ครับ  "), "สวัสดี ครับ");
    }

    #[test]
    fn short_token_is_partial() {
        assert!(is_partial_token("กร"));
    }

    #[test]
    fn short_non_thai_token_is_not_partial() {
        assert!(!is_partial_token("ok"));
    }

    #[test]
    fn boost_score_penalizes_very_short_tokens() {
        assert!(calculate_boost_score("กร", QueryKind::Simple) < 1.0);
    }

    #[test]
    fn boost_score_rewards_long_compound_tokens() {
        let score = calculate_boost_score("การศึกษาศาสตร์", QueryKind::Compound);
        assert!(score > 1.2);
    }

    #[test]
    fn variants_are_opaque_wildcard_strings() {
        let variants = generate_variants("รถ");
        assert_eq!(variants, vec!["รถ*", "*รถ", "*รถ*"]);
    }

    #[test]
    fn phrase_query_classified_as_phrase() {
        let result = process_query("\"รถยนต์ไฟฟ้า\"", &segmenter());
        assert_eq!(result.metadata.query_type, QueryKind::Phrase);
    }

    #[test]
    fn mixed_query_contains_both_scripts() {
        let result = process_query("รถ car", &segmenter());
        assert_eq!(result.metadata.query_type, QueryKind::Mixed);
    }

    #[test]
    fn partial_compound_pass_widens_compound_detection() {
        let result = process_partial_compound_query("นักศึกษา", &segmenter());
        assert!(result.tokens.iter().any(|t| t.kind == QueryKind::Compound));
        assert!(result.metadata.compound_enhanced);
    }

    #[test]
    fn completions_are_capped_at_ten() {
        let result = process_query("กร นก ผ ต คน ดด รร ชช ฟฟ หห ญญ", &segmenter());
        assert!(result.completions.len() <= 10);
    }

    #[test]
    fn empty_query_returns_no_tokens() {
        let result = process_query("   ", &segmenter());
        assert!(result.tokens.is_empty());
    }
}
