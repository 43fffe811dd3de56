//! Search result enhancement: highlight extraction/merging, compound-aware
//! and fuzzy matching, and relevance re-scoring.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::classify::{is_thai_text, ContentType};
use crate::core::query::{process_query, QueryKind};
use crate::core::segmenter::Segmenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighlightKind {
    Exact,
    Partial,
    Compound,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub surface: String,
    pub kind: HighlightKind,
    pub confidence: f64,
    pub matched_query: Option<String>,
}

static HIGHLIGHT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"<em>(.*?)</em>").unwrap(),
        Regex::new(r"<strong>(.*?)</strong>").unwrap(),
        Regex::new(r"<mark>(.*?)</mark>").unwrap(),
        Regex::new(r"\[HIGHLIGHT\](.*?)\[/HIGHLIGHT\]").unwrap(),
    ]
});

/// Extracts highlight spans wrapped by any of the engine's markup
/// conventions (`<em>`, `<strong>`, `<mark>`, or `[HIGHLIGHT]...[/HIGHLIGHT]`).
pub fn extract_highlights(text: &str) -> Vec<HighlightSpan> {
    let mut spans = Vec::new();
    for re in HIGHLIGHT_PATTERNS.iter() {
        for cap in re.captures_iter(text) {
            let inner = cap.get(1).unwrap();
            spans.push(HighlightSpan {
                start: inner.start(),
                end: inner.end(),
                surface: inner.as_str().to_string(),
                kind: HighlightKind::Exact,
                confidence: 1.0,
                matched_query: None,
            });
        }
    }
    spans
}

/// Query-side context a hit gets scored and highlighted against: which of
/// its tokens look like compounds, which look partial, and which are Thai
/// at all.
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    pub processed_query: String,
    pub total_tokens: usize,
    pub compound_tokens: Vec<String>,
    pub partial_tokens: Vec<String>,
    pub thai_tokens: Vec<String>,
    pub search_variants: Vec<String>,
    pub has_compound_words: bool,
    pub has_partial_matches: bool,
    pub is_mixed_language: bool,
}

pub fn analyze_query_for_enhancement(query: &str, segmenter: &Segmenter) -> QueryAnalysis {
    let result = process_query(query, segmenter);
    let compound_tokens: Vec<String> = result
        .tokens
        .iter()
        .filter(|t| t.kind == QueryKind::Compound)
        .map(|t| t.original.clone())
        .collect();
    let partial_tokens: Vec<String> = result.tokens.iter().filter(|t| t.is_partial).map(|t| t.original.clone()).collect();
    let thai_tokens: Vec<String> = result
        .tokens
        .iter()
        .filter(|t| is_thai_text(&t.original))
        .map(|t| t.original.clone())
        .collect();

    QueryAnalysis {
        processed_query: result.processed,
        total_tokens: result.tokens.len(),
        has_compound_words: !compound_tokens.is_empty(),
        has_partial_matches: !partial_tokens.is_empty(),
        is_mixed_language: thai_tokens.len() != result.tokens.len(),
        compound_tokens,
        partial_tokens,
        thai_tokens,
        search_variants: result.variants,
    }
}

/// Splits a compound word into parts worth highlighting, discarding
/// single-character remainders.
fn split_compound_word(compound: &str, segmenter: &Segmenter) -> Vec<String> {
    segmenter
        .segment_compound(compound)
        .tokens
        .into_iter()
        .map(|t| t.surface)
        .filter(|s| s.chars().count() > 1)
        .collect()
}

/// Finds every non-overlapping occurrence of `needle` in `haystack`,
/// returning byte-offset spans.
fn find_occurrences(haystack: &str, needle: &str) -> Vec<(usize, usize)> {
    if needle.is_empty() {
        return Vec::new();
    }
    haystack.match_indices(needle).map(|(start, matched)| (start, start + matched.len())).collect()
}

/// For each compound query token, highlights exact occurrences in `text`
/// (confidence 1.0) and its meaningful sub-components (confidence 0.7).
fn add_compound_highlighting(text: &str, analysis: &QueryAnalysis, segmenter: &Segmenter) -> (Vec<HighlightSpan>, Vec<String>) {
    let mut spans = Vec::new();
    let mut compounds = Vec::new();

    for compound in &analysis.compound_tokens {
        let exact_hits = find_occurrences(text, compound);
        for (start, end) in &exact_hits {
            spans.push(HighlightSpan {
                start: *start,
                end: *end,
                surface: compound.clone(),
                kind: HighlightKind::Compound,
                confidence: 1.0,
                matched_query: Some(compound.clone()),
            });
            compounds.push(compound.clone());
        }

        for part in split_compound_word(compound, segmenter) {
            if part.chars().count() <= 2 {
                continue;
            }
            for (start, end) in find_occurrences(text, &part) {
                spans.push(HighlightSpan {
                    start,
                    end,
                    surface: part.clone(),
                    kind: HighlightKind::Partial,
                    confidence: 0.7,
                    matched_query: Some(format!("{compound} (part: {part})")),
                });
            }
        }
    }

    (spans, compounds)
}

/// Fuzzy-matches every partial query token against the Thai words found in
/// `text`, by substring containment in either direction, keeping matches
/// whose length-ratio confidence is at least 0.6.
pub fn find_fuzzy_matches(text: &str, partial_tokens: &[String], segmenter: &Segmenter) -> Vec<HighlightSpan> {
    let mut spans = Vec::new();
    if partial_tokens.is_empty() {
        return spans;
    }

    let segmentation = segmenter.segment(text);
    for token in &segmentation.tokens {
        if token.content_type != ContentType::Thai {
            continue;
        }
        for query_token in partial_tokens {
            if !is_thai_text(query_token) {
                continue;
            }
            let (shorter, longer) = if query_token.chars().count() <= token.surface.chars().count() {
                (query_token.as_str(), token.surface.as_str())
            } else {
                (token.surface.as_str(), query_token.as_str())
            };
            if !longer.contains(shorter) {
                continue;
            }
            let confidence = shorter.chars().count() as f64 / longer.chars().count() as f64;
            if confidence >= 0.6 {
                spans.push(HighlightSpan {
                    start: token.start_byte,
                    end: token.end_byte,
                    surface: token.surface.clone(),
                    kind: HighlightKind::Fuzzy,
                    confidence,
                    matched_query: Some(query_token.clone()),
                });
            }
        }
    }
    spans
}

/// Merges overlapping spans. The winning span's `kind`/`confidence`/
/// `matched_query`/`surface` (whichever of the two has higher confidence)
/// is kept wholesale rather than textually unioned.
pub fn merge_overlapping_spans(mut spans: Vec<HighlightSpan>) -> Vec<HighlightSpan> {
    if spans.is_empty() {
        return spans;
    }
    spans.sort_by_key(|s| s.start);

    let mut merged: Vec<HighlightSpan> = vec![spans.remove(0)];
    for current in spans {
        let overlaps = {
            let last = merged.last().unwrap();
            current.start <= last.end
        };
        if overlaps {
            let last = merged.last().unwrap().clone();
            let winner = if current.confidence > last.confidence { current.clone() } else { last.clone() };
            let new_start = last.start.min(current.start);
            let new_end = last.end.max(current.end);
            let last_mut = merged.last_mut().unwrap();
            last_mut.start = new_start;
            last_mut.end = new_end;
            last_mut.kind = winner.kind;
            last_mut.confidence = winner.confidence;
            last_mut.matched_query = winner.matched_query;
            last_mut.surface = winner.surface;
        } else {
            merged.push(current);
        }
    }
    merged
}

/// Renders a field with Thai word boundaries marked by `|`, leaving
/// non-Thai tokens untouched, with no additional separator between tokens.
pub fn create_tokenized_version(text: &str, segmenter: &Segmenter) -> String {
    let segmentation = segmenter.segment(text);
    segmentation
        .tokens
        .iter()
        .map(|t| if t.content_type == ContentType::Thai { format!("{}|", t.surface) } else { t.surface.clone() })
        .collect()
}

fn has_highlighted_content(text: &str) -> bool {
    HIGHLIGHT_PATTERNS.iter().any(|re| re.is_match(text))
}

/// Boost for compound-word matches: 1.3x per compound found verbatim in the
/// hit text, or a smaller 0.1x-per-part boost when only some of its
/// components show up. Capped at 2.0x.
fn calculate_compound_boost(hit_text: &str, analysis: &QueryAnalysis, segmenter: &Segmenter) -> f64 {
    if analysis.compound_tokens.is_empty() {
        return 1.0;
    }
    let mut boost = 1.0;
    for compound in &analysis.compound_tokens {
        if hit_text.contains(compound.as_str()) {
            boost *= 1.3;
        } else {
            let parts = split_compound_word(compound, segmenter);
            let partial_matches = parts.iter().filter(|p| hit_text.contains(p.as_str())).count();
            if partial_matches > 0 {
                boost *= 1.0 + 0.1 * partial_matches as f64;
            }
        }
    }
    boost.min(2.0)
}

/// Boost for exact Thai token matches, capped at 1.8x.
fn calculate_thai_match_boost(hit_text: &str, analysis: &QueryAnalysis) -> f64 {
    if analysis.thai_tokens.is_empty() {
        return 1.0;
    }
    let exact_matches = analysis.thai_tokens.iter().filter(|t| hit_text.contains(t.as_str())).count();
    let boost = if exact_matches > 0 { 1.0 + 0.2 * exact_matches as f64 } else { 1.0 };
    boost.min(1.8)
}

/// Re-scores a hit. Each sub-factor is capped individually (compound ≤2.0,
/// Thai-exact ≤1.8, field importance flat at 1.4), and the final product is
/// additionally clamped at 4x the base score so no combination of factors
/// can run away past that ceiling.
pub fn calculate_enhanced_score(
    base_score: f64,
    hit_text: &str,
    analysis: &QueryAnalysis,
    title_highlighted: bool,
    segmenter: &Segmenter,
    enable_relevance_boosting: bool,
) -> f64 {
    if !enable_relevance_boosting {
        return base_score;
    }
    let compound_boost = calculate_compound_boost(hit_text, analysis, segmenter);
    let thai_boost = calculate_thai_match_boost(hit_text, analysis);
    let field_boost = if title_highlighted { 1.4 } else { 1.0 };
    let enhanced = base_score * compound_boost * thai_boost * field_boost;
    enhanced.min(base_score * 4.0)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceFactors {
    pub highlight_density: f64,
    pub compound_matches: usize,
    pub thai_match_ratio: f64,
    pub average_confidence: f64,
    pub title_matches: f64,
    pub content_matches: f64,
}

/// Per-hit breakdown of the signals that fed [`calculate_enhanced_score`].
pub fn calculate_relevance_factors(
    spans: &[HighlightSpan],
    searchable_text_len: usize,
    title_highlighted: bool,
    content_highlighted: bool,
) -> RelevanceFactors {
    let highlighted_chars: usize = spans.iter().map(|s| s.end.saturating_sub(s.start)).sum();
    let highlight_density = if searchable_text_len == 0 { 0.0 } else { highlighted_chars as f64 / searchable_text_len as f64 };
    let compound_matches = spans.iter().filter(|s| s.kind == HighlightKind::Compound).count();
    let thai_spans = spans.iter().filter(|s| is_thai_text(&s.surface)).count();
    let thai_match_ratio = if spans.is_empty() { 0.0 } else { thai_spans as f64 / spans.len() as f64 };
    let average_confidence = if spans.is_empty() { 0.0 } else { spans.iter().map(|s| s.confidence).sum::<f64>() / spans.len() as f64 };

    RelevanceFactors {
        highlight_density,
        compound_matches,
        thai_match_ratio,
        average_confidence,
        title_matches: if title_highlighted { 1.0 } else { 0.0 },
        content_matches: if content_highlighted { 1.0 } else { 0.0 },
    }
}

/// A single result as returned by the search engine, before enhancement.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    pub title: String,
    pub content: String,
    pub formatted_title: Option<String>,
    pub formatted_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancedHit {
    pub id: String,
    pub enhanced_score: f64,
    pub highlights: Vec<HighlightSpan>,
    pub compound_matches: Vec<String>,
    pub tokenized_title: String,
    pub tokenized_content: String,
    pub relevance_factors: RelevanceFactors,
}

fn enhance_field_highlighting(
    original_text: &str,
    highlighted_text: &str,
    analysis: &QueryAnalysis,
    segmenter: &Segmenter,
    enable_compound_highlighting: bool,
) -> (Vec<HighlightSpan>, Vec<String>) {
    let existing_spans = extract_highlights(highlighted_text);
    if !enable_compound_highlighting {
        return (existing_spans, Vec::new());
    }

    let mut spans = existing_spans;
    let (compound_spans, compounds) = add_compound_highlighting(original_text, analysis, segmenter);
    spans.extend(compound_spans);
    spans.extend(find_fuzzy_matches(original_text, &analysis.partial_tokens, segmenter));

    (merge_overlapping_spans(spans), compounds)
}

fn enhance_single_hit(hit: &SearchHit, analysis: &QueryAnalysis, segmenter: &Segmenter, enable_compound_highlighting: bool, enable_relevance_boosting: bool) -> EnhancedHit {
    let title_highlighted_text = hit.formatted_title.as_deref().unwrap_or(&hit.title);
    let content_highlighted_text = hit.formatted_content.as_deref().unwrap_or(&hit.content);

    let (title_spans, title_compounds) =
        enhance_field_highlighting(&hit.title, title_highlighted_text, analysis, segmenter, enable_compound_highlighting);
    let (content_spans, content_compounds) =
        enhance_field_highlighting(&hit.content, content_highlighted_text, analysis, segmenter, enable_compound_highlighting);

    let title_highlighted = !title_spans.is_empty() || has_highlighted_content(title_highlighted_text);
    let content_highlighted = !content_spans.is_empty() || has_highlighted_content(content_highlighted_text);

    let mut compound_matches: Vec<String> = dedup_preserve_order(title_compounds.into_iter().chain(content_compounds));
    compound_matches.sort();

    let mut all_spans = title_spans;
    all_spans.extend(content_spans);

    let hit_text = format!("{} {}", hit.title, hit.content);
    let enhanced_score = calculate_enhanced_score(hit.score, &hit_text, analysis, title_highlighted, segmenter, enable_relevance_boosting);
    let relevance_factors = calculate_relevance_factors(&all_spans, hit_text.chars().count(), title_highlighted, content_highlighted);

    EnhancedHit {
        id: hit.id.clone(),
        enhanced_score,
        highlights: all_spans,
        compound_matches,
        tokenized_title: create_tokenized_version(&hit.title, segmenter),
        tokenized_content: create_tokenized_version(&hit.content, segmenter),
        relevance_factors,
    }
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

/// Enhances a page of search hits for Thai compound words: analyzes the
/// query once, scores and highlights each hit against that analysis, and
/// (when relevance boosting is enabled) re-sorts hits by enhanced score.
pub fn enhance_search_results(
    hits: &[SearchHit],
    query: &str,
    segmenter: &Segmenter,
    enable_compound_highlighting: bool,
    enable_relevance_boosting: bool,
) -> Vec<EnhancedHit> {
    let analysis = analyze_query_for_enhancement(query, segmenter);
    let mut enhanced: Vec<EnhancedHit> =
        hits.iter().map(|hit| enhance_single_hit(hit, &analysis, segmenter, enable_compound_highlighting, enable_relevance_boosting)).collect();

    if enable_relevance_boosting {
        enhanced.sort_by(|a, b| b.enhanced_score.partial_cmp(&a.enhanced_score).unwrap_or(std::cmp::Ordering::Equal));
    }
    enhanced
}
