//! Thai word segmentation.
//!
//! Splits Thai text into word-boundary tokens against a hot-reloadable
//! compound dictionary. Non-Thai runs (Latin words, numbers, punctuation,
//! whitespace) are grouped by character class ahead of dictionary lookup, so
//! a mixed-content string never gets chopped into single characters outside
//! the Thai spans. The underlying Thai word-splitting algorithm is pluggable
//! behind [`SegmenterEngine`]; [`DictionaryEngine`] (tagged `newmm`) is the
//! default, with `attacut`/`deepcut`-labelled engines standing in for the
//! alternate backends the compound pass falls back across.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::classify::{classify_content, is_thai_char, ContentType};

/// Marks a word boundary inside joined tokenized output.
pub const WORD_MARKER: char = '\u{200B}';

/// Engine label used when the requested engine is not recognized and
/// segmentation falls back to a deterministic character-level pass.
pub const FALLBACK_CHAR_LABEL: &str = "fallback_char";

#[derive(Debug, Error)]
pub enum SegmenterError {
    #[error("failed to read dictionary file {path}: {source}")]
    DictionaryIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse dictionary file {path}: {source}")]
    DictionaryParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, SegmenterError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub surface: String,
    pub start_byte: usize,
    pub end_byte: usize,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub input: String,
    pub tokens: Vec<Token>,
    pub boundaries: Vec<usize>,
    pub engine_label: String,
    pub elapsed_ms: f64,
    /// True when the deterministic character-level pass was used instead of
    /// the requested engine (e.g. an unrecognized engine name was given).
    pub fallback_used: bool,
}

/// Compounds force-added by [`Segmenter::wakame_optimized`] so the seaweed
/// vocabulary segments correctly even without a dictionary file on disk.
const WAKAME_CRITICAL_COMPOUNDS: &[&str] =
    &["วากาเมะ", "สาหร่ายวากาเมะ", "ซาชิมิ", "เทมปุระ", "ซูชิ"];

/// Order in which alternate engines are tried when re-segmenting a compound
/// candidate, with the active default engine filtered out.
const FALLBACK_ORDER: &[&str] = &["attacut", "deepcut", "newmm"];

/// Prefixes that typically open a Thai compound noun.
pub const THAI_COMPOUND_PREFIXES: &[&str] = &["การ", "ความ", "นัก", "ผู้"];

/// Suffixes that typically close a Thai compound noun.
pub const THAI_COMPOUND_SUFFIXES: &[&str] = &["ศาสตร์", "วิทยา", "กรรม", "ภาพ"];

/// A pluggable word-boundary engine operating over a single contiguous Thai
/// run (non-Thai content is handled by the caller ahead of dispatch).
pub trait SegmenterEngine: Send + Sync {
    fn label(&self) -> &'static str;
    fn segment_thai_run(&self, text: &str, dictionary: &HashSet<String>) -> Vec<String>;
}

/// Longest-match-first segmentation against the known dictionary. When the
/// dictionary runs out of matches partway through a run, the remainder is
/// kept as a single residual token rather than shredded character by
/// character — this mirrors the "naive indexer" failure mode the rest of
/// the pipeline is built to correct for. Stands in for `newmm`.
pub struct DictionaryEngine;

impl SegmenterEngine for DictionaryEngine {
    fn label(&self) -> &'static str {
        "newmm"
    }

    fn segment_thai_run(&self, text: &str, dictionary: &HashSet<String>) -> Vec<String> {
        greedy_dictionary_tokens(text, dictionary, |remainder| vec![remainder.to_string()])
    }
}

/// Stands in for `attacut`. Falls back to fixed-width clusters instead of a
/// single residual blob, giving compound re-segmentation a genuinely
/// different split to try.
pub struct ClusterEngine;

impl SegmenterEngine for ClusterEngine {
    fn label(&self) -> &'static str {
        "attacut"
    }

    fn segment_thai_run(&self, text: &str, dictionary: &HashSet<String>) -> Vec<String> {
        greedy_dictionary_tokens(text, dictionary, |remainder| chunk_chars(remainder, 4))
    }
}

/// Stands in for `deepcut`. Falls back to an affix-pattern split (or a
/// midpoint split when no affix matches) instead of a single residual blob.
pub struct SequenceEngine;

impl SegmenterEngine for SequenceEngine {
    fn label(&self) -> &'static str {
        "deepcut"
    }

    fn segment_thai_run(&self, text: &str, dictionary: &HashSet<String>) -> Vec<String> {
        greedy_dictionary_tokens(text, dictionary, |remainder| split_on_affix_or_midpoint(remainder))
    }
}

/// Greedy longest-match tokenizer. When the dictionary is empty, or a
/// position has no match, `on_stuck` decides how to dispose of the
/// unmatched remainder and the scan ends (the remainder is consumed in
/// full by the closure).
fn greedy_dictionary_tokens(
    run: &str,
    dictionary: &HashSet<String>,
    on_stuck: impl Fn(&str) -> Vec<String>,
) -> Vec<String> {
    if run.is_empty() {
        return Vec::new();
    }
    if dictionary.is_empty() {
        return on_stuck(run);
    }

    let chars: Vec<char> = run.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let max_len = (chars.len() - i).min(12);
        let mut matched_len = None;
        for len in (1..=max_len).rev() {
            let candidate: String = chars[i..i + len].iter().collect();
            if dictionary.contains(&candidate) {
                matched_len = Some(len);
                break;
            }
        }
        match matched_len {
            Some(len) => {
                out.push(chars[i..i + len].iter().collect());
                i += len;
            }
            None => {
                let remainder: String = chars[i..].iter().collect();
                out.extend(on_stuck(&remainder));
                break;
            }
        }
    }
    out
}

fn chunk_chars(text: &str, chunk_len: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_len.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}

fn split_on_affix_or_midpoint(text: &str) -> Vec<String> {
    for prefix in THAI_COMPOUND_PREFIXES {
        if let Some(rest) = text.strip_prefix(prefix) {
            if !rest.is_empty() {
                return vec![(*prefix).to_string(), rest.to_string()];
            }
        }
    }
    for suffix in THAI_COMPOUND_SUFFIXES {
        if let Some(rest) = text.strip_suffix(suffix) {
            if !rest.is_empty() {
                return vec![rest.to_string(), (*suffix).to_string()];
            }
        }
    }
    if text.chars().count() > 6 {
        return midpoint_split(text);
    }
    vec![text.to_string()]
}

fn midpoint_split(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mid = chars.len() / 2;
    vec![chars[..mid].iter().collect(), chars[mid..].iter().collect()]
}

/// Character-class runs used to group non-Thai content (and to delimit Thai
/// spans) ahead of dictionary-based word splitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Thai,
    Letter,
    Digit,
    Punct,
    Space,
}

fn classify_char_kind(c: char) -> RunKind {
    if is_thai_char(c) {
        RunKind::Thai
    } else if c.is_whitespace() {
        RunKind::Space
    } else if c.is_ascii_digit() {
        RunKind::Digit
    } else if c.is_alphabetic() {
        RunKind::Letter
    } else {
        RunKind::Punct
    }
}

struct Run {
    text: String,
    kind: RunKind,
}

/// Splits `text` into maximal same-class runs. A digit run absorbs a `,` or
/// `.` separator provided a digit immediately follows, so numbers like
/// `45,900` or `3.14` stay whole.
fn split_runs(text: &str) -> Vec<Run> {
    let chars: Vec<char> = text.chars().collect();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let kind = classify_char_kind(chars[i]);
        let mut j = i + 1;
        loop {
            if j >= chars.len() {
                break;
            }
            let next_kind = classify_char_kind(chars[j]);
            if next_kind == kind {
                j += 1;
            } else if kind == RunKind::Digit
                && (chars[j] == ',' || chars[j] == '.')
                && j + 1 < chars.len()
                && classify_char_kind(chars[j + 1]) == RunKind::Digit
            {
                j += 1;
            } else {
                break;
            }
        }
        runs.push(Run {
            text: chars[i..j].iter().collect(),
            kind,
        });
        i = j;
    }
    runs
}

/// Maximal runs of Thai characters in `text`, in order.
pub fn extract_thai_runs(text: &str) -> Vec<String> {
    split_runs(text)
        .into_iter()
        .filter(|r| r.kind == RunKind::Thai)
        .map(|r| r.text)
        .collect()
}

/// Deterministic character-level segmentation used when an unrecognized
/// engine is requested: contiguous Thai runs become a single token each,
/// every other non-whitespace character becomes its own token, and
/// whitespace is dropped.
fn fallback_char_segment(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_thai_char(c) {
            current.push(c);
        } else {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

pub struct Segmenter {
    default_engine: String,
    engines: Vec<Box<dyn SegmenterEngine>>,
    dictionary: RwLock<HashSet<String>>,
    dictionary_path: Option<PathBuf>,
}

impl Segmenter {
    pub fn new(engine: &str, use_compounds: bool, custom_dict_path: Option<&Path>) -> Result<Self> {
        let dictionary = if use_compounds {
            load_compound_dictionary(custom_dict_path)?
        } else {
            HashSet::new()
        };
        Ok(Self {
            default_engine: engine.to_string(),
            engines: vec![
                Box::new(DictionaryEngine),
                Box::new(ClusterEngine),
                Box::new(SequenceEngine),
            ],
            dictionary: RwLock::new(dictionary),
            dictionary_path: custom_dict_path.map(Path::to_path_buf),
        })
    }

    /// Preset tuned for the seaweed/wakame vocabulary, used when no custom
    /// dictionary path is configured.
    pub fn wakame_optimized() -> Result<Self> {
        let segmenter = Self::new("newmm", true, None)?;
        {
            let mut dict = segmenter.dictionary.write().expect("dictionary lock poisoned");
            for word in WAKAME_CRITICAL_COMPOUNDS {
                dict.insert((*word).to_string());
            }
        }
        Ok(segmenter)
    }

    /// Reloads the dictionary from disk, replacing the in-memory snapshot
    /// atomically so concurrent readers never see a partially-loaded set.
    pub fn reload_dictionary(&self) -> Result<()> {
        let fresh = load_compound_dictionary(self.dictionary_path.as_deref())?;
        let mut dict = self.dictionary.write().expect("dictionary lock poisoned");
        *dict = fresh;
        Ok(())
    }

    pub fn dictionary_len(&self) -> usize {
        self.dictionary.read().expect("dictionary lock poisoned").len()
    }

    fn engine_by_label(&self, label: &str) -> Option<&dyn SegmenterEngine> {
        self.engines.iter().map(|e| e.as_ref()).find(|e| e.label() == label)
    }

    fn tokenize_with_engine(&self, engine: &dyn SegmenterEngine, text: &str, dict: &HashSet<String>) -> Vec<String> {
        let mut words = Vec::new();
        for run in split_runs(text) {
            if run.kind == RunKind::Thai {
                words.extend(engine.segment_thai_run(&run.text, dict));
            } else {
                words.push(run.text);
            }
        }
        words
    }

    /// Plain segmentation: split `text` into boundary-respecting tokens
    /// using this segmenter's configured default engine.
    pub fn segment(&self, text: &str) -> SegmentationResult {
        self.segment_with_engine(text, &self.default_engine)
    }

    /// Plain segmentation with a per-call engine override. An unrecognized
    /// `engine` label falls back to the deterministic character-level pass,
    /// same as an unrecognized default engine does.
    pub fn segment_with_engine(&self, text: &str, engine: &str) -> SegmentationResult {
        let start = Instant::now();

        if text.trim().is_empty() {
            return SegmentationResult {
                input: text.to_string(),
                tokens: Vec::new(),
                boundaries: vec![0],
                engine_label: engine.to_string(),
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                fallback_used: false,
            };
        }

        let (engine_label, words, fallback_used) = match self.engine_by_label(engine) {
            Some(selected) => {
                let dict = self.dictionary.read().expect("dictionary lock poisoned");
                let words = self.tokenize_with_engine(selected, text, &dict);
                (engine.to_string(), words, false)
            }
            None => {
                tracing::warn!(engine = %engine, "unknown segmentation engine requested, using character-level fallback");
                (FALLBACK_CHAR_LABEL.to_string(), fallback_char_segment(text), true)
            }
        };

        let tokens = tokens_from_words(text, &words);
        let boundaries = boundaries_from_tokens(&tokens, text.len());

        SegmentationResult {
            input: text.to_string(),
            tokens,
            boundaries,
            engine_label,
            elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
            fallback_used,
        }
    }

    /// Compound-aware segmentation. Runs the plain pass first, then, for
    /// every Thai token longer than six characters, tries each of the other
    /// engines in turn against just that token until one produces more than
    /// one sub-token, splicing the split in place of the original. The
    /// engine label is tagged `_compound` based on the primary engine used,
    /// regardless of which fallback engine supplied a given split.
    pub fn segment_compound(&self, text: &str) -> SegmentationResult {
        self.segment_compound_with_engine(text, &self.default_engine)
    }

    /// Compound-aware segmentation with a per-call primary-engine override;
    /// see [`Segmenter::segment_compound`] for the splicing behavior.
    pub fn segment_compound_with_engine(&self, text: &str, engine: &str) -> SegmentationResult {
        let primary = self.segment_with_engine(text, engine);
        if primary.tokens.is_empty() {
            let mut result = primary;
            result.engine_label = format!("{}_compound", result.engine_label);
            return result;
        }

        let dict = self.dictionary.read().expect("dictionary lock poisoned");
        let mut new_words: Vec<String> = Vec::new();
        for token in &primary.tokens {
            if token.content_type == ContentType::Thai && token.surface.chars().count() > 6 {
                let split = FALLBACK_ORDER
                    .iter()
                    .filter(|label| **label != engine)
                    .find_map(|label| {
                        self.engine_by_label(label).and_then(|engine| {
                            let attempt = engine.segment_thai_run(&token.surface, &dict);
                            if attempt.len() >= 2 {
                                Some(attempt)
                            } else {
                                None
                            }
                        })
                    });
                match split {
                    Some(sub_tokens) => new_words.extend(sub_tokens),
                    None => new_words.push(token.surface.clone()),
                }
            } else {
                new_words.push(token.surface.clone());
            }
        }
        drop(dict);

        let tokens = tokens_from_words(text, &new_words);
        let boundaries = boundaries_from_tokens(&tokens, text.len());

        SegmentationResult {
            input: text.to_string(),
            tokens,
            boundaries,
            engine_label: format!("{}_compound", primary.engine_label),
            elapsed_ms: primary.elapsed_ms,
            fallback_used: primary.fallback_used,
        }
    }
}

fn boundaries_from_tokens(tokens: &[Token], text_len: usize) -> Vec<usize> {
    tokens
        .iter()
        .map(|t| t.start_byte)
        .chain(std::iter::once(text_len))
        .collect()
}

/// Advances a cursor through `text` looking for each word in turn. A word
/// not found from the cursor onward is placed at the cursor position
/// anyway (flagged via a debug log, not an error) so boundary computation
/// never panics on a mismatched word list.
fn tokens_from_words(text: &str, words: &[String]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(words.len());
    let mut cursor = 0usize;
    for word in words {
        if word.is_empty() {
            continue;
        }
        let start = match text.get(cursor..).and_then(|rest| rest.find(word.as_str())) {
            Some(offset) => cursor + offset,
            None => {
                tracing::debug!(word = %word, "estimated token boundary, exact match not found from cursor");
                cursor
            }
        };
        let end = start + word.len();
        tokens.push(Token {
            surface: word.clone(),
            start_byte: start,
            end_byte: end,
            content_type: classify_content(word),
        });
        cursor = end;
    }
    tokens
}

fn load_compound_dictionary(path: Option<&Path>) -> Result<HashSet<String>> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from("data/dictionaries/thai_compounds.json"),
    };
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(source) => {
            return Err(SegmenterError::DictionaryIo {
                path: path.display().to_string(),
                source,
            })
        }
    };
    let value: serde_json::Value = serde_json::from_str(&contents).map_err(|source| {
        SegmenterError::DictionaryParse {
            path: path.display().to_string(),
            source,
        }
    })?;

    let mut words = HashSet::new();
    collect_dictionary_words(&value, &mut words);
    Ok(words)
}

fn collect_dictionary_words(value: &serde_json::Value, out: &mut HashSet<String>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    let trimmed = s.trim();
                    if !trimmed.is_empty() {
                        out.insert(trimmed.to_string());
                    }
                }
            }
        }
        serde_json::Value::Object(map) => {
            for v in map.values() {
                collect_dictionary_words(v, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_segmentation_covers_entire_input() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment("สวัสดีครับ");
        let reconstructed: String = result.tokens.iter().map(|t| t.surface.as_str()).collect();
        assert_eq!(reconstructed, "สวัสดีครับ");
    }

    #[test]
    fn boundaries_start_at_zero_and_end_at_text_len() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let text = "hello";
        let result = segmenter.segment(text);
        assert_eq!(*result.boundaries.last().unwrap(), text.len());
    }

    #[test]
    fn wakame_optimized_dictionary_contains_seaweed_terms() {
        let segmenter = Segmenter::wakame_optimized().unwrap();
        let result = segmenter.segment("สาหร่ายวากาเมะ");
        assert!(result.tokens.iter().any(|t| t.surface == "สาหร่ายวากาเมะ"));
    }

    #[test]
    fn compound_segmentation_tags_engine_label() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment_compound("ทดสอบ");
        assert!(result.engine_label.ends_with("_compound"));
    }

    #[test]
    fn compound_segmentation_splits_long_candidate() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment_compound("เทคโนโลยีสารสนเทศ");
        assert!(result.tokens.len() >= 2);
    }

    #[test]
    fn extract_thai_runs_splits_on_non_thai_characters() {
        let runs = extract_thai_runs("ราคา 100 บาท");
        assert_eq!(runs, vec!["ราคา".to_string(), "บาท".to_string()]);
    }

    #[test]
    fn unknown_engine_falls_back_without_panicking() {
        let segmenter = Segmenter::new("nonexistent", false, None).unwrap();
        let result = segmenter.segment("test");
        assert!(!result.tokens.is_empty());
        assert_eq!(result.engine_label, FALLBACK_CHAR_LABEL);
        assert!(result.fallback_used);
    }

    #[test]
    fn mixed_content_groups_latin_and_numeric_runs_whole() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment("ราคา Apple 45,900 บาท");
        let surfaces: Vec<&str> = result.tokens.iter().map(|t| t.surface.as_str()).collect();
        assert!(surfaces.contains(&"Apple"));
        assert!(surfaces.contains(&"45,900"));
    }

    #[test]
    fn segment_with_engine_overrides_default() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment_with_engine("test", "nonexistent");
        assert_eq!(result.engine_label, FALLBACK_CHAR_LABEL);
        assert!(result.fallback_used);
        let result = segmenter.segment("test");
        assert_eq!(result.engine_label, "newmm");
    }

    #[test]
    fn empty_input_segments_to_no_tokens() {
        let segmenter = Segmenter::new("newmm", false, None).unwrap();
        let result = segmenter.segment("   ");
        assert!(result.tokens.is_empty());
        assert_eq!(result.boundaries, vec![0]);
    }
}
