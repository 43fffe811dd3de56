//! Search-engine settings model: separators, dictionary, synonyms, stop
//! words and the attribute/ranking configuration handed to the downstream
//! search engine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of ranking rules the downstream search engine accepts.
pub const RANKING_RULES: &[&str] = &["words", "typo", "proximity", "attribute", "sort", "exactness"];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("separator tokens must not be empty")]
    EmptySeparatorTokens,
    #[error("separator tokens must include the Thai word marker U+200B")]
    MissingWordMarkerSeparator,
    #[error("non-separator tokens must include a Thai combining mark or ๆ/ฯ")]
    MissingCombiningMarkNonSeparator,
    #[error("searchable attributes must not be empty")]
    EmptySearchableAttributes,
    #[error("unknown ranking rule: {0}")]
    UnknownRankingRule(String),
    #[error("duplicate ranking rule: {0}")]
    DuplicateRankingRule(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub separator_tokens: Vec<String>,
    pub non_separator_tokens: Vec<String>,
    pub dictionary: Vec<String>,
    pub synonyms: HashMap<String, Vec<String>>,
    pub stop_words: Vec<String>,
    pub searchable_attributes: Vec<String>,
    pub displayed_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
    pub ranking_rules: Vec<String>,
}

impl Settings {
    /// Full preset: all 16 Thai combining/tone marks as non-separators, the
    /// default stop word list, and the four content-agnostic attribute groups.
    pub fn default_thai() -> Self {
        Self {
            separator_tokens: vec![
                "\u{200B}".to_string(),
                "\u{200B}\u{200B}".to_string(),
                " ".to_string(),
                "\t".to_string(),
                "\n".to_string(),
            ],
            non_separator_tokens: vec![
                "ๆ", "ฯ", "ฯลฯ", "์", "ั", "ิ", "ี", "ึ", "ื", "ุ", "ู", "ำ", "่", "้", "๊", "๋",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            dictionary: Vec::new(),
            synonyms: HashMap::new(),
            stop_words: default_stop_words(),
            searchable_attributes: vec![
                "title".to_string(),
                "content".to_string(),
                "thai_content".to_string(),
                "tokenized_content".to_string(),
            ],
            displayed_attributes: vec![
                "id".to_string(),
                "title".to_string(),
                "content".to_string(),
                "thai_content".to_string(),
                "metadata".to_string(),
            ],
            filterable_attributes: vec![
                "metadata.category".to_string(),
                "metadata.language".to_string(),
                "metadata.created_at".to_string(),
                "metadata.updated_at".to_string(),
            ],
            sortable_attributes: vec![
                "metadata.created_at".to_string(),
                "metadata.updated_at".to_string(),
                "title".to_string(),
            ],
            ranking_rules: RANKING_RULES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Minimal preset for lightweight indexes that just need Thai boundary
    /// awareness, with no dictionary, synonyms or filtering.
    pub fn minimal_thai() -> Self {
        Self {
            separator_tokens: vec!["\u{200B}".to_string(), " ".to_string(), "\n".to_string()],
            non_separator_tokens: vec!["ๆ".to_string(), "ฯ".to_string()],
            dictionary: Vec::new(),
            synonyms: HashMap::new(),
            stop_words: Vec::new(),
            searchable_attributes: vec!["title".to_string(), "content".to_string()],
            displayed_attributes: vec!["id".to_string(), "title".to_string(), "content".to_string()],
            filterable_attributes: Vec::new(),
            sortable_attributes: vec!["title".to_string()],
            ranking_rules: RANKING_RULES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.separator_tokens.is_empty() {
            return Err(SettingsError::EmptySeparatorTokens);
        }
        if !self.separator_tokens.iter().any(|t| t == "\u{200B}") {
            return Err(SettingsError::MissingWordMarkerSeparator);
        }
        if !self.non_separator_tokens.iter().any(|t| is_thai_combining_mark_or_repetition(t)) {
            return Err(SettingsError::MissingCombiningMarkNonSeparator);
        }
        if self.searchable_attributes.is_empty() {
            return Err(SettingsError::EmptySearchableAttributes);
        }
        let mut seen_rules = std::collections::HashSet::new();
        for rule in &self.ranking_rules {
            if !RANKING_RULES.contains(&rule.as_str()) {
                return Err(SettingsError::UnknownRankingRule(rule.clone()));
            }
            if !seen_rules.insert(rule.as_str()) {
                return Err(SettingsError::DuplicateRankingRule(rule.clone()));
            }
        }
        Ok(())
    }

    /// Adds dictionary words, preserving first-occurrence order and
    /// deduplicating against existing entries.
    pub fn add_custom_dictionary_words(&mut self, words: &[String]) {
        for word in words {
            if !self.dictionary.contains(word) {
                self.dictionary.push(word.clone());
            }
        }
    }

    /// Merges `synonyms` into the existing set for `canonical`.
    pub fn add_synonyms(&mut self, canonical: &str, synonyms: Vec<String>) {
        let entry = self.synonyms.entry(canonical.to_string()).or_default();
        for syn in synonyms {
            if !entry.contains(&syn) {
                entry.push(syn);
            }
        }
    }

    pub fn update_separator_tokens(&mut self, tokens: Vec<String>) -> Result<()> {
        if tokens.is_empty() {
            return Err(SettingsError::EmptySeparatorTokens);
        }
        self.separator_tokens = tokens;
        Ok(())
    }

    pub fn update_searchable_attributes(&mut self, attributes: Vec<String>) -> Result<()> {
        if attributes.is_empty() {
            return Err(SettingsError::EmptySearchableAttributes);
        }
        self.searchable_attributes = attributes;
        Ok(())
    }

    /// Wire-format JSON for the settings endpoint of the downstream search
    /// engine (camelCase keys).
    pub fn to_wire_json(&self) -> serde_json::Value {
        serde_json::json!({
            "separatorTokens": self.separator_tokens,
            "nonSeparatorTokens": self.non_separator_tokens,
            "dictionary": self.dictionary,
            "synonyms": self.synonyms,
            "stopWords": self.stop_words,
            "searchableAttributes": self.searchable_attributes,
            "displayedAttributes": self.displayed_attributes,
            "filterableAttributes": self.filterable_attributes,
            "sortableAttributes": self.sortable_attributes,
            "rankingRules": self.ranking_rules,
        })
    }

    /// Round-trippable snake_case export, distinct from the wire format.
    pub fn export_config(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("Settings serialization is infallible")
    }

    pub fn import_config(value: serde_json::Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// De-duplicated default Thai stop words. The reference list this is
/// grounded on repeats "ที่" once; deduplicated here since `Settings`
/// deliberately treats the dictionary and stop-word lists the same way.
fn default_stop_words() -> Vec<String> {
    let raw = [
        "และ", "หรือ", "แต่", "เพราะ", "ถ้า", "เมื่อ", "ที่", "ซึ่ง", "ใน", "บน", "จาก", "ไป",
        "มา", "ได้", "เป็น", "คือ", "มี", "ไม่", "ไม่ใช่", "ก็", "จึง", "เลย", "แล้ว", "อยู่",
    ];
    let mut seen = std::collections::HashSet::new();
    raw.into_iter()
        .filter(|w| seen.insert(*w))
        .map(String::from)
        .collect()
}

/// True for a single-character token that is a Thai combining vowel/tone
/// mark, or the repetition/abbreviation signs ๆ (U+0E46) and ฯ (U+0E2F).
fn is_thai_combining_mark_or_repetition(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(c) = chars.next() else { return false };
    if chars.next().is_some() {
        return false;
    }
    matches!(c,
        '\u{0E31}' | '\u{0E34}'..='\u{0E3A}' | '\u{0E47}'..='\u{0E4E}' | '\u{0E46}' | '\u{0E2F}'
    )
}

/// Sanity check used before handing settings to the search engine: confirms
/// the Thai word/compound markers are wired as separators, at least one
/// Thai combining mark is a non-separator, and something is searchable.
pub fn validate_thai_text_settings(settings: &Settings) -> bool {
    let has_word_marker = settings.separator_tokens.iter().any(|t| t == "\u{200B}");
    let has_combining_mark = ["ๆ", "ฯ", "์"]
        .iter()
        .any(|mark| settings.non_separator_tokens.iter().any(|t| t == mark));
    has_word_marker && has_combining_mark && !settings.searchable_attributes.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_pass_validation() {
        let settings = Settings::default_thai();
        assert!(settings.validate().is_ok());
        assert!(validate_thai_text_settings(&settings));
    }

    #[test]
    fn minimal_settings_pass_validation() {
        let settings = Settings::minimal_thai();
        assert!(settings.validate().is_ok());
        assert!(validate_thai_text_settings(&settings));
    }

    #[test]
    fn stop_words_are_deduplicated() {
        let settings = Settings::default_thai();
        let mut seen = std::collections::HashSet::new();
        assert!(settings.stop_words.iter().all(|w| seen.insert(w)));
    }

    #[test]
    fn empty_separator_tokens_rejected() {
        let mut settings = Settings::default_thai();
        assert!(settings.update_separator_tokens(Vec::new()).is_err());
        assert!(settings.update_separator_tokens(vec!["\u{200B}".to_string()]).is_ok());
    }

    #[test]
    fn unknown_ranking_rule_fails_validation() {
        let mut settings = Settings::default_thai();
        settings.ranking_rules.push("bogus".to_string());
        assert!(settings.validate().is_err());
    }

    #[test]
    fn duplicate_ranking_rule_fails_validation() {
        let mut settings = Settings::default_thai();
        settings.ranking_rules.push("words".to_string());
        assert!(matches!(settings.validate(), Err(SettingsError::DuplicateRankingRule(_))));
    }

    #[test]
    fn missing_word_marker_separator_fails_validation() {
        let mut settings = Settings::default_thai();
        settings.separator_tokens = vec![" ".to_string(), "\n".to_string()];
        assert!(matches!(settings.validate(), Err(SettingsError::MissingWordMarkerSeparator)));
    }

    #[test]
    fn missing_combining_mark_non_separator_fails_validation() {
        let mut settings = Settings::default_thai();
        settings.non_separator_tokens = vec!["ฯลฯ".to_string()];
        assert!(matches!(settings.validate(), Err(SettingsError::MissingCombiningMarkNonSeparator)));
    }

    #[test]
    fn dictionary_words_deduplicate_preserving_order() {
        let mut settings = Settings::minimal_thai();
        settings.add_custom_dictionary_words(&["หนึ่ง".to_string(), "สอง".to_string(), "หนึ่ง".to_string()]);
        assert_eq!(settings.dictionary, vec!["หนึ่ง".to_string(), "สอง".to_string()]);
    }

    #[test]
    fn synonyms_merge_as_set_union() {
        let mut settings = Settings::minimal_thai();
        settings.add_synonyms("รถ", vec!["รถยนต์".to_string()]);
        settings.add_synonyms("รถ", vec!["รถยนต์".to_string(), "automobile".to_string()]);
        assert_eq!(settings.synonyms["รถ"].len(), 2);
    }

    #[test]
    fn wire_json_uses_camel_case_keys() {
        let settings = Settings::minimal_thai();
        let wire = settings.to_wire_json();
        assert!(wire.get("separatorTokens").is_some());
        assert!(wire.get("searchableAttributes").is_some());
    }

    #[test]
    fn export_import_round_trips() {
        let settings = Settings::default_thai();
        let exported = settings.export_config();
        let imported = Settings::import_config(exported).unwrap();
        assert_eq!(imported, settings);
    }
}
