//! Per-document processing: Thai-content detection and tokenization.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::classify::{has_mixed_content, is_thai_char};
use crate::core::segmenter::{extract_thai_runs, Segmenter};
use crate::core::token_processor::process_tokenization_result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInput {
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    Processing,
    Completed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub language: String,
    #[serde(rename = "tokenization_version")]
    pub tokenizer_version: String,
    pub processed_at: String,
    #[serde(rename = "processing_time_ms")]
    pub elapsed_ms: f64,
    pub token_count: usize,
    #[serde(rename = "thai_content_detected")]
    pub thai_detected: bool,
    pub mixed_content: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub id: String,
    pub original_fields: HashMap<String, serde_json::Value>,
    pub tokenized_fields: HashMap<String, serde_json::Value>,
    pub metadata: DocumentMetadata,
    pub status: DocumentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fraction of alphabetic characters that are Thai, counting both Thai and
/// non-Thai letters in the denominator (digits and punctuation excluded).
pub fn thai_alpha_ratio(text: &str) -> f64 {
    let thai = text.chars().filter(|c| is_thai_char(*c)).count();
    let alpha = text.chars().filter(|c| c.is_alphabetic()).count();
    if alpha == 0 {
        return 0.0;
    }
    thai as f64 / alpha as f64
}

pub fn contains_thai(text: &str) -> bool {
    text.chars().any(is_thai_char)
}

fn tokenizer_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn original_fields(input: &DocumentInput) -> HashMap<String, serde_json::Value> {
    let mut fields = HashMap::new();
    fields.insert("title".to_string(), serde_json::Value::String(input.title.clone()));
    fields.insert("content".to_string(), serde_json::Value::String(input.content.clone()));
    fields
}

fn base_metadata(thai_detected: bool, mixed_content: bool) -> DocumentMetadata {
    DocumentMetadata {
        language: if thai_detected { "th".to_string() } else { "en".to_string() },
        tokenizer_version: tokenizer_version(),
        processed_at: Utc::now().to_rfc3339(),
        elapsed_ms: 0.0,
        token_count: 0,
        thai_detected,
        mixed_content,
        error: None,
    }
}

fn failed_document(id: String, input: &DocumentInput, error: String) -> ProcessedDocument {
    let mut metadata = base_metadata(false, false);
    metadata.language = "unknown".to_string();
    metadata.error = Some(error.clone());
    ProcessedDocument {
        id,
        original_fields: original_fields(input),
        tokenized_fields: HashMap::new(),
        metadata,
        status: DocumentStatus::Failed,
        error: Some(error),
    }
}

/// Runs a single document through Thai-content detection and tokenization.
/// Never panics: a missing id or any internal failure surfaces as a
/// [`DocumentStatus::Failed`] record rather than propagating an error, so a
/// batch of documents can always account for every input.
pub fn process_document(input: &DocumentInput, segmenter: &Segmenter) -> ProcessedDocument {
    let id = match &input.id {
        Some(id) if !id.trim().is_empty() => id.clone(),
        _ => return failed_document("unknown".to_string(), input, "document is missing an id".to_string()),
    };

    let combined = format!("{} {}", input.title, input.content).trim().to_string();
    let thai_detected = contains_thai(&combined);
    let mixed_content = has_mixed_content(&combined);

    if !thai_detected {
        return ProcessedDocument {
            id,
            original_fields: original_fields(input),
            tokenized_fields: HashMap::new(),
            metadata: base_metadata(false, mixed_content),
            status: DocumentStatus::Skipped,
            error: None,
        };
    }

    let runs = extract_thai_runs(&combined);
    let mut tokenized_segments = Vec::with_capacity(runs.len());
    let mut total_tokens = 0usize;
    let mut compound_count = 0usize;
    let mut elapsed_ms = 0.0;
    for run in &runs {
        let segmentation = segmenter.segment_compound(run);
        elapsed_ms += segmentation.elapsed_ms;
        let processed = process_tokenization_result(&segmentation);
        tokenized_segments.push(processed.tokenized_text);
        total_tokens += processed.token_count;
        compound_count += processed.compound_count;
    }

    let mut tokenized_fields = HashMap::new();
    tokenized_fields.insert("thai_content".to_string(), serde_json::Value::String(runs.join(" ")));
    tokenized_fields.insert(
        "tokenized_content".to_string(),
        serde_json::Value::String(tokenized_segments.join(" ")),
    );
    tokenized_fields.insert("total_tokens".to_string(), serde_json::json!(total_tokens));
    tokenized_fields.insert("compound_words_detected".to_string(), serde_json::json!(compound_count));

    let mut metadata = base_metadata(true, mixed_content);
    metadata.elapsed_ms = elapsed_ms;
    metadata.token_count = total_tokens;

    ProcessedDocument {
        id,
        original_fields: original_fields(input),
        tokenized_fields,
        metadata,
        status: DocumentStatus::Completed,
        error: None,
    }
}
