//! Bounded-concurrency batch document processing and indexing.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::core::document::{process_document, DocumentInput, DocumentStatus, ProcessedDocument};
use crate::core::search_client::{SearchClient, SearchClientError};
use crate::core::segmenter::Segmenter;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 1000,
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub max_concurrent: usize,
    pub batch_size: usize,
    pub retry: RetryConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 10,
            batch_size: 50,
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub elapsed_ms: f64,
    pub documents: Vec<ProcessedDocument>,
    pub errors: Vec<String>,
}

/// Runs every document through [`process_document`] under a semaphore that
/// bounds concurrency to `config.max_concurrent`. Input order is preserved
/// in the returned `documents` regardless of completion order.
pub async fn process_batch(
    documents: Vec<DocumentInput>,
    segmenter: Arc<Segmenter>,
    config: &BatchConfig,
) -> BatchResult {
    let start = Instant::now();
    if documents.is_empty() {
        return BatchResult {
            total: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            elapsed_ms: 0.0,
            documents: Vec::new(),
            errors: Vec::new(),
        };
    }

    let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
    let total = documents.len();
    let mut handles = Vec::with_capacity(total);

    for (idx, doc) in documents.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let segmenter = segmenter.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("batch semaphore closed");
            (idx, process_document(&doc, &segmenter))
        }));
    }

    let mut slots: Vec<Option<ProcessedDocument>> = (0..total).map(|_| None).collect();
    let mut errors = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((idx, doc)) => slots[idx] = Some(doc),
            Err(join_err) => errors.push(format!("document task panicked: {join_err}")),
        }
    }

    let documents: Vec<ProcessedDocument> = slots.into_iter().flatten().collect();
    let completed = documents.iter().filter(|d| d.status == DocumentStatus::Completed).count();
    let failed = documents.iter().filter(|d| d.status == DocumentStatus::Failed).count();
    let skipped = documents.iter().filter(|d| d.status == DocumentStatus::Skipped).count();
    for doc in &documents {
        if let Some(err) = &doc.error {
            errors.push(format!("{}: {err}", doc.id));
        }
    }

    BatchResult {
        total,
        completed,
        failed,
        skipped,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
        documents,
        errors,
    }
}

/// Retries `operation` with bounded exponential backoff. Only transient
/// [`SearchClientError`]s are retried; permanent errors return immediately.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, mut operation: F) -> Result<T, SearchClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchClientError>>,
{
    let mut attempt = 0u32;
    let mut delay = Duration::from_millis(config.initial_delay_ms);
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < config.max_attempts && err.is_transient() => {
                tracing::warn!(attempt, error = %err, "retrying transient search-engine failure");
                tokio::time::sleep(delay).await;
                delay = Duration::from_millis((delay.as_millis() as f64 * config.multiplier) as u64);
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexOutcome {
    pub indexed_count: usize,
    pub task_uids: Vec<u64>,
    pub index_name: String,
    pub errors: Vec<String>,
}

fn document_wire_json(doc: &ProcessedDocument) -> serde_json::Value {
    let mut value = serde_json::json!({
        "id": doc.id,
        "title": doc.original_fields.get("title").cloned().unwrap_or(serde_json::Value::Null),
        "content": doc.original_fields.get("content").cloned().unwrap_or(serde_json::Value::Null),
        "metadata": doc.metadata,
    });
    if let serde_json::Value::Object(map) = &mut value {
        for (key, field) in &doc.tokenized_fields {
            map.insert(key.clone(), field.clone());
        }
    }
    value
}

/// Sends every `Completed` or `Skipped` document to the search engine in
/// `batch_size` chunks, retrying transient chunk failures. A `Skipped`
/// document (no Thai content detected) carries no tokenized fields but is
/// still forwarded unchanged, per §4.6/§3.
pub async fn index_processed_documents(
    client: &SearchClient,
    index_name: &str,
    documents: &[ProcessedDocument],
    config: &BatchConfig,
) -> IndexOutcome {
    let indexable: Vec<&ProcessedDocument> = documents
        .iter()
        .filter(|d| matches!(d.status, DocumentStatus::Completed | DocumentStatus::Skipped))
        .collect();

    let mut indexed_count = 0usize;
    let mut task_uids = Vec::new();
    let mut errors = Vec::new();

    for chunk in indexable.chunks(config.batch_size.max(1)) {
        let wire_docs: Vec<serde_json::Value> = chunk.iter().map(|d| document_wire_json(d)).collect();
        let result = with_retry(&config.retry, || async { client.add_documents(index_name, &wire_docs).await }).await;
        match result {
            Ok(ack) => {
                indexed_count += chunk.len();
                if let Some(uid) = ack.task_uid {
                    task_uids.push(uid);
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
    }

    IndexOutcome {
        indexed_count,
        task_uids,
        index_name: index_name.to_string(),
        errors,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessAndIndexOutcome {
    pub processing: BatchResult,
    pub indexing: IndexOutcome,
}

/// Chains [`process_batch`] into [`index_processed_documents`] in one call.
pub async fn process_and_index(
    documents: Vec<DocumentInput>,
    segmenter: Arc<Segmenter>,
    client: &SearchClient,
    index_name: &str,
    config: &BatchConfig,
) -> ProcessAndIndexOutcome {
    let processing = process_batch(documents, segmenter, config).await;
    let indexing = index_processed_documents(client, index_name, &processing.documents, config).await;
    ProcessAndIndexOutcome { processing, indexing }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn segmenter() -> Arc<Segmenter> {
        Arc::new(Segmenter::new("newmm", false, None).unwrap())
    }

    #[tokio::test]
    async fn empty_batch_returns_zeroed_result() {
        let result = process_batch(Vec::new(), segmenter(), &BatchConfig::default()).await;
        assert_eq!(result.total, 0);
        assert!(result.documents.is_empty());
    }

    #[tokio::test]
    async fn batch_accounting_sums_to_total() {
        let docs = vec![
            DocumentInput { id: Some("1".to_string()), title: "ราคา".to_string(), content: String::new(), metadata: HashMap::new() },
            DocumentInput { id: None, title: "no id".to_string(), content: String::new(), metadata: HashMap::new() },
            DocumentInput { id: Some("3".to_string()), title: "hello".to_string(), content: "world".to_string(), metadata: HashMap::new() },
        ];
        let result = process_batch(docs, segmenter(), &BatchConfig::default()).await;
        assert_eq!(result.total, 3);
        assert_eq!(result.completed + result.failed + result.skipped, result.total);
    }

    #[tokio::test]
    async fn batch_preserves_input_order() {
        let docs = (0..5)
            .map(|i| DocumentInput {
                id: Some(i.to_string()),
                title: format!("title-{i}"),
                content: String::new(),
                metadata: HashMap::new(),
            })
            .collect();
        let result = process_batch(docs, segmenter(), &BatchConfig::default()).await;
        let ids: Vec<&str> = result.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["0", "1", "2", "3", "4"]);
    }
}
