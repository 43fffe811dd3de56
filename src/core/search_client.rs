//! Outbound HTTP client for the downstream JSON search engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchClientError {
    #[error("search engine request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search engine returned {status}: {body}")]
    Status { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, SearchClientError>;

impl SearchClientError {
    /// Transient failures (network errors, 5xx, timeouts, and 429 rate
    /// limiting) are worth retrying; other 4xx responses are permanent
    /// misconfiguration/input errors.
    pub fn is_transient(&self) -> bool {
        match self {
            SearchClientError::Request(err) => err.is_timeout() || err.is_connect(),
            SearchClientError::Status { status, .. } => *status >= 500 || *status == 429,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SearchClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:7700".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskAck {
    pub task_uid: Option<u64>,
    pub index_uid: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawTaskAck {
    #[serde(rename = "taskUid")]
    task_uid: Option<u64>,
    #[serde(rename = "indexUid")]
    index_uid: Option<String>,
}

/// Thin wrapper around the five HTTP calls the sidecar makes against the
/// downstream search engine: add documents, delete a document, update
/// settings, run a search, and poll task status.
pub struct SearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SearchClient {
    pub fn new(config: SearchClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{path}", self.base_url);
        let mut builder = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        builder
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(SearchClientError::Status { status, body })
        }
    }

    pub async fn add_documents(&self, index: &str, documents: &[serde_json::Value]) -> Result<TaskAck> {
        let response = self
            .request(reqwest::Method::POST, &format!("/indexes/{index}/documents"))
            .query(&[("primaryKey", "id")])
            .json(documents)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let raw: RawTaskAck = response.json().await?;
        Ok(TaskAck {
            task_uid: raw.task_uid,
            index_uid: raw.index_uid,
        })
    }

    pub async fn delete_document(&self, index: &str, document_id: &str) -> Result<TaskAck> {
        let response = self
            .request(reqwest::Method::DELETE, &format!("/indexes/{index}/documents/{document_id}"))
            .send()
            .await?;
        let response = Self::check(response).await?;
        let raw: RawTaskAck = response.json().await?;
        Ok(TaskAck {
            task_uid: raw.task_uid,
            index_uid: raw.index_uid,
        })
    }

    pub async fn update_settings(&self, index: &str, settings: &serde_json::Value) -> Result<TaskAck> {
        let response = self
            .request(reqwest::Method::PATCH, &format!("/indexes/{index}/settings"))
            .json(settings)
            .send()
            .await?;
        let response = Self::check(response).await?;
        let raw: RawTaskAck = response.json().await?;
        Ok(TaskAck {
            task_uid: raw.task_uid,
            index_uid: raw.index_uid,
        })
    }

    pub async fn search(&self, index: &str, query: &serde_json::Value) -> Result<serde_json::Value> {
        let response = self
            .request(reqwest::Method::POST, &format!("/indexes/{index}/search"))
            .json(query)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    pub async fn task_status(&self, task_uid: u64) -> Result<serde_json::Value> {
        let response = self
            .request(reqwest::Method::GET, &format!("/tasks/{task_uid}"))
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Liveness probe against the downstream search engine, used to fill
    /// the `dependencies` map of this service's own `/health` response.
    pub async fn health_check(&self) -> Result<()> {
        let response = self.request(reqwest::Method::GET, "/health").send().await?;
        Self::check(response).await?;
        Ok(())
    }
}
