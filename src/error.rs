//! Top-level error type: aggregates every component error and converts it
//! into an HTTP response carrying `{"error": ..., "details": ...}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::core::search_client::SearchClientError;
use crate::core::segmenter::SegmenterError;
use crate::core::settings::SettingsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("segmenter failure: {0}")]
    SegmenterFailure(#[from] SegmenterError),
    #[error("settings validation failed: {0}")]
    SettingsValidation(#[from] SettingsError),
    #[error("search engine temporarily unavailable: {0}")]
    SearchEngineTransient(String),
    #[error("search engine request failed: {0}")]
    SearchEnginePermanent(String),
    #[error("request cancelled")]
    Cancelled,
}

impl From<SearchClientError> for AppError {
    fn from(err: SearchClientError) -> Self {
        if err.is_transient() {
            AppError::SearchEngineTransient(err.to_string())
        } else {
            AppError::SearchEnginePermanent(err.to_string())
        }
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::SegmenterFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::SettingsValidation(_) => StatusCode::BAD_REQUEST,
            AppError::SearchEngineTransient(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SearchEnginePermanent(_) => StatusCode::BAD_GATEWAY,
            AppError::Cancelled => StatusCode::from_u16(499).expect("499 is a valid status code"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = %status, error = %self, "request failed");
        let body = Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("error"),
            "details": self.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
