//! Inbound HTTP API: tokenization, query processing, document ingestion and
//! result enhancement endpoints consumed by the search engine integration.

use std::sync::Arc;

use axum::extract::{Json, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::core::batch::{process_and_index, process_batch, BatchConfig, BatchResult, IndexOutcome};
use crate::core::document::DocumentInput;
use crate::core::enhance::{enhance_search_results, EnhancedHit, SearchHit};
use crate::core::query::{process_partial_compound_query, process_query, QueryProcessingResult};
use crate::core::search_client::SearchClient;
use crate::core::segmenter::Segmenter;
use crate::core::token_processor::process_tokenization_result;
use crate::error::{AppError, Result};

pub struct AppState {
    pub segmenter: Arc<Segmenter>,
    pub search_client: SearchClient,
    pub batch_config: BatchConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/tokenize", post(tokenize))
        .route("/api/v1/tokenize/query", post(tokenize_query))
        .route("/api/v1/documents", post(documents))
        .route("/api/v1/search/enhance", post(enhance))
        .route("/health", get(health))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(state)
}

/// Liveness probe: reports this service's own status plus the reachability
/// of the downstream search engine, per the `{status, dependencies}` shape.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let search_engine_status = match state.search_client.health_check().await {
        Ok(()) => "healthy",
        Err(err) => {
            tracing::warn!(error = %err, "search engine health check failed");
            "unhealthy"
        }
    };

    let status = if search_engine_status == "healthy" { "healthy" } else { "unhealthy" };

    Json(serde_json::json!({
        "status": status,
        "dependencies": {
            "search_engine": search_engine_status,
        },
    }))
}

#[derive(Debug, Deserialize)]
struct TokenizeRequest {
    text: String,
    #[serde(default)]
    engine: Option<String>,
    #[serde(default)]
    compound_processing: bool,
}

#[derive(Debug, Serialize)]
struct TokenizeResponse {
    tokens: Vec<String>,
    processing_time_ms: f64,
}

async fn tokenize(State(state): State<Arc<AppState>>, Json(req): Json<TokenizeRequest>) -> Result<Json<TokenizeResponse>> {
    if req.text.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }
    let segmentation = match (&req.engine, req.compound_processing) {
        (Some(engine), true) => state.segmenter.segment_compound_with_engine(&req.text, engine),
        (Some(engine), false) => state.segmenter.segment_with_engine(&req.text, engine),
        (None, true) => state.segmenter.segment_compound(&req.text),
        (None, false) => state.segmenter.segment(&req.text),
    };
    let processed = process_tokenization_result(&segmentation);
    Ok(Json(TokenizeResponse {
        tokens: processed.tokens.into_iter().map(|t| t.processed).collect(),
        processing_time_ms: segmentation.elapsed_ms,
    }))
}

#[derive(Debug, Deserialize)]
struct TokenizeQueryRequest {
    query: String,
    #[serde(default)]
    partial_compound: bool,
}

async fn tokenize_query(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenizeQueryRequest>,
) -> Result<Json<QueryProcessingResult>> {
    if req.query.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }
    let result = if req.partial_compound {
        process_partial_compound_query(&req.query, &state.segmenter)
    } else {
        process_query(&req.query, &state.segmenter)
    };
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct DocumentsRequest {
    documents: Vec<DocumentInput>,
    #[serde(default)]
    index_name: Option<String>,
}

#[derive(Debug, Serialize)]
struct DocumentsResponse {
    processing: BatchResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    indexing: Option<IndexOutcome>,
}

async fn documents(State(state): State<Arc<AppState>>, Json(req): Json<DocumentsRequest>) -> Result<Json<DocumentsResponse>> {
    let segmenter = state.segmenter.clone();
    if let Some(index_name) = req.index_name {
        let outcome = process_and_index(req.documents, segmenter, &state.search_client, &index_name, &state.batch_config).await;
        Ok(Json(DocumentsResponse {
            processing: outcome.processing,
            indexing: Some(outcome.indexing),
        }))
    } else {
        let processing = process_batch(req.documents, segmenter, &state.batch_config).await;
        Ok(Json(DocumentsResponse { processing, indexing: None }))
    }
}

#[derive(Debug, Deserialize)]
struct EnhanceHit {
    id: String,
    #[serde(default = "default_score")]
    score: f64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    formatted_title: Option<String>,
    #[serde(default)]
    formatted_content: Option<String>,
}

fn default_score() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct EnhanceRequest {
    query: String,
    results: Vec<EnhanceHit>,
    #[serde(default = "default_true")]
    enable_compound_highlighting: bool,
    #[serde(default = "default_true")]
    enable_relevance_boosting: bool,
}

async fn enhance(State(state): State<Arc<AppState>>, Json(req): Json<EnhanceRequest>) -> Result<Json<Vec<EnhancedHit>>> {
    if req.query.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }

    let hits: Vec<SearchHit> = req
        .results
        .into_iter()
        .map(|h| SearchHit {
            id: h.id,
            score: h.score,
            title: h.title,
            content: h.content,
            formatted_title: h.formatted_title,
            formatted_content: h.formatted_content,
        })
        .collect();

    let enhanced = enhance_search_results(
        &hits,
        &req.query,
        &state.segmenter,
        req.enable_compound_highlighting,
        req.enable_relevance_boosting,
    );
    Ok(Json(enhanced))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState {
            segmenter: Arc::new(Segmenter::new("newmm", false, None).unwrap()),
            search_client: SearchClient::new(crate::core::search_client::SearchClientConfig::default()).unwrap(),
            batch_config: BatchConfig::default(),
        })
    }

    #[tokio::test]
    async fn health_endpoint_reports_status_and_dependencies() {
        let app = router(test_state());
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body.get("status").is_some());
        assert!(body["dependencies"].get("search_engine").is_some());
    }

    #[tokio::test]
    async fn tokenize_rejects_empty_text() {
        let app = router(test_state());
        let body = serde_json::json!({ "text": "" }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tokenize")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn tokenize_segments_thai_text() {
        let app = router(test_state());
        let body = serde_json::json!({ "text": "สวัสดีครับ" }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tokenize")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tokenize_response_matches_documented_shape() {
        let app = router(test_state());
        let body = serde_json::json!({ "text": "สวัสดีครับ", "engine": "newmm", "compound_processing": true }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/tokenize")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let tokens = parsed["tokens"].as_array().expect("tokens array");
        assert!(tokens.iter().all(|t| t.is_string()));
        assert!(parsed["processing_time_ms"].is_number());
    }

    #[tokio::test]
    async fn enhance_rejects_empty_query() {
        let app = router(test_state());
        let body = serde_json::json!({ "query": "", "results": [] }).to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/search/enhance")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn enhance_scores_and_highlights_hits() {
        let app = router(test_state());
        let body = serde_json::json!({
            "query": "นักศึกษามหาวิทยาลัย",
            "results": [{
                "id": "1",
                "score": 1.0,
                "title": "นักศึกษามหาวิทยาลัย",
                "content": ""
            }]
        })
        .to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/search/enhance")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let hits: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0]["enhanced_score"].as_f64().unwrap() >= 1.0);
    }
}
