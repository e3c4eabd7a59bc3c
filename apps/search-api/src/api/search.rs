//! Query endpoints: raw vector, hybrid, and the text/image demo flow

use axum::extract::State;
use axum::Json;
use base64::prelude::*;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use domain_documents::{
    DocumentError, DocumentResult, EmbedContent, PairedResults, ScoredDocument,
};

use crate::state::AppState;

fn default_k() -> usize {
    10
}

fn default_alpha() -> f32 {
    0.5
}

/// Top-k nearest-neighbor query with an explicit embedding.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct VectorSearchRequest {
    pub collection: String,
    pub embedding: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
}

/// Top-k hybrid query: lexical relevance of `text` fused with vector
/// similarity of `embedding`, weighted by `alpha`.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct HybridSearchRequest {
    pub collection: String,
    #[validate(length(min = 1))]
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

/// The demo query: text or a base64 image, embedded once and fanned out to
/// the configured article and image collections.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QueryRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Base64-encoded image bytes; used when no text is given.
    #[serde(default)]
    pub image_b64: Option<String>,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
}

impl QueryRequest {
    fn content(&self) -> DocumentResult<EmbedContent> {
        if let Some(text) = &self.text {
            return Ok(EmbedContent::Text(text.clone()));
        }

        if let Some(image_b64) = &self.image_b64 {
            let bytes = BASE64_STANDARD.decode(image_b64).map_err(|e| {
                DocumentError::Schema(format!("invalid base64 image content: {}", e))
            })?;
            return Ok(EmbedContent::Image(bytes));
        }

        Err(DocumentError::Schema(
            "either 'text' or 'image_b64' is required".to_string(),
        ))
    }
}

/// Top-k documents by vector similarity
#[utoipa::path(
    post,
    path = "/search/vector",
    tag = "search",
    request_body = VectorSearchRequest,
    responses(
        (status = 200, description = "Scored documents, best first", body = Vec<ScoredDocument>),
        (status = 400, description = "Invalid k or embedding dimension"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn search_by_vector(
    State(state): State<AppState>,
    Json(request): Json<VectorSearchRequest>,
) -> DocumentResult<Json<Vec<ScoredDocument>>> {
    let results = state
        .service
        .top_k_by_vector(&request.collection, &request.embedding, request.k)
        .await?;
    Ok(Json(results))
}

/// Top-k documents by fused lexical and vector relevance
#[utoipa::path(
    post,
    path = "/search/hybrid",
    tag = "search",
    request_body = HybridSearchRequest,
    responses(
        (status = 200, description = "Scored documents, best first", body = Vec<ScoredDocument>),
        (status = 400, description = "Invalid k, alpha, or embedding dimension"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn search_by_hybrid(
    State(state): State<AppState>,
    Json(request): Json<HybridSearchRequest>,
) -> DocumentResult<Json<Vec<ScoredDocument>>> {
    request
        .validate()
        .map_err(|e| DocumentError::Schema(e.to_string()))?;

    let results = state
        .service
        .top_k_by_hybrid(
            &request.collection,
            &request.text,
            &request.embedding,
            request.k,
            request.alpha,
        )
        .await?;
    Ok(Json(results))
}

/// Query both demo collections by text or image
#[utoipa::path(
    post,
    path = "/query",
    tag = "search",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Results from the article and image collections", body = PairedResults),
        (status = 400, description = "Missing or invalid query content"),
        (status = 500, description = "Embedder or backend failure")
    )
)]
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> DocumentResult<Json<PairedResults>> {
    let content = request.content()?;

    let results = state
        .service
        .query_pair(
            &state.config.collections,
            content,
            request.k,
            request.alpha,
        )
        .await?;
    Ok(Json(results))
}
