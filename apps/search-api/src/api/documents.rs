//! Document CRUD endpoints

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use domain_documents::{
    BatchItemOutcome, Document, DocumentPatch, DocumentResult, PropertyValue, UpdateOutcome,
};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DocumentCreatedResponse {
    pub id_no: String,
    pub status: String,
}

/// Partial update: properties to merge and/or a replacement embedding. The
/// target id comes from the path.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UpdateDocumentResponse {
    pub outcome: UpdateOutcome,
}

/// Add a document to a collection
#[utoipa::path(
    post,
    path = "/collections/{name}/documents",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = Document,
    responses(
        (status = 201, description = "Document created", body = DocumentCreatedResponse),
        (status = 400, description = "Invalid document or embedding dimension"),
        (status = 409, description = "Document id already exists"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn create_document(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(document): Json<Document>,
) -> DocumentResult<impl IntoResponse> {
    state.service.create_document(&name, &document).await?;

    Ok((
        StatusCode::CREATED,
        Json(DocumentCreatedResponse {
            id_no: document.id_no,
            status: "created".to_string(),
        }),
    ))
}

/// Add a batch of documents; outcomes are reported per document
#[utoipa::path(
    post,
    path = "/collections/{name}/documents/batch",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    request_body = Vec<Document>,
    responses(
        (status = 200, description = "Per-document outcomes", body = Vec<BatchItemOutcome>),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn create_documents(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(documents): Json<Vec<Document>>,
) -> DocumentResult<Json<Vec<BatchItemOutcome>>> {
    let outcomes = state.service.create_documents(&name, &documents).await?;
    Ok(Json(outcomes))
}

/// Fetch a document, embedding included
#[utoipa::path(
    get,
    path = "/collections/{name}/documents/{id_no}",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id_no" = String, Path, description = "Document business id")
    ),
    responses(
        (status = 200, description = "The document", body = Document),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn get_document(
    State(state): State<AppState>,
    Path((name, id_no)): Path<(String, String)>,
) -> DocumentResult<Json<Document>> {
    let document = state.service.read_document(&name, &id_no).await?;
    Ok(Json(document))
}

/// Merge properties into a document and/or replace its embedding
#[utoipa::path(
    patch,
    path = "/collections/{name}/documents/{id_no}",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id_no" = String, Path, description = "Document business id")
    ),
    request_body = UpdateDocumentRequest,
    responses(
        (status = 200, description = "Update outcome", body = UpdateDocumentResponse),
        (status = 400, description = "Embedding dimension mismatch"),
        (status = 404, description = "Document not found"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn update_document(
    State(state): State<AppState>,
    Path((name, id_no)): Path<(String, String)>,
    Json(request): Json<UpdateDocumentRequest>,
) -> DocumentResult<Json<UpdateDocumentResponse>> {
    let patch = DocumentPatch {
        id_no,
        properties: request.properties,
        embedding: request.embedding,
    };

    let outcome = state.service.update_document(&name, &patch).await?;
    Ok(Json(UpdateDocumentResponse { outcome }))
}

/// Delete a document; absent ids succeed as a no-op
#[utoipa::path(
    delete,
    path = "/collections/{name}/documents/{id_no}",
    tag = "documents",
    params(
        ("name" = String, Path, description = "Collection name"),
        ("id_no" = String, Path, description = "Document business id")
    ),
    responses(
        (status = 204, description = "Document deleted (or never existed)"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn delete_document(
    State(state): State<AppState>,
    Path((name, id_no)): Path<(String, String)>,
) -> DocumentResult<impl IntoResponse> {
    state.service.delete_document(&name, &id_no).await?;
    Ok(StatusCode::NO_CONTENT)
}
