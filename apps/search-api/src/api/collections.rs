//! Collection provisioning endpoints

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use domain_documents::{CollectionSchema, DocumentError, DocumentResult};

use crate::state::AppState;

/// Request to create a collection with string-tagged field types.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCollectionRequest {
    #[validate(length(min = 1))]
    pub name: String,
    /// Field name to logical type tag, e.g. `{"id_no": "str", "views": "int"}`
    pub schema: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub name: String,
    pub status: String,
}

/// Create a collection
#[utoipa::path(
    post,
    path = "/collections",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection provisioned", body = CollectionResponse),
        (status = 400, description = "Invalid schema"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> DocumentResult<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| DocumentError::Schema(e.to_string()))?;

    let schema = CollectionSchema::from_tags(
        request
            .schema
            .iter()
            .map(|(name, tag)| (name.as_str(), tag.as_str())),
    )?;

    state
        .service
        .create_collection(&request.name, &schema)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CollectionResponse {
            name: request.name,
            status: "created".to_string(),
        }),
    ))
}

/// Delete a collection and all of its documents
#[utoipa::path(
    delete,
    path = "/collections/{name}",
    tag = "collections",
    params(
        ("name" = String, Path, description = "Collection name")
    ),
    responses(
        (status = 204, description = "Collection deleted (or never existed)"),
        (status = 500, description = "Backend failure")
    )
)]
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> DocumentResult<impl IntoResponse> {
    state.service.delete_collection(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
