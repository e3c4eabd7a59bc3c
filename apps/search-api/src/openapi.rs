//! OpenAPI documentation for the search API

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        api::collections::create_collection,
        api::collections::delete_collection,
        api::documents::create_document,
        api::documents::create_documents,
        api::documents::get_document,
        api::documents::update_document,
        api::documents::delete_document,
        api::search::search_by_vector,
        api::search::search_by_hybrid,
        api::search::query,
    ),
    components(schemas(
        api::health::HealthResponse,
        api::collections::CreateCollectionRequest,
        api::collections::CollectionResponse,
        api::documents::DocumentCreatedResponse,
        api::documents::UpdateDocumentRequest,
        api::documents::UpdateDocumentResponse,
        api::search::VectorSearchRequest,
        api::search::HybridSearchRequest,
        api::search::QueryRequest,
        domain_documents::Document,
        domain_documents::PropertyValue,
        domain_documents::ScoredDocument,
        domain_documents::BatchItemOutcome,
        domain_documents::UpdateOutcome,
        domain_documents::PairedResults,
    )),
    tags(
        (name = "collections", description = "Collection provisioning"),
        (name = "documents", description = "Document management"),
        (name = "search", description = "Similarity and hybrid queries"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
