pub mod collections;
pub mod documents;
pub mod health;
pub mod search;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Assemble the full application router: API routes under `/api`, health,
/// Swagger UI, and request tracing.
pub fn router(state: AppState) -> Router {
    let app_info = state.config.app;

    let api_routes = Router::new()
        .route("/collections", post(collections::create_collection))
        .route("/collections/{name}", delete(collections::delete_collection))
        .route(
            "/collections/{name}/documents",
            post(documents::create_document),
        )
        .route(
            "/collections/{name}/documents/batch",
            post(documents::create_documents),
        )
        .route(
            "/collections/{name}/documents/{id_no}",
            get(documents::get_document)
                .patch(documents::update_document)
                .delete(documents::delete_document),
        )
        .route("/search/vector", post(search::search_by_vector))
        .route("/search/hybrid", post(search::search_by_hybrid))
        .route("/query", post(search::query))
        .with_state(state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api_routes)
        .merge(health::router(app_info))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
