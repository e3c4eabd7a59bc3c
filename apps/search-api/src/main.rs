//! Multi-modal search demo API
//!
//! HTTP gateway over the vector document management layer: collection
//! provisioning, document CRUD, and top-k queries by vector, text or image.

use std::sync::Arc;

use core_config::tracing::{init_tracing, install_color_eyre};
use domain_documents::{DocumentService, HttpEmbedderProvider, WeaviateRepository};
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!("Connecting to Weaviate at {}", config.weaviate.base_url());
    let repository = WeaviateRepository::new(config.weaviate.clone())?;

    let mut service = DocumentService::new(repository);

    // The embedder collaborator is optional; without it only raw-vector and
    // hybrid-with-explicit-embedding queries are served.
    match &config.embedder {
        Some(embedder_config) => {
            info!("Embedder service configured at {}", embedder_config.base_url);
            let provider = HttpEmbedderProvider::new(embedder_config.clone())?;
            service = service.with_embedding_provider(Arc::new(provider));
        }
        None => {
            info!("EMBEDDER_URL not set, text/image query endpoint disabled");
        }
    }

    let state = AppState {
        config: config.clone(),
        service: Arc::new(service),
    };

    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(config.server.address()).await?;
    info!("Search API listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Search API shutdown complete");
    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM (what the container runtime sends).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
