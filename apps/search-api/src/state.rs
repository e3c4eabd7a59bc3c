//! Shared application state passed to all request handlers.

use std::sync::Arc;

use domain_documents::{DocumentService, WeaviateRepository};

/// Cloned per handler (inexpensive Arc clones).
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// Document service over the Weaviate-backed repository
    pub service: Arc<DocumentService<WeaviateRepository>>,
}
