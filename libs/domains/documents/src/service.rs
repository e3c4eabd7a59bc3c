use std::sync::Arc;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::embedding::{EmbedContent, EmbeddedQuery, EmbeddingProvider};
use crate::error::{DocumentError, DocumentResult};
use crate::models::{BatchItemOutcome, Document, DocumentPatch, ScoredDocument, UpdateOutcome};
use crate::registry::SchemaRegistry;
use crate::repository::DocumentRepository;
use crate::retrieval::RetrievalEngine;
use crate::schema::CollectionSchema;
use crate::store::DocumentStore;

/// The two collections one demo query fans out to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CollectionPair {
    pub text_collection: String,
    pub image_collection: String,
}

/// Results of a combined query against a text/image collection pair.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PairedResults {
    pub query_text: String,
    pub text_results: Vec<ScoredDocument>,
    pub image_results: Vec<ScoredDocument>,
}

/// High-level facade over the document management layer.
///
/// Combines collection provisioning, document CRUD and retrieval with an
/// optional embedding provider for the demo's text/image query flow. All
/// state lives in the backing store behind the repository.
pub struct DocumentService<R: DocumentRepository> {
    registry: SchemaRegistry<R>,
    store: DocumentStore<R>,
    retrieval: RetrievalEngine<R>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
}

impl<R: DocumentRepository> DocumentService<R> {
    pub fn new(repository: R) -> Self {
        let repository = Arc::new(repository);
        Self {
            registry: SchemaRegistry::new(Arc::clone(&repository)),
            store: DocumentStore::new(Arc::clone(&repository)),
            retrieval: RetrievalEngine::new(repository),
            embedding_provider: None,
        }
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    // ===== Collection Management =====

    pub async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> DocumentResult<()> {
        self.registry.create_collection(name, schema).await
    }

    pub async fn delete_collection(&self, name: &str) -> DocumentResult<()> {
        self.registry.delete_collection(name).await
    }

    // ===== Document Operations =====

    pub async fn create_document(
        &self,
        collection: &str,
        document: &Document,
    ) -> DocumentResult<()> {
        self.store.create(collection, document).await
    }

    pub async fn create_documents(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> DocumentResult<Vec<BatchItemOutcome>> {
        self.store.create_many(collection, documents).await
    }

    pub async fn read_document(&self, collection: &str, id_no: &str) -> DocumentResult<Document> {
        self.store.read(collection, id_no).await
    }

    pub async fn update_document(
        &self,
        collection: &str,
        patch: &DocumentPatch,
    ) -> DocumentResult<UpdateOutcome> {
        self.store.update(collection, patch).await
    }

    pub async fn delete_document(&self, collection: &str, id_no: &str) -> DocumentResult<()> {
        self.store.delete(collection, id_no).await
    }

    // ===== Retrieval =====

    pub async fn top_k_by_vector(
        &self,
        collection: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        self.retrieval
            .top_k_by_vector(collection, query_embedding, k)
            .await
    }

    pub async fn top_k_by_hybrid(
        &self,
        collection: &str,
        query_text: &str,
        query_embedding: &[f32],
        k: usize,
        alpha: f32,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        self.retrieval
            .top_k_by_hybrid(collection, query_text, query_embedding, k, alpha)
            .await
    }

    // ===== Combined Operations =====

    /// Embed one piece of content through the configured provider.
    pub async fn embed(&self, content: EmbedContent) -> DocumentResult<EmbeddedQuery> {
        let provider = self
            .embedding_provider
            .as_ref()
            .ok_or_else(|| DocumentError::Config("no embedding provider configured".to_string()))?;

        provider.embed(content).await
    }

    /// The demo query flow: embed the content once, then run a hybrid query
    /// against both collections of the text/image pair. The derived text (the
    /// query itself, or a generated caption for images) carries the lexical
    /// half of the fusion.
    pub async fn query_pair(
        &self,
        pair: &CollectionPair,
        content: EmbedContent,
        k: usize,
        alpha: f32,
    ) -> DocumentResult<PairedResults> {
        let embedded = self.embed(content).await?;
        let query_text = embedded.derived_text.clone().unwrap_or_default();

        let text_results = self
            .retrieval
            .top_k_by_hybrid(&pair.text_collection, &query_text, &embedded.vector, k, alpha)
            .await?;
        let image_results = self
            .retrieval
            .top_k_by_hybrid(
                &pair.image_collection,
                &query_text,
                &embedded.vector,
                k,
                alpha,
            )
            .await?;

        Ok(PairedResults {
            query_text,
            text_results,
            image_results,
        })
    }
}

impl<R: DocumentRepository> Clone for DocumentService<R> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            store: self.store.clone(),
            retrieval: self.retrieval.clone(),
            embedding_provider: self.embedding_provider.clone(),
        }
    }
}
