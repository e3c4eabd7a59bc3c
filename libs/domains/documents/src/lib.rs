//! Vector Document Management Library
//!
//! This crate owns documents in an external vector database (Weaviate),
//! enforces identity and schema invariants, and performs similarity
//! retrieval (pure vector and hybrid lexical+vector).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ DocumentService  │  ← facade: provisioning, CRUD, retrieval,
//! └────────┬─────────┘    embedding integration
//!          │
//!    ┌─────┴──────────────┬─────────────────┐
//! ┌──▼────────────┐ ┌─────▼─────────┐ ┌─────▼────────────┐
//! │ SchemaRegistry│ │ DocumentStore │ │ RetrievalEngine  │
//! └──┬────────────┘ └─────┬─────────┘ └─────┬────────────┘
//!    │              ┌─────▼────────┐        │
//!    │              │ Identity     │        │
//!    │              │ Resolver     │        │
//!    │              └─────┬────────┘        │
//! ┌──▼────────────────────▼─────────────────▼──┐   ┌───────────────────┐
//! │          DocumentRepository (trait)        │   │ EmbeddingProvider │
//! └────────────────────┬───────────────────────┘   │      (trait)      │
//! ┌────────────────────▼───────────────────────┐   └─────────┬─────────┘
//! │            WeaviateRepository              │   ┌─────────▼─────────┐
//! │             (implementation)               │   │HttpEmbedderProvider│
//! └────────────────────────────────────────────┘   └───────────────────┘
//! ```
//!
//! The backing store is the sole owner of persisted state; this layer holds
//! no cache and no shared mutable state beyond the long-lived connection
//! handle inside the repository implementation.

pub mod embedding;
pub mod error;
pub mod identity;
pub mod models;
pub mod registry;
pub mod repository;
pub mod retrieval;
pub mod schema;
pub mod service;
pub mod store;
pub mod weaviate;

// Re-export commonly used types
pub use embedding::{
    EmbedContent, EmbeddedQuery, EmbedderConfig, EmbeddingProvider, HttpEmbedderProvider, Modality,
};
pub use error::{DocumentError, DocumentResult};
pub use identity::IdentityResolver;
pub use models::{
    BatchItemOutcome, Document, DocumentPatch, PropertyValue, QueryHit, ScoredDocument,
    StoredObject, UpdateOutcome,
};
pub use registry::SchemaRegistry;
pub use repository::DocumentRepository;
pub use retrieval::RetrievalEngine;
pub use schema::{ClassDefinition, ClassProperty, CollectionSchema, FieldType, ID_FIELD};
pub use service::{CollectionPair, DocumentService, PairedResults};
pub use store::DocumentStore;
pub use weaviate::{WeaviateConfig, WeaviateRepository};
