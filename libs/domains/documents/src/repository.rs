use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::DocumentResult;
use crate::models::{QueryHit, StoredObject};
use crate::schema::ClassDefinition;

/// Backing vector store protocol.
///
/// This trait abstracts the external vector database. Objects are addressed
/// by the store's internal UUID keys; resolving business ids to keys lives
/// above this trait. Implementations hold a single long-lived connection
/// handle that is safe for concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    // ===== Class Management =====

    /// Provision a class. Creating a class that already exists is a
    /// successful no-op.
    async fn create_class(&self, definition: &ClassDefinition) -> DocumentResult<()>;

    /// Drop a class and all of its objects. Unknown classes are a
    /// successful no-op.
    async fn delete_class(&self, class: &str) -> DocumentResult<()>;

    // ===== Object Operations =====

    /// Internal keys of all objects whose `field` equals `value` exactly.
    /// A class that does not exist yields an empty result, not an error.
    async fn find_by_property(
        &self,
        class: &str,
        field: &str,
        value: &str,
    ) -> DocumentResult<Vec<Uuid>>;

    /// Insert an object with an explicit vector, returning its internal key.
    async fn insert_object(
        &self,
        class: &str,
        properties: Map<String, Value>,
        vector: Vec<f32>,
    ) -> DocumentResult<Uuid>;

    /// Fetch an object, including its vector, by internal key.
    async fn fetch_object(&self, class: &str, key: Uuid) -> DocumentResult<Option<StoredObject>>;

    /// Merge properties into an object, optionally replacing its vector.
    async fn merge_object(
        &self,
        class: &str,
        key: Uuid,
        properties: Map<String, Value>,
        vector: Option<Vec<f32>>,
    ) -> DocumentResult<()>;

    /// Remove an object by internal key.
    async fn remove_object(&self, class: &str, key: Uuid) -> DocumentResult<()>;

    // ===== Queries =====

    /// Nearest-neighbor hits for a query vector, at most `limit` of them,
    /// scored by vector certainty.
    async fn near_vector(
        &self,
        class: &str,
        vector: &[f32],
        limit: usize,
    ) -> DocumentResult<Vec<QueryHit>>;

    /// Hybrid lexical+vector hits fused with weight `alpha` (0 = pure
    /// lexical, 1 = pure vector), at most `limit` of them.
    async fn hybrid(
        &self,
        class: &str,
        query: &str,
        vector: &[f32],
        limit: usize,
        alpha: f32,
    ) -> DocumentResult<Vec<QueryHit>>;
}
