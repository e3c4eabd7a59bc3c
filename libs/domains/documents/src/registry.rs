use std::sync::Arc;

use tracing::{info, instrument};

use crate::error::DocumentResult;
use crate::repository::DocumentRepository;
use crate::schema::CollectionSchema;

/// Provisions and destroys collections.
pub struct SchemaRegistry<R: DocumentRepository> {
    repository: Arc<R>,
}

impl<R: DocumentRepository> SchemaRegistry<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create `name` with the given schema.
    ///
    /// The schema must declare a text `id_no` field and translates atomically
    /// into the store's class definition; vectors are supplied per document,
    /// so server-side vectorization stays disabled. Creating a collection
    /// that already exists is a successful no-op.
    #[instrument(skip(self, schema))]
    pub async fn create_collection(
        &self,
        name: &str,
        schema: &CollectionSchema,
    ) -> DocumentResult<()> {
        let definition = schema.to_class_definition(name)?;
        self.repository.create_class(&definition).await?;
        info!(collection = name, "collection provisioned");
        Ok(())
    }

    /// Delete `name` and every document in it. Unknown collections succeed
    /// silently.
    #[instrument(skip(self))]
    pub async fn delete_collection(&self, name: &str) -> DocumentResult<()> {
        self.repository.delete_class(name).await
    }
}

impl<R: DocumentRepository> Clone for SchemaRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
