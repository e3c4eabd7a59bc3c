use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{DocumentError, DocumentResult};
use crate::identity::IdentityResolver;
use crate::models::{BatchItemOutcome, Document, DocumentPatch, UpdateOutcome};
use crate::repository::DocumentRepository;

/// Create/read/update/delete for documents in a collection.
///
/// Every id-addressed operation resolves the store's internal key through the
/// [`IdentityResolver`]; the backing store remains the sole owner of
/// persisted state and nothing is cached across calls.
pub struct DocumentStore<R: DocumentRepository> {
    repository: Arc<R>,
    identity: IdentityResolver<R>,
}

impl<R: DocumentRepository> DocumentStore<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&repository)),
            repository,
        }
    }

    pub fn identity(&self) -> &IdentityResolver<R> {
        &self.identity
    }

    /// Insert a new document.
    ///
    /// Fails with [`DocumentError::Duplicate`] when the id is already taken.
    /// If the store rejects the embedding for its dimension, any partially
    /// created record is deleted again: creation is all-or-nothing.
    ///
    /// The existence check and the insert are two store round-trips, so
    /// concurrent creates for one id can still race; the store is the source
    /// of truth for such duplicates (see [`IdentityResolver::resolve`]).
    #[instrument(skip(self, document), fields(id_no = %document.id_no))]
    pub async fn create(&self, collection: &str, document: &Document) -> DocumentResult<()> {
        if document.id_no.is_empty() {
            return Err(DocumentError::Schema(
                "document is missing an 'id_no' property".to_string(),
            ));
        }

        if self.identity.exists(collection, &document.id_no).await? {
            return Err(DocumentError::Duplicate {
                collection: collection.to_string(),
                id_no: document.id_no.clone(),
            });
        }

        let inserted = self
            .repository
            .insert_object(collection, document.to_payload(), document.embedding.clone())
            .await;

        match inserted {
            Ok(_key) => Ok(()),
            Err(DocumentError::DimensionMismatch(message)) => {
                // The store may have materialized the record before rejecting
                // the vector; remove it so the failed create leaves nothing.
                self.delete(collection, &document.id_no).await?;
                Err(DocumentError::DimensionMismatch(message))
            }
            Err(err) => Err(err),
        }
    }

    /// Insert a batch, one outcome per document. A failing document does not
    /// abort the rest of the batch.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn create_many(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> DocumentResult<Vec<BatchItemOutcome>> {
        let mut outcomes = Vec::with_capacity(documents.len());

        for document in documents {
            let outcome = match self.create(collection, document).await {
                Ok(()) => BatchItemOutcome {
                    id_no: document.id_no.clone(),
                    created: true,
                    error: None,
                },
                Err(err) => BatchItemOutcome {
                    id_no: document.id_no.clone(),
                    created: false,
                    error: Some(err.to_string()),
                },
            };
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Fetch the full document, embedding included, for `id_no`.
    #[instrument(skip(self))]
    pub async fn read(&self, collection: &str, id_no: &str) -> DocumentResult<Document> {
        let key = self.identity.resolve(collection, id_no).await?;

        let object = self
            .repository
            .fetch_object(collection, key)
            .await?
            .ok_or_else(|| DocumentError::NotFound {
                collection: collection.to_string(),
                id_no: id_no.to_string(),
            })?;

        Ok(Document::from_stored(id_no, object))
    }

    /// Merge a patch into an existing document.
    ///
    /// Property keys are merged into the stored object; a patch carrying an
    /// embedding replaces the stored vector. When the new vector has the
    /// wrong dimension, the merge is retried with the previous vector so the
    /// object never ends up half-updated, and the mismatch is still reported
    /// to the caller.
    #[instrument(skip(self, patch), fields(id_no = %patch.id_no))]
    pub async fn update(
        &self,
        collection: &str,
        patch: &DocumentPatch,
    ) -> DocumentResult<UpdateOutcome> {
        if patch.id_no.is_empty() {
            return Err(DocumentError::Schema(
                "update is missing an 'id_no' property".to_string(),
            ));
        }

        let key = self.identity.resolve(collection, &patch.id_no).await?;

        if patch.is_noop() {
            debug!(collection, id_no = %patch.id_no, "patch carries nothing to update");
            return Ok(UpdateOutcome::NothingToUpdate);
        }

        let properties = patch.properties_payload();

        let Some(new_vector) = &patch.embedding else {
            self.repository
                .merge_object(collection, key, properties, None)
                .await?;
            return Ok(UpdateOutcome::Applied);
        };

        // Fetch the current vector up front so a rejected replacement can be
        // rolled back to it.
        let previous = self
            .repository
            .fetch_object(collection, key)
            .await?
            .ok_or_else(|| DocumentError::NotFound {
                collection: collection.to_string(),
                id_no: patch.id_no.clone(),
            })?;

        let merged = self
            .repository
            .merge_object(collection, key, properties.clone(), Some(new_vector.clone()))
            .await;

        match merged {
            Ok(()) => Ok(UpdateOutcome::Applied),
            Err(DocumentError::DimensionMismatch(message)) => {
                self.repository
                    .merge_object(collection, key, properties, Some(previous.vector))
                    .await
                    .map_err(|restore| {
                        DocumentError::Backend(format!(
                            "failed to restore previous embedding after dimension mismatch: {}",
                            restore
                        ))
                    })?;
                Err(DocumentError::DimensionMismatch(message))
            }
            Err(err) => Err(err),
        }
    }

    /// Remove `id_no` if present; absent ids are a successful no-op.
    #[instrument(skip(self))]
    pub async fn delete(&self, collection: &str, id_no: &str) -> DocumentResult<()> {
        if !self.identity.exists(collection, id_no).await? {
            debug!(collection, id_no, "document does not exist, nothing to delete");
            return Ok(());
        }

        let key = self.identity.resolve(collection, id_no).await?;
        self.repository.remove_object(collection, key).await
    }
}

impl<R: DocumentRepository> Clone for DocumentStore<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            identity: self.identity.clone(),
        }
    }
}
