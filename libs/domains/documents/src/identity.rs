use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::{DocumentError, DocumentResult};
use crate::repository::DocumentRepository;
use crate::schema::ID_FIELD;

/// Maps business ids to the backing store's internal object keys.
///
/// The store never exposes its keys to callers; every id-addressed operation
/// resolves them on demand through this component.
pub struct IdentityResolver<R: DocumentRepository> {
    repository: Arc<R>,
}

impl<R: DocumentRepository> IdentityResolver<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Resolve the internal key for `id_no`.
    ///
    /// More than one match means the store holds duplicate documents for one
    /// business id; the store stays authoritative, so this is logged as a
    /// data-integrity warning and the first match wins.
    pub async fn resolve(&self, collection: &str, id_no: &str) -> DocumentResult<Uuid> {
        let keys = self
            .repository
            .find_by_property(collection, ID_FIELD, id_no)
            .await?;

        if keys.len() > 1 {
            warn!(
                collection,
                id_no,
                matches = keys.len(),
                "duplicate documents share one business id"
            );
        }

        keys.into_iter().next().ok_or_else(|| DocumentError::NotFound {
            collection: collection.to_string(),
            id_no: id_no.to_string(),
        })
    }

    /// Whether at least one document carries `id_no`. A collection that was
    /// never provisioned reads as absent, not as an error.
    pub async fn exists(&self, collection: &str, id_no: &str) -> DocumentResult<bool> {
        let keys = self
            .repository
            .find_by_property(collection, ID_FIELD, id_no)
            .await?;
        Ok(!keys.is_empty())
    }
}

impl<R: DocumentRepository> Clone for IdentityResolver<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}
