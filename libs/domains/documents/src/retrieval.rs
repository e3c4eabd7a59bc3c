use std::sync::Arc;

use tracing::{instrument, warn};

use crate::error::{DocumentError, DocumentResult};
use crate::models::{QueryHit, ScoredDocument};
use crate::repository::DocumentRepository;
use crate::store::DocumentStore;

/// Executes top-k similarity queries and materializes the full document for
/// every hit.
pub struct RetrievalEngine<R: DocumentRepository> {
    repository: Arc<R>,
    store: DocumentStore<R>,
}

impl<R: DocumentRepository> RetrievalEngine<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            store: DocumentStore::new(Arc::clone(&repository)),
            repository,
        }
    }

    /// Nearest-neighbor top-k by vector certainty.
    ///
    /// Asking for more hits than the collection holds is not an error; the
    /// result is simply shorter. A query vector of the wrong dimension fails
    /// with [`DocumentError::DimensionMismatch`] and returns nothing.
    #[instrument(skip(self, query_embedding))]
    pub async fn top_k_by_vector(
        &self,
        collection: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        validate_k(k)?;

        let hits = self
            .repository
            .near_vector(collection, query_embedding, k)
            .await?;
        self.materialize(collection, hits).await
    }

    /// Hybrid lexical+vector top-k.
    ///
    /// `alpha` weighs the fusion: 0 ranks purely by lexical match to
    /// `query_text`, 1 purely by vector similarity, intermediate values blend
    /// the normalized scores. The fused score is attached to each result.
    #[instrument(skip(self, query_text, query_embedding))]
    pub async fn top_k_by_hybrid(
        &self,
        collection: &str,
        query_text: &str,
        query_embedding: &[f32],
        k: usize,
        alpha: f32,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        validate_k(k)?;
        validate_alpha(alpha)?;

        let hits = self
            .repository
            .hybrid(collection, query_text, query_embedding, k, alpha)
            .await?;
        self.materialize(collection, hits).await
    }

    /// Re-fetch the full document for each raw hit and attach its score.
    async fn materialize(
        &self,
        collection: &str,
        hits: Vec<QueryHit>,
    ) -> DocumentResult<Vec<ScoredDocument>> {
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            match self.store.read(collection, &hit.id_no).await {
                Ok(document) => results.push(ScoredDocument {
                    document,
                    score: hit.score,
                }),
                Err(DocumentError::NotFound { .. }) => {
                    warn!(
                        collection,
                        id_no = %hit.id_no,
                        "hit vanished before materialization, skipping"
                    );
                }
                Err(err) => return Err(err),
            }
        }

        Ok(results)
    }
}

impl<R: DocumentRepository> Clone for RetrievalEngine<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            store: self.store.clone(),
        }
    }
}

fn validate_k(k: usize) -> DocumentResult<()> {
    if k < 1 {
        return Err(DocumentError::Schema(format!(
            "top_k must be at least 1, got {}",
            k
        )));
    }
    Ok(())
}

fn validate_alpha(alpha: f32) -> DocumentResult<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(DocumentError::Schema(format!(
            "alpha must be within [0, 1], got {}",
            alpha
        )));
    }
    Ok(())
}
