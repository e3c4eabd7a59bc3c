use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DocumentResult;

/// What kind of content is being embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

/// Content handed to an embedding provider: query text or raw image bytes.
#[derive(Debug, Clone)]
pub enum EmbedContent {
    Text(String),
    Image(Vec<u8>),
}

impl EmbedContent {
    pub fn modality(&self) -> Modality {
        match self {
            EmbedContent::Text(_) => Modality::Text,
            EmbedContent::Image(_) => Modality::Image,
        }
    }
}

/// A query embedding plus the text derived from the content.
///
/// For text content the derived text is the input itself; for images it is
/// the caption+tags string the embedder generates. Either way it serves as
/// the lexical half of hybrid queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedQuery {
    pub vector: Vec<f32>,
    pub derived_text: Option<String>,
}

/// Trait for embedding generation providers.
///
/// Implementations wrap whatever model serves the vectors (a local encoder,
/// a remote embedder service); this layer only sees the contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed one piece of content into the model's vector space.
    async fn embed(&self, content: EmbedContent) -> DocumentResult<EmbeddedQuery>;
}
