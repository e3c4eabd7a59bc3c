//! Embedding Provider collaborator: turns raw text or image content into the
//! fixed-dimension query vectors the document layer stores and searches.

mod http;
mod provider;

pub use http::{EmbedderConfig, HttpEmbedderProvider};
pub use provider::{EmbedContent, EmbeddedQuery, EmbeddingProvider, Modality};

#[cfg(test)]
pub(crate) use provider::MockEmbeddingProvider;
