use std::time::Duration;

use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbedContent, EmbeddedQuery, EmbeddingProvider, Modality};
use crate::error::{DocumentError, DocumentResult};

/// Embedder service connection configuration
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl EmbedderConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: 60,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn from_env() -> DocumentResult<Self> {
        let base_url = std::env::var("EMBEDDER_URL")
            .map_err(|_| DocumentError::Config("EMBEDDER_URL not set".to_string()))?;

        let timeout_secs = std::env::var("EMBEDDER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            base_url,
            timeout_secs,
        })
    }
}

/// Client for the external embedder service: a multi-modal encoder that also
/// produces a caption+tags string for image inputs.
pub struct HttpEmbedderProvider {
    client: Client,
    config: EmbedderConfig,
}

impl HttpEmbedderProvider {
    pub fn new(config: EmbedderConfig) -> DocumentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocumentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> DocumentResult<Self> {
        Self::new(EmbedderConfig::from_env()?)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    modality: Modality,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_b64: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    vector: Vec<f32>,
    #[serde(default)]
    derived_text: Option<String>,
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedderProvider {
    async fn embed(&self, content: EmbedContent) -> DocumentResult<EmbeddedQuery> {
        let (request, fallback_text) = match &content {
            EmbedContent::Text(text) => (
                EmbedRequest {
                    modality: Modality::Text,
                    text: Some(text.clone()),
                    image_b64: None,
                },
                Some(text.clone()),
            ),
            EmbedContent::Image(bytes) => (
                EmbedRequest {
                    modality: Modality::Image,
                    text: None,
                    image_b64: Some(BASE64_STANDARD.encode(bytes)),
                },
                None,
            ),
        };

        let response = self
            .client
            .post(format!("{}/embed", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| DocumentError::Embedding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocumentError::Embedding(format!(
                "embedder service error ({}): {}",
                status, error_text
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| DocumentError::Embedding(e.to_string()))?;

        if body.vector.is_empty() {
            return Err(DocumentError::Embedding(
                "embedder service returned an empty vector".to_string(),
            ));
        }

        Ok(EmbeddedQuery {
            vector: body.vector,
            // Text queries fall back to the query itself as derived text.
            derived_text: body.derived_text.or(fallback_text),
        })
    }
}
