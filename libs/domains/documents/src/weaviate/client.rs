use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::WeaviateConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::models::{QueryHit, StoredObject};
use crate::repository::DocumentRepository;
use crate::schema::{ClassDefinition, ID_FIELD};

/// Error fragment Weaviate reports when a vector's length disagrees with the
/// collection's established dimension.
const DIMENSION_MISMATCH_MARKER: &str = "vector lengths don't match";

/// Error fragment GraphQL reports when the queried class does not exist.
const UNKNOWN_CLASS_MARKER: &str = "Cannot query field";

/// Weaviate-backed implementation of DocumentRepository.
///
/// Schema and object operations go through the REST endpoints
/// (`/v1/schema`, `/v1/objects`); lookups and similarity queries go through
/// GraphQL (`/v1/graphql`). The wrapped HTTP client is the one long-lived
/// connection handle of this layer.
pub struct WeaviateRepository {
    client: reqwest::Client,
    config: WeaviateConfig,
}

impl WeaviateRepository {
    pub fn new(config: WeaviateConfig) -> DocumentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocumentError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> DocumentResult<Self> {
        Self::new(WeaviateConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    async fn graphql(&self, query: String) -> DocumentResult<Value> {
        let response = self
            .client
            .post(self.url("/v1/graphql"))
            .json(&json!({ "query": query }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DocumentError::Backend(format!(
                "GraphQL request failed ({}): {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    fn graphql_errors(response: &Value) -> Option<String> {
        let errors = response.get("errors")?.as_array()?;
        if errors.is_empty() {
            return None;
        }

        let messages: Vec<&str> = errors
            .iter()
            .filter_map(|e| e.get("message").and_then(Value::as_str))
            .collect();
        Some(messages.join("; "))
    }

    fn classify_query_error(message: String) -> DocumentError {
        if message.contains(DIMENSION_MISMATCH_MARKER) {
            DocumentError::DimensionMismatch(message)
        } else {
            DocumentError::Backend(message)
        }
    }

    /// Certainties come back as numbers, hybrid scores as strings.
    fn score_value(value: &Value) -> Option<f32> {
        match value {
            Value::Number(n) => n.as_f64().map(|f| f as f32),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn hits_from_response(
        response: &Value,
        class: &str,
        score_field: &str,
    ) -> DocumentResult<Vec<QueryHit>> {
        let items = response
            .pointer(&format!("/data/Get/{}", class))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                DocumentError::Backend(format!("malformed query response for class '{}'", class))
            })?;

        items
            .iter()
            .map(|item| {
                let id_no = item
                    .get(ID_FIELD)
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        DocumentError::Backend("query hit without an id_no property".to_string())
                    })?
                    .to_string();

                let score = item
                    .pointer(&format!("/_additional/{}", score_field))
                    .and_then(Self::score_value)
                    .ok_or_else(|| {
                        DocumentError::Backend(format!(
                            "query hit without a {} score",
                            score_field
                        ))
                    })?;

                Ok(QueryHit { id_no, score })
            })
            .collect()
    }

    fn vector_literal(vector: &[f32]) -> String {
        serde_json::to_string(vector).unwrap_or_else(|_| "[]".to_string())
    }

    async fn rest_error(context: &str, response: reqwest::Response) -> DocumentError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains(DIMENSION_MISMATCH_MARKER) {
            DocumentError::DimensionMismatch(body)
        } else {
            DocumentError::Backend(format!("{} ({}): {}", context, status, body))
        }
    }
}

#[derive(Debug, Serialize)]
struct NewObject<'a> {
    class: &'a str,
    properties: &'a Map<String, Value>,
    vector: &'a [f32],
}

#[derive(Debug, Serialize)]
struct ObjectMerge<'a> {
    class: &'a str,
    id: Uuid,
    properties: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<&'a [f32]>,
}

#[derive(Debug, Deserialize)]
struct ObjectResponse {
    id: Uuid,
    #[serde(default)]
    properties: Map<String, Value>,
    #[serde(default)]
    vector: Vec<f32>,
}

#[async_trait]
impl DocumentRepository for WeaviateRepository {
    async fn create_class(&self, definition: &ClassDefinition) -> DocumentResult<()> {
        let response = self
            .client
            .post(self.url("/v1/schema"))
            .json(definition)
            .send()
            .await?;

        // The store reports an existing class as 422; provisioning is
        // idempotent from the caller's perspective.
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!(class = %definition.class, "class already exists");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to create class", response).await);
        }

        Ok(())
    }

    async fn delete_class(&self, class: &str) -> DocumentResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/schema/{}", class)))
            .send()
            .await?;

        // Unknown classes come back as 400; deleting them is a no-op.
        if response.status() == StatusCode::BAD_REQUEST {
            debug!(class, "class does not exist, nothing to delete");
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to delete class", response).await);
        }

        Ok(())
    }

    async fn find_by_property(
        &self,
        class: &str,
        field: &str,
        value: &str,
    ) -> DocumentResult<Vec<Uuid>> {
        let query = format!(
            "{{ Get {{ {class}(where: {{path: [{field}], operator: Equal, valueText: {value}}}) \
             {{ {id_field} _additional {{ id }} }} }} }}",
            class = class,
            field = serde_json::to_string(field)?,
            value = serde_json::to_string(value)?,
            id_field = ID_FIELD,
        );

        let response = self.graphql(query).await?;

        if let Some(message) = Self::graphql_errors(&response) {
            // A class that was never provisioned reads as an empty result.
            if message.contains(UNKNOWN_CLASS_MARKER) {
                return Ok(vec![]);
            }
            return Err(DocumentError::Backend(message));
        }

        let items = response
            .pointer(&format!("/data/Get/{}", class))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                DocumentError::Backend(format!("malformed lookup response for class '{}'", class))
            })?;

        items
            .iter()
            .filter_map(|item| item.pointer("/_additional/id").and_then(Value::as_str))
            .map(|raw| {
                Uuid::parse_str(raw).map_err(|e| {
                    DocumentError::Backend(format!("invalid object key '{}': {}", raw, e))
                })
            })
            .collect()
    }

    async fn insert_object(
        &self,
        class: &str,
        properties: Map<String, Value>,
        vector: Vec<f32>,
    ) -> DocumentResult<Uuid> {
        let body = NewObject {
            class,
            properties: &properties,
            vector: &vector,
        };

        let response = self
            .client
            .post(self.url("/v1/objects"))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to create object", response).await);
        }

        let created: ObjectResponse = response.json().await?;
        Ok(created.id)
    }

    async fn fetch_object(&self, class: &str, key: Uuid) -> DocumentResult<Option<StoredObject>> {
        let response = self
            .client
            .get(self.url(&format!("/v1/objects/{}/{}", class, key)))
            .query(&[("include", "vector")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to fetch object", response).await);
        }

        let object: ObjectResponse = response.json().await?;
        Ok(Some(StoredObject {
            key: object.id,
            properties: object.properties,
            vector: object.vector,
        }))
    }

    async fn merge_object(
        &self,
        class: &str,
        key: Uuid,
        properties: Map<String, Value>,
        vector: Option<Vec<f32>>,
    ) -> DocumentResult<()> {
        let body = ObjectMerge {
            class,
            id: key,
            properties: &properties,
            vector: vector.as_deref(),
        };

        let response = self
            .client
            .patch(self.url(&format!("/v1/objects/{}/{}", class, key)))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to merge object", response).await);
        }

        Ok(())
    }

    async fn remove_object(&self, class: &str, key: Uuid) -> DocumentResult<()> {
        let response = self
            .client
            .delete(self.url(&format!("/v1/objects/{}/{}", class, key)))
            .send()
            .await?;

        // Already gone is as good as deleted.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        if !response.status().is_success() {
            return Err(Self::rest_error("failed to delete object", response).await);
        }

        Ok(())
    }

    async fn near_vector(
        &self,
        class: &str,
        vector: &[f32],
        limit: usize,
    ) -> DocumentResult<Vec<QueryHit>> {
        let gql = format!(
            "{{ Get {{ {class}(nearVector: {{vector: {vector}}}, limit: {limit}) \
             {{ {id_field} _additional {{ certainty }} }} }} }}",
            class = class,
            vector = Self::vector_literal(vector),
            limit = limit,
            id_field = ID_FIELD,
        );

        let response = self.graphql(gql).await?;

        if let Some(message) = Self::graphql_errors(&response) {
            return Err(Self::classify_query_error(message));
        }

        Self::hits_from_response(&response, class, "certainty")
    }

    async fn hybrid(
        &self,
        class: &str,
        query: &str,
        vector: &[f32],
        limit: usize,
        alpha: f32,
    ) -> DocumentResult<Vec<QueryHit>> {
        let gql = format!(
            "{{ Get {{ {class}(hybrid: {{query: {text}, vector: {vector}, alpha: {alpha}}}, \
             limit: {limit}) {{ {id_field} _additional {{ score }} }} }} }}",
            class = class,
            text = serde_json::to_string(query)?,
            vector = Self::vector_literal(vector),
            alpha = alpha,
            limit = limit,
            id_field = ID_FIELD,
        );

        let response = self.graphql(gql).await?;

        if let Some(message) = Self::graphql_errors(&response) {
            return Err(Self::classify_query_error(message));
        }

        Self::hits_from_response(&response, class, "score")
    }
}
