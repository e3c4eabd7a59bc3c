//! End-to-end scenarios for the document management layer, driven against an
//! in-memory implementation of the backing store protocol.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use domain_documents::{
    ClassDefinition, CollectionPair, CollectionSchema, Document, DocumentError, DocumentPatch,
    DocumentRepository, DocumentResult, DocumentService, DocumentStore, EmbedContent,
    EmbeddedQuery, EmbeddingProvider, FieldType, PropertyValue, QueryHit, RetrievalEngine,
    SchemaRegistry, StoredObject, UpdateOutcome, ID_FIELD,
};

const DIMENSION_MISMATCH: &str = "vector lengths don't match";

#[derive(Default)]
struct ClassState {
    dimension: Option<usize>,
    objects: Vec<(Uuid, Map<String, Value>, Vec<f32>)>,
}

/// In-memory stand-in for the vector store. It mimics the backend contracts
/// the layer relies on: idempotent class management, a dimension fixed at
/// first insert, exact-match lookups, and certainty/hybrid scoring. Like the
/// real store, a rejected insert may leave a partial record behind.
#[derive(Default)]
struct InMemoryRepository {
    classes: Mutex<HashMap<String, ClassState>>,
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn certainty(query: &[f32], vector: &[f32]) -> f32 {
    (1.0 + cosine(query, vector)) / 2.0
}

fn lexical_score(query: &str, properties: &Map<String, Value>) -> f32 {
    let tokens: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if tokens.is_empty() {
        return 0.0;
    }

    let haystack = properties
        .values()
        .filter_map(Value::as_str)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let matched = tokens.iter().filter(|t| haystack.contains(*t)).count();
    matched as f32 / tokens.len() as f32
}

fn hit_for(properties: &Map<String, Value>, score: f32) -> Option<QueryHit> {
    properties
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(|id_no| QueryHit {
            id_no: id_no.to_string(),
            score,
        })
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn create_class(&self, definition: &ClassDefinition) -> DocumentResult<()> {
        let mut classes = self.classes.lock().unwrap();
        classes.entry(definition.class.clone()).or_default();
        Ok(())
    }

    async fn delete_class(&self, class: &str) -> DocumentResult<()> {
        self.classes.lock().unwrap().remove(class);
        Ok(())
    }

    async fn find_by_property(
        &self,
        class: &str,
        field: &str,
        value: &str,
    ) -> DocumentResult<Vec<Uuid>> {
        let classes = self.classes.lock().unwrap();
        let Some(state) = classes.get(class) else {
            return Ok(vec![]);
        };

        Ok(state
            .objects
            .iter()
            .filter(|(_, properties, _)| properties.get(field).and_then(Value::as_str) == Some(value))
            .map(|(key, _, _)| *key)
            .collect())
    }

    async fn insert_object(
        &self,
        class: &str,
        properties: Map<String, Value>,
        vector: Vec<f32>,
    ) -> DocumentResult<Uuid> {
        let mut classes = self.classes.lock().unwrap();
        let state = classes
            .get_mut(class)
            .ok_or_else(|| DocumentError::Backend(format!("class '{}' does not exist", class)))?;

        let key = Uuid::new_v4();
        match state.dimension {
            None => state.dimension = Some(vector.len()),
            Some(dimension) if dimension != vector.len() => {
                // The record is materialized before the vector is rejected.
                state.objects.push((key, properties, vector));
                return Err(DocumentError::DimensionMismatch(DIMENSION_MISMATCH.into()));
            }
            Some(_) => {}
        }

        state.objects.push((key, properties, vector));
        Ok(key)
    }

    async fn fetch_object(&self, class: &str, key: Uuid) -> DocumentResult<Option<StoredObject>> {
        let classes = self.classes.lock().unwrap();
        Ok(classes.get(class).and_then(|state| {
            state
                .objects
                .iter()
                .find(|(k, _, _)| *k == key)
                .map(|(k, properties, vector)| StoredObject {
                    key: *k,
                    properties: properties.clone(),
                    vector: vector.clone(),
                })
        }))
    }

    async fn merge_object(
        &self,
        class: &str,
        key: Uuid,
        properties: Map<String, Value>,
        vector: Option<Vec<f32>>,
    ) -> DocumentResult<()> {
        let mut classes = self.classes.lock().unwrap();
        let state = classes
            .get_mut(class)
            .ok_or_else(|| DocumentError::Backend(format!("class '{}' does not exist", class)))?;

        if let (Some(dimension), Some(new_vector)) = (state.dimension, vector.as_ref()) {
            if new_vector.len() != dimension {
                return Err(DocumentError::DimensionMismatch(DIMENSION_MISMATCH.into()));
            }
        }

        let object = state
            .objects
            .iter_mut()
            .find(|(k, _, _)| *k == key)
            .ok_or_else(|| DocumentError::Backend(format!("object '{}' does not exist", key)))?;

        for (name, value) in properties {
            object.1.insert(name, value);
        }
        if let Some(new_vector) = vector {
            object.2 = new_vector;
        }

        Ok(())
    }

    async fn remove_object(&self, class: &str, key: Uuid) -> DocumentResult<()> {
        let mut classes = self.classes.lock().unwrap();
        if let Some(state) = classes.get_mut(class) {
            state.objects.retain(|(k, _, _)| *k != key);
        }
        Ok(())
    }

    async fn near_vector(
        &self,
        class: &str,
        vector: &[f32],
        limit: usize,
    ) -> DocumentResult<Vec<QueryHit>> {
        let classes = self.classes.lock().unwrap();
        let state = classes
            .get(class)
            .ok_or_else(|| DocumentError::Backend(format!("class '{}' does not exist", class)))?;

        if let Some(dimension) = state.dimension {
            if vector.len() != dimension {
                return Err(DocumentError::DimensionMismatch(DIMENSION_MISMATCH.into()));
            }
        }

        let mut hits: Vec<QueryHit> = state
            .objects
            .iter()
            .filter_map(|(_, properties, stored)| {
                hit_for(properties, certainty(vector, stored))
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn hybrid(
        &self,
        class: &str,
        query: &str,
        vector: &[f32],
        limit: usize,
        alpha: f32,
    ) -> DocumentResult<Vec<QueryHit>> {
        let classes = self.classes.lock().unwrap();
        let state = classes
            .get(class)
            .ok_or_else(|| DocumentError::Backend(format!("class '{}' does not exist", class)))?;

        if let Some(dimension) = state.dimension {
            if vector.len() != dimension {
                return Err(DocumentError::DimensionMismatch(DIMENSION_MISMATCH.into()));
            }
        }

        let mut hits: Vec<QueryHit> = state
            .objects
            .iter()
            .filter_map(|(_, properties, stored)| {
                let fused = alpha * certainty(vector, stored)
                    + (1.0 - alpha) * lexical_score(query, properties);
                hit_for(properties, fused)
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// Embedder double returning a fixed vector and derived text.
struct StubEmbedder {
    vector: Vec<f32>,
    derived_text: String,
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, _content: EmbedContent) -> DocumentResult<EmbeddedQuery> {
        Ok(EmbeddedQuery {
            vector: self.vector.clone(),
            derived_text: Some(self.derived_text.clone()),
        })
    }
}

fn article_schema() -> CollectionSchema {
    CollectionSchema::new()
        .with_field(ID_FIELD, FieldType::Text)
        .with_field("title", FieldType::Text)
        .with_field("views", FieldType::Int)
        .with_field("published_at", FieldType::DateTime)
}

async fn provisioned(
    repository: &Arc<InMemoryRepository>,
    collection: &str,
) -> (SchemaRegistry<InMemoryRepository>, DocumentStore<InMemoryRepository>) {
    let registry = SchemaRegistry::new(Arc::clone(repository));
    registry
        .create_collection(collection, &article_schema())
        .await
        .unwrap();
    (registry, DocumentStore::new(Arc::clone(repository)))
}

#[tokio::test]
async fn test_create_then_read_round_trips() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    let published = Utc.with_ymd_and_hms(2023, 4, 1, 9, 0, 0).unwrap();
    let document = Document::new("72671", vec![0.1, 0.2, 0.3])
        .with_property("title", PropertyValue::Text("golden retriever puppy".into()))
        .with_property("views", PropertyValue::Int(41))
        .with_property("published_at", PropertyValue::DateTime(published));

    store.create("Articles", &document).await.unwrap();

    let read_back = store.read("Articles", "72671").await.unwrap();
    assert_eq!(read_back, document);
}

#[tokio::test]
async fn test_duplicate_create_is_rejected_and_original_kept() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    let original = Document::new("72671", vec![0.1, 0.2, 0.3])
        .with_property("title", PropertyValue::Text("original".into()));
    store.create("Articles", &original).await.unwrap();

    let imposter = Document::new("72671", vec![0.9, 0.9, 0.9])
        .with_property("title", PropertyValue::Text("imposter".into()));
    let err = store.create("Articles", &imposter).await.unwrap_err();
    assert!(matches!(err, DocumentError::Duplicate { .. }));

    let read_back = store.read("Articles", "72671").await.unwrap();
    assert_eq!(read_back, original);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    // Deleting something that never existed is fine.
    store.delete("Articles", "ghost").await.unwrap();

    let document = Document::new("72671", vec![0.1, 0.2, 0.3]);
    store.create("Articles", &document).await.unwrap();

    store.delete("Articles", "72671").await.unwrap();
    let err = store.read("Articles", "72671").await.unwrap_err();
    assert!(matches!(err, DocumentError::NotFound { .. }));

    // And again, now that it is gone.
    store.delete("Articles", "72671").await.unwrap();
}

#[tokio::test]
async fn test_create_with_wrong_dimension_rolls_back() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    // First insert fixes the collection dimension at 3.
    let document = Document::new("72671", vec![0.1, 0.2, 0.3]);
    store.create("Articles", &document).await.unwrap();

    let wrong = Document::new("99999", vec![0.1, 0.2]);
    let err = store.create("Articles", &wrong).await.unwrap_err();
    assert!(matches!(err, DocumentError::DimensionMismatch(_)));

    // All-or-nothing: the partial record was cleaned up again.
    assert!(!store.identity().exists("Articles", "99999").await.unwrap());
}

#[tokio::test]
async fn test_top_k_caps_to_available_documents() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    for (id_no, vector) in [
        ("a1", vec![1.0, 0.0]),
        ("a2", vec![0.7, 0.7]),
        ("a3", vec![0.0, 1.0]),
    ] {
        store
            .create("Articles", &Document::new(id_no, vector))
            .await
            .unwrap();
    }

    let engine = RetrievalEngine::new(Arc::clone(&repository));
    let results = engine
        .top_k_by_vector("Articles", &[1.0, 0.0], 10)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    for result in &results {
        assert!(result.score > 0.0 && result.score <= 1.0);
    }
    // Best match first.
    assert_eq!(results[0].document.id_no, "a1");
}

#[tokio::test]
async fn test_hybrid_alpha_boundaries() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    let query_vector = [1.0, 0.0];

    // Strong lexical match, orthogonal vector.
    store
        .create(
            "Articles",
            &Document::new("lex", vec![0.0, 1.0])
                .with_property("title", PropertyValue::Text("golden retriever puppy".into())),
        )
        .await
        .unwrap();

    // Identical vector, unrelated text.
    store
        .create(
            "Articles",
            &Document::new("vec", vec![1.0, 0.0])
                .with_property("title", PropertyValue::Text("quarterly finance report".into())),
        )
        .await
        .unwrap();

    let engine = RetrievalEngine::new(Arc::clone(&repository));

    let lexical_only = engine
        .top_k_by_hybrid("Articles", "golden retriever puppy", &query_vector, 2, 0.0)
        .await
        .unwrap();
    assert_eq!(lexical_only[0].document.id_no, "lex");

    let vector_only = engine
        .top_k_by_hybrid("Articles", "golden retriever puppy", &query_vector, 2, 1.0)
        .await
        .unwrap();
    assert_eq!(vector_only[0].document.id_no, "vec");
}

#[tokio::test]
async fn test_collection_without_id_field_is_not_provisioned() {
    let repository = Arc::new(InMemoryRepository::default());
    let registry = SchemaRegistry::new(Arc::clone(&repository));

    let schema = CollectionSchema::new().with_field("caption", FieldType::Text);
    let err = registry
        .create_collection("Images", &schema)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Schema(_)));

    // Nothing was provisioned: inserting into the collection hits a missing
    // class, not a half-created one.
    let store = DocumentStore::new(Arc::clone(&repository));
    let err = store
        .create("Images", &Document::new("i1", vec![0.5]))
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::Backend(_)));
}

#[tokio::test]
async fn test_update_with_only_id_is_reported_as_noop() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    store
        .create("Articles", &Document::new("72671", vec![0.1, 0.2, 0.3]))
        .await
        .unwrap();

    let outcome = store
        .update("Articles", &DocumentPatch::new("72671"))
        .await
        .unwrap();
    assert_eq!(outcome, UpdateOutcome::NothingToUpdate);
}

#[tokio::test]
async fn test_update_merges_properties() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    store
        .create(
            "Articles",
            &Document::new("72671", vec![0.1, 0.2, 0.3])
                .with_property("title", PropertyValue::Text("old title".into()))
                .with_property("views", PropertyValue::Int(7)),
        )
        .await
        .unwrap();

    let patch = DocumentPatch::new("72671")
        .with_property("title", PropertyValue::Text("new title".into()));
    let outcome = store.update("Articles", &patch).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Applied);

    let read_back = store.read("Articles", "72671").await.unwrap();
    assert_eq!(
        read_back.properties.get("title"),
        Some(&PropertyValue::Text("new title".into()))
    );
    // Untouched keys survive the merge.
    assert_eq!(
        read_back.properties.get("views"),
        Some(&PropertyValue::Int(7))
    );
}

#[tokio::test]
async fn test_update_with_wrong_dimension_restores_previous_vector() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    store
        .create(
            "Articles",
            &Document::new("72671", vec![0.1, 0.2, 0.3])
                .with_property("title", PropertyValue::Text("old title".into())),
        )
        .await
        .unwrap();

    let patch = DocumentPatch::new("72671")
        .with_property("title", PropertyValue::Text("new title".into()))
        .with_embedding(vec![0.9, 0.9]);
    let err = store.update("Articles", &patch).await.unwrap_err();
    assert!(matches!(err, DocumentError::DimensionMismatch(_)));

    // Self-healing rollback: properties merged, previous vector kept.
    let read_back = store.read("Articles", "72671").await.unwrap();
    assert_eq!(read_back.embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(
        read_back.properties.get("title"),
        Some(&PropertyValue::Text("new title".into()))
    );
}

#[tokio::test]
async fn test_vector_replacement_applies() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    store
        .create("Articles", &Document::new("72671", vec![0.1, 0.2, 0.3]))
        .await
        .unwrap();

    let patch = DocumentPatch::new("72671").with_embedding(vec![0.4, 0.5, 0.6]);
    assert_eq!(
        store.update("Articles", &patch).await.unwrap(),
        UpdateOutcome::Applied
    );

    let read_back = store.read("Articles", "72671").await.unwrap();
    assert_eq!(read_back.embedding, vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn test_batch_create_reports_per_document_outcomes() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    let documents = vec![
        Document::new("a1", vec![0.1, 0.2]),
        Document::new("a1", vec![0.3, 0.4]),
        Document::new("a2", vec![0.5, 0.6]),
    ];

    let outcomes = store.create_many("Articles", &documents).await.unwrap();

    assert_eq!(outcomes.len(), 3);
    assert!(outcomes[0].created);
    assert!(!outcomes[1].created);
    assert!(outcomes[1].error.as_deref().unwrap_or_default().contains("already exists"));
    assert!(outcomes[2].created);
}

#[tokio::test]
async fn test_query_with_wrong_dimension_returns_no_partial_results() {
    let repository = Arc::new(InMemoryRepository::default());
    let (_registry, store) = provisioned(&repository, "Articles").await;

    store
        .create("Articles", &Document::new("a1", vec![0.1, 0.2, 0.3]))
        .await
        .unwrap();

    let engine = RetrievalEngine::new(Arc::clone(&repository));
    let err = engine
        .top_k_by_vector("Articles", &[0.1, 0.2], 5)
        .await
        .unwrap_err();
    assert!(matches!(err, DocumentError::DimensionMismatch(_)));
}

#[tokio::test]
async fn test_query_pair_fans_out_to_both_collections() {
    let repository = InMemoryRepository::default();
    let service = DocumentService::new(repository).with_embedding_provider(Arc::new(StubEmbedder {
        vector: vec![1.0, 0.0],
        derived_text: "golden retriever puppy".to_string(),
    }));

    let pair = CollectionPair {
        text_collection: "Articles".to_string(),
        image_collection: "Images".to_string(),
    };

    let schema = CollectionSchema::new()
        .with_field(ID_FIELD, FieldType::Text)
        .with_field("title", FieldType::Text);
    service.create_collection("Articles", &schema).await.unwrap();
    service.create_collection("Images", &schema).await.unwrap();

    service
        .create_document(
            "Articles",
            &Document::new("article-1", vec![1.0, 0.0])
                .with_property("title", PropertyValue::Text("golden retriever puppy".into())),
        )
        .await
        .unwrap();
    service
        .create_document(
            "Images",
            &Document::new("image-1", vec![0.9, 0.1])
                .with_property("title", PropertyValue::Text("a dog at the beach".into())),
        )
        .await
        .unwrap();

    let results = service
        .query_pair(&pair, EmbedContent::Text("golden retriever puppy".into()), 5, 0.5)
        .await
        .unwrap();

    assert_eq!(results.query_text, "golden retriever puppy");
    assert_eq!(results.text_results.len(), 1);
    assert_eq!(results.text_results[0].document.id_no, "article-1");
    assert_eq!(results.image_results.len(), 1);
    assert_eq!(results.image_results[0].document.id_no, "image-1");
}
