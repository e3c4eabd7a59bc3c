use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::schema::ID_FIELD;

/// A typed property value, one variant per logical field type.
///
/// Writes go through this type so the schema's type mapping is enforced at
/// construction time. Reads come back from the store as JSON and are re-typed
/// by inference; `float` and `double` share the store's number type and read
/// back as [`PropertyValue::Double`].
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Double(f64),
    DateTime(DateTime<Utc>),
    Text(String),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    DoubleArray(Vec<f64>),
    TextArray(Vec<String>),
}

impl PropertyValue {
    pub fn to_json(&self) -> Value {
        match self {
            PropertyValue::Bool(b) => Value::from(*b),
            PropertyValue::Int(i) => Value::from(*i),
            PropertyValue::Float(f) | PropertyValue::Double(f) => Value::from(*f),
            PropertyValue::DateTime(dt) => Value::from(dt.to_rfc3339()),
            PropertyValue::Text(s) => Value::from(s.clone()),
            PropertyValue::IntArray(items) => Value::from(items.clone()),
            PropertyValue::FloatArray(items) | PropertyValue::DoubleArray(items) => {
                Value::from(items.clone())
            }
            PropertyValue::TextArray(items) => Value::from(items.clone()),
        }
    }

    /// Re-type a JSON value read back from the store. Objects and nulls have
    /// no property-type counterpart and yield `None`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(PropertyValue::Int(i))
                } else {
                    n.as_f64().map(PropertyValue::Double)
                }
            }
            Value::String(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => Some(PropertyValue::DateTime(dt.with_timezone(&Utc))),
                Err(_) => Some(PropertyValue::Text(s.clone())),
            },
            Value::Array(items) => Self::from_json_array(items),
            Value::Null | Value::Object(_) => None,
        }
    }

    fn from_json_array(items: &[Value]) -> Option<Self> {
        if items.is_empty() {
            return Some(PropertyValue::TextArray(vec![]));
        }

        if items.iter().all(|v| v.as_i64().is_some()) {
            let ints = items.iter().filter_map(Value::as_i64).collect();
            return Some(PropertyValue::IntArray(ints));
        }

        if items.iter().all(|v| v.as_f64().is_some()) {
            let numbers = items.iter().filter_map(Value::as_f64).collect();
            return Some(PropertyValue::DoubleArray(numbers));
        }

        if items.iter().all(|v| v.as_str().is_some()) {
            let texts = items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            return Some(PropertyValue::TextArray(texts));
        }

        None
    }
}

impl<'de> Deserialize<'de> for PropertyValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        PropertyValue::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom("unsupported property value"))
    }
}

/// One record in a collection: a business id unique within the collection,
/// typed properties, and the embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    pub id_no: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(id_no: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id_no: id_no.into(),
            properties: BTreeMap::new(),
            embedding,
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Flatten the business id and typed properties into the JSON object
    /// stored by the backend.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        payload.insert(ID_FIELD.to_string(), Value::from(self.id_no.clone()));
        for (name, value) in &self.properties {
            payload.insert(name.clone(), value.to_json());
        }
        payload
    }

    /// Materialize a document from an object read back from the store.
    pub fn from_stored(id_no: impl Into<String>, object: StoredObject) -> Self {
        let id_no = id_no.into();
        let mut properties = BTreeMap::new();
        for (name, value) in &object.properties {
            if name == ID_FIELD {
                continue;
            }
            match PropertyValue::from_json(value) {
                Some(typed) => {
                    properties.insert(name.clone(), typed);
                }
                None => {
                    warn!(%id_no, property = %name, "dropping property with unsupported value type");
                }
            }
        }

        Self {
            id_no,
            properties,
            embedding: object.vector,
        }
    }
}

/// A partial update addressed by business id: property keys are merged into
/// the stored object; a present embedding replaces the stored vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentPatch {
    pub id_no: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

impl DocumentPatch {
    pub fn new(id_no: impl Into<String>) -> Self {
        Self {
            id_no: id_no.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// True when the patch carries nothing beyond the business id.
    pub fn is_noop(&self) -> bool {
        self.properties.is_empty() && self.embedding.is_none()
    }

    /// JSON object of the properties to merge (the business id never moves).
    pub fn properties_payload(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect()
    }
}

/// How an update was applied. A patch carrying only the business id has
/// nothing to change and is reported as such, not as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    Applied,
    NothingToUpdate,
}

/// Per-document outcome of a batch insert.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchItemOutcome {
    pub id_no: String,
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An object as stored by the backend: internal key, raw properties, vector.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub key: Uuid,
    pub properties: Map<String, Value>,
    pub vector: Vec<f32>,
}

/// Raw hit returned by a similarity or hybrid query: the business id plus the
/// backend's score for the hit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id_no: String,
    pub score: f32,
}

/// A materialized query result; never persisted. The score is a vector
/// certainty in [0, 1] or a fused hybrid score depending on the query.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}
