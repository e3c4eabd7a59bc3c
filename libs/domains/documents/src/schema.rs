//! Logical field types and their translation to the backing store's
//! native property types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{DocumentError, DocumentResult};

/// The schema field carrying the business id of every document.
pub const ID_FIELD: &str = "id_no";

/// Logical property types a collection schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum FieldType {
    Int,
    Float,
    Double,
    Text,
    Bool,
    DateTime,
    IntArray,
    FloatArray,
    DoubleArray,
    TextArray,
}

impl FieldType {
    /// Parse a string type tag as accepted at the API boundary.
    pub fn from_tag(tag: &str) -> DocumentResult<Self> {
        match tag {
            "int" => Ok(FieldType::Int),
            "float" => Ok(FieldType::Float),
            "double" => Ok(FieldType::Double),
            "str" => Ok(FieldType::Text),
            "bool" => Ok(FieldType::Bool),
            "datetime" => Ok(FieldType::DateTime),
            "list[int]" => Ok(FieldType::IntArray),
            "list[float]" => Ok(FieldType::FloatArray),
            "list[double]" => Ok(FieldType::DoubleArray),
            "list[str]" => Ok(FieldType::TextArray),
            other => Err(DocumentError::Schema(format!(
                "unknown field type tag '{}'",
                other
            ))),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Text => "str",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::IntArray => "list[int]",
            FieldType::FloatArray => "list[float]",
            FieldType::DoubleArray => "list[double]",
            FieldType::TextArray => "list[str]",
        }
    }

    /// The backing store's native data type for this logical type.
    /// `float` and `double` share the store's single number type.
    pub fn data_type(&self) -> &'static str {
        match self {
            FieldType::Int => "int",
            FieldType::Float | FieldType::Double => "number",
            FieldType::Text => "text",
            FieldType::Bool => "boolean",
            FieldType::DateTime => "date",
            FieldType::IntArray => "int[]",
            FieldType::FloatArray | FieldType::DoubleArray => "number[]",
            FieldType::TextArray => "text[]",
        }
    }
}

/// Declared property schema of a collection: field name to logical type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionSchema {
    pub fields: BTreeMap<String, FieldType>,
}

impl CollectionSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.insert(name.into(), field_type);
        self
    }

    /// Build a schema from string type tags. One unknown tag fails the whole
    /// translation; no partial schema is produced.
    pub fn from_tags<'a, I>(tags: I) -> DocumentResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut fields = BTreeMap::new();
        for (name, tag) in tags {
            fields.insert(name.to_string(), FieldType::from_tag(tag)?);
        }
        Ok(Self { fields })
    }

    /// Translate into the backing store's class definition.
    ///
    /// The schema must declare a text `id_no` field; exact-match identity
    /// filters address documents through it. Server-side vectorization stays
    /// disabled: vectors are supplied explicitly per document.
    pub fn to_class_definition(&self, class: &str) -> DocumentResult<ClassDefinition> {
        match self.fields.get(ID_FIELD) {
            None => {
                return Err(DocumentError::Schema(format!(
                    "schema must declare an '{}' field",
                    ID_FIELD
                )));
            }
            Some(FieldType::Text) => {}
            Some(other) => {
                return Err(DocumentError::Schema(format!(
                    "'{}' must be declared as 'str', got '{}'",
                    ID_FIELD,
                    other.tag()
                )));
            }
        }

        let properties = self
            .fields
            .iter()
            .map(|(name, field_type)| ClassProperty {
                name: name.clone(),
                data_type: vec![field_type.data_type().to_string()],
            })
            .collect();

        Ok(ClassDefinition {
            class: class.to_string(),
            vectorizer: "none".to_string(),
            properties,
        })
    }
}

/// A translated collection definition ready for provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDefinition {
    pub class: String,
    pub vectorizer: String,
    pub properties: Vec<ClassProperty>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassProperty {
    pub name: String,
    #[serde(rename = "dataType")]
    pub data_type: Vec<String>,
}
