use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Document '{id_no}' already exists in collection '{collection}'")]
    Duplicate { collection: String, id_no: String },

    #[error("Document '{id_no}' not found in collection '{collection}'")]
    NotFound { collection: String, id_no: String },

    #[error("Embedding dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl From<reqwest::Error> for DocumentError {
    fn from(err: reqwest::Error) -> Self {
        DocumentError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for DocumentError {
    fn from(err: serde_json::Error) -> Self {
        DocumentError::Backend(format!("JSON error: {}", err))
    }
}

impl DocumentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DocumentError::Schema(_) | DocumentError::DimensionMismatch(_) => {
                StatusCode::BAD_REQUEST
            }
            DocumentError::Duplicate { .. } => StatusCode::CONFLICT,
            DocumentError::NotFound { .. } => StatusCode::NOT_FOUND,
            DocumentError::Embedding(_) | DocumentError::Config(_) | DocumentError::Backend(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Structured JSON error body for the HTTP surface
impl IntoResponse for DocumentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
