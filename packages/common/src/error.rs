use thiserror::Error;

/// Errors raised while addressing the nested data document
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Malformed field path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    #[error("Field '{path}' is not a collection")]
    NotACollection { path: String },

    #[error("Field '{path}' cannot hold children (found {found})")]
    TypeMismatch { path: String, found: String },

    #[error("Data model with type {0} not found")]
    DocumentNotFound(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CommonError {
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        CommonError::MalformedPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
