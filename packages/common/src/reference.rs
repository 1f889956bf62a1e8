use crate::{CommonResult, FieldPath};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the field that carries a row's stable identity
pub const ROW_ID_FIELD: &str = "altinnRowId";

/// A field inside one data document, e.g. `{ dataType: "model", field: "people[2].name" }`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructuredReference {
    #[serde(rename = "dataType")]
    pub document_id: String,
    #[serde(rename = "field")]
    pub field_path: String,
}

impl StructuredReference {
    pub fn new(document_id: impl Into<String>, field_path: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            field_path: field_path.into(),
        }
    }

    pub fn from_path(document_id: impl Into<String>, path: &FieldPath) -> Self {
        Self::new(document_id, path.to_string())
    }

    pub fn path(&self) -> CommonResult<FieldPath> {
        FieldPath::parse(&self.field_path)
    }

    pub fn with_field(&self, field_path: impl Into<String>) -> Self {
        Self::new(self.document_id.clone(), field_path)
    }
}

impl fmt::Display for StructuredReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.document_id, self.field_path)
    }
}
