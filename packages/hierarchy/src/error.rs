use formbind_common::{CommonError, ROW_ID_FIELD};
use thiserror::Error;

pub type HierarchyResult<T> = Result<T, HierarchyError>;

/// Structural errors. None of these are recoverable: a tree built from
/// inconsistent configuration or data would index rows incorrectly.
#[derive(Error, Debug)]
pub enum HierarchyError {
    #[error("Row {index} of '{reference}' has no '{}' row identity", ROW_ID_FIELD)]
    MissingRowIdentity { reference: String, index: usize },

    #[error("Component '{0}' is referenced but not defined")]
    UnknownComponent(String),

    #[error("Component id '{0}' is defined more than once")]
    DuplicateId(String),

    #[error("Component '{child}' is claimed by both '{first}' and '{second}'")]
    ChildClaimedTwice {
        child: String,
        first: String,
        second: String,
    },

    #[error("Unknown component type '{component_type}' on '{id}'")]
    UnknownComponentType { id: String, component_type: String },

    #[error("Repeating group '{0}' has no group binding")]
    MissingGroupBinding(String),

    #[error("Component '{0}' is part of a cycle")]
    Cycle(String),

    #[error("Layout error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] CommonError),
}
