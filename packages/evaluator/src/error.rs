use crate::ExprVal;
use formbind_common::CommonError;
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

/// Everything that can go wrong while evaluating an expression.
///
/// Evaluation errors are recoverable: the caller's default value is used and a
/// diagnostic is recorded. Configuration errors (`DepthExceeded`,
/// `Configuration`) always propagate.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Expected {expected} argument(s) for '{function}', got {received}")]
    WrongArity {
        function: String,
        expected: String,
        received: usize,
    },

    #[error("Expected {expected}, got {value} ({found})")]
    Coercion {
        value: String,
        found: &'static str,
        expected: ExprVal,
    },

    #[error("Function '{0}' does not exist")]
    UnknownFunction(String),

    #[error("{0}")]
    Lookup(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid argument to '{function}': {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Expression nesting exceeds the maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },

    #[error("Configuration error: {0}")]
    Configuration(#[from] CommonError),
}

impl EvalError {
    /// Fatal errors cross the evaluator boundary regardless of configuration
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EvalError::DepthExceeded { .. } | EvalError::Configuration(_)
        )
    }

    /// Maps data store failures: an unknown document is a lookup miss, anything
    /// else means the bindings themselves are broken.
    pub(crate) fn from_store(error: CommonError) -> Self {
        match error {
            CommonError::DocumentNotFound(_) => EvalError::Lookup(error.to_string()),
            other => EvalError::Configuration(other),
        }
    }
}
