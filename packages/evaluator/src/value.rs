//! Runtime values and the single-step coercion policy.

use crate::{EvalError, EvalResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("numeric pattern is valid"));

/// A value produced or consumed by an expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum ExprValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl ExprValue {
    /// Scalars convert directly; objects and arrays have no expression value
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(b) => ExprValue::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(ExprValue::Null, ExprValue::Number),
            serde_json::Value::String(s) => ExprValue::String(s.clone()),
            _ => ExprValue::Null,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ExprValue::Null => serde_json::Value::Null,
            ExprValue::Bool(b) => serde_json::Value::Bool(*b),
            ExprValue::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            ExprValue::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ExprValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ExprValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            ExprValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExprValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            ExprValue::Null => "null",
            ExprValue::Bool(_) => "boolean",
            ExprValue::Number(_) => "number",
            ExprValue::String(_) => "string",
        }
    }
}

impl fmt::Display for ExprValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprValue::Null => f.write_str("null"),
            ExprValue::Bool(b) => write!(f, "{}", b),
            ExprValue::Number(n) => f.write_str(&format_number(*n)),
            ExprValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ExprValue {
    fn from(value: bool) -> Self {
        ExprValue::Bool(value)
    }
}

impl From<f64> for ExprValue {
    fn from(value: f64) -> Self {
        ExprValue::Number(value)
    }
}

impl From<&str> for ExprValue {
    fn from(value: &str) -> Self {
        ExprValue::String(value.to_string())
    }
}

impl From<String> for ExprValue {
    fn from(value: String) -> Self {
        ExprValue::String(value)
    }
}

/// Declared argument and return types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprVal {
    Boolean,
    String,
    Number,
    Any,
}

impl fmt::Display for ExprVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExprVal::Boolean => "boolean",
            ExprVal::String => "string",
            ExprVal::Number => "number",
            ExprVal::Any => "any",
        };
        f.write_str(name)
    }
}

impl FromStr for ExprVal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(ExprVal::Boolean),
            "string" => Ok(ExprVal::String),
            "number" => Ok(ExprVal::Number),
            "any" => Ok(ExprVal::Any),
            other => Err(format!("Unknown expression type '{}'", other)),
        }
    }
}

/// Canonical decimal form: `15`, `1.5`, `-0.25`
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let sign = if n > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Converts `value` to `target` in at most one step. Null is never coerced.
pub fn coerce(value: ExprValue, target: ExprVal) -> EvalResult<ExprValue> {
    match (target, value) {
        (_, ExprValue::Null) => Ok(ExprValue::Null),
        (ExprVal::Any, value) => Ok(value),

        (ExprVal::Boolean, ExprValue::Bool(b)) => Ok(ExprValue::Bool(b)),
        (ExprVal::Boolean, ExprValue::String(s)) => match s.as_str() {
            "true" => Ok(ExprValue::Bool(true)),
            "false" => Ok(ExprValue::Bool(false)),
            _ => Err(coercion_error(ExprValue::String(s), target)),
        },
        (ExprVal::Boolean, ExprValue::Number(n)) if n == 1.0 => Ok(ExprValue::Bool(true)),
        (ExprVal::Boolean, ExprValue::Number(n)) if n == 0.0 => Ok(ExprValue::Bool(false)),

        (ExprVal::Number, ExprValue::Number(n)) => Ok(ExprValue::Number(n)),
        (ExprVal::Number, ExprValue::String(s)) if NUMERIC.is_match(&s) => s
            .parse::<f64>()
            .map(ExprValue::Number)
            .map_err(|_| coercion_error(ExprValue::String(s.clone()), target)),

        (ExprVal::String, ExprValue::String(s)) => Ok(ExprValue::String(s)),
        (ExprVal::String, other) => Ok(ExprValue::String(other.to_string())),

        (target, other) => Err(coercion_error(other, target)),
    }
}

fn coercion_error(value: ExprValue, expected: ExprVal) -> EvalError {
    EvalError::Coercion {
        value: match &value {
            ExprValue::String(s) => format!("'{}'", s),
            other => other.to_string(),
        },
        found: value.type_name(),
        expected,
    }
}
