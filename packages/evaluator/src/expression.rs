use crate::{EvalError, EvalResult, ExprFunction, ExprValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// An expression tree decoded from its `[functionName, ...args]` JSON form
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(ExprValue),
    Call {
        function: ExprFunction,
        args: Vec<Expression>,
    },
    /// Kept until evaluated so that unknown names in untaken branches are harmless
    UnknownCall { name: String, args: Vec<Expression> },
}

impl Expression {
    pub fn parse(value: &Value) -> EvalResult<Self> {
        match value {
            Value::Array(items) => {
                let Some((head, rest)) = items.split_first() else {
                    return Err(EvalError::InvalidExpression(
                        "empty array is not an expression".to_string(),
                    ));
                };
                let Value::String(name) = head else {
                    return Err(EvalError::InvalidExpression(format!(
                        "expected a function name, found {}",
                        head
                    )));
                };

                let args = rest
                    .iter()
                    .map(Expression::parse)
                    .collect::<EvalResult<Vec<_>>>()?;

                Ok(match ExprFunction::from_name(name) {
                    Some(function) => Expression::Call { function, args },
                    None => Expression::UnknownCall {
                        name: name.clone(),
                        args,
                    },
                })
            }
            Value::Object(_) => Err(EvalError::InvalidExpression(
                "objects are not valid expressions".to_string(),
            )),
            scalar => Ok(Expression::Literal(ExprValue::from_json(scalar))),
        }
    }

    /// True for values shaped like a function call rather than a literal
    pub fn is_call(value: &Value) -> bool {
        matches!(value.as_array().and_then(|items| items.first()), Some(Value::String(_)))
    }

    pub fn call(function: ExprFunction, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    pub fn literal(value: impl Into<ExprValue>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn to_json(&self) -> Value {
        match self {
            Expression::Literal(value) => value.to_json(),
            Expression::Call { function, args } => call_json(function.name(), args),
            Expression::UnknownCall { name, args } => call_json(name, args),
        }
    }
}

fn call_json(name: &str, args: &[Expression]) -> Value {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::String(name.to_string()));
    items.extend(args.iter().map(Expression::to_json));
    Value::Array(items)
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Expression::parse(&value).map_err(serde::de::Error::custom)
    }
}
