//! The closed set of expression functions and their signatures.

use crate::{EvalError, EvalResult, ExprVal};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature of an expression function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncDef {
    pub args: &'static [ExprVal],
    /// Defaults to `args.len()`
    pub min_arguments: Option<usize>,
    pub returns: ExprVal,
    /// Every argument from the last declared position onward takes that
    /// position's type, and any count is accepted.
    pub last_arg_spreads: bool,
}

impl FuncDef {
    fn new(args: &'static [ExprVal], returns: ExprVal) -> Self {
        Self {
            args,
            min_arguments: None,
            returns,
            last_arg_spreads: false,
        }
    }

    fn min(mut self, min_arguments: usize) -> Self {
        self.min_arguments = Some(min_arguments);
        self
    }

    fn spreads(mut self) -> Self {
        self.last_arg_spreads = true;
        self
    }

    pub fn min_args(&self) -> usize {
        self.min_arguments.unwrap_or(self.args.len())
    }

    /// `None` when the last argument spreads
    pub fn max_args(&self) -> Option<usize> {
        if self.last_arg_spreads {
            None
        } else {
            Some(self.args.len())
        }
    }

    pub fn arg_type(&self, position: usize) -> ExprVal {
        match self.args.get(position) {
            Some(ty) => *ty,
            None if self.last_arg_spreads => self.args.last().copied().unwrap_or(ExprVal::Any),
            None => ExprVal::Any,
        }
    }

    pub fn check_arity(&self, function: ExprFunction, received: usize) -> EvalResult<()> {
        let min = self.min_args();
        let fits = received >= min && self.max_args().map_or(true, |max| received <= max);
        if fits {
            return Ok(());
        }

        let expected = match self.max_args() {
            None => format!("{}+", min),
            Some(max) if max == min => min.to_string(),
            Some(max) => format!("{}-{}", min, max),
        };
        Err(EvalError::WrongArity {
            function: function.name().to_string(),
            expected,
            received,
        })
    }
}

use ExprVal::{Any, Boolean, Number, String as Str};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExprFunction {
    Value,
    Argv,
    Equals,
    NotEquals,
    Not,
    GreaterThan,
    GreaterThanEq,
    LessThan,
    LessThanEq,
    Add,
    Subtract,
    Multiply,
    Divide,
    Concat,
    And,
    Or,
    If,
    InstanceContext,
    FrontendSettings,
    Component,
    DataModel,
    Round,
    Text,
    Language,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    StringLength,
    CommaContains,
    LowerCase,
    UpperCase,
}

impl ExprFunction {
    pub const ALL: &'static [ExprFunction] = &[
        ExprFunction::Value,
        ExprFunction::Argv,
        ExprFunction::Equals,
        ExprFunction::NotEquals,
        ExprFunction::Not,
        ExprFunction::GreaterThan,
        ExprFunction::GreaterThanEq,
        ExprFunction::LessThan,
        ExprFunction::LessThanEq,
        ExprFunction::Add,
        ExprFunction::Subtract,
        ExprFunction::Multiply,
        ExprFunction::Divide,
        ExprFunction::Concat,
        ExprFunction::And,
        ExprFunction::Or,
        ExprFunction::If,
        ExprFunction::InstanceContext,
        ExprFunction::FrontendSettings,
        ExprFunction::Component,
        ExprFunction::DataModel,
        ExprFunction::Round,
        ExprFunction::Text,
        ExprFunction::Language,
        ExprFunction::Contains,
        ExprFunction::NotContains,
        ExprFunction::StartsWith,
        ExprFunction::EndsWith,
        ExprFunction::StringLength,
        ExprFunction::CommaContains,
        ExprFunction::LowerCase,
        ExprFunction::UpperCase,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExprFunction::Value => "value",
            ExprFunction::Argv => "argv",
            ExprFunction::Equals => "equals",
            ExprFunction::NotEquals => "notEquals",
            ExprFunction::Not => "not",
            ExprFunction::GreaterThan => "greaterThan",
            ExprFunction::GreaterThanEq => "greaterThanEq",
            ExprFunction::LessThan => "lessThan",
            ExprFunction::LessThanEq => "lessThanEq",
            ExprFunction::Add => "add",
            ExprFunction::Subtract => "subtract",
            ExprFunction::Multiply => "multiply",
            ExprFunction::Divide => "divide",
            ExprFunction::Concat => "concat",
            ExprFunction::And => "and",
            ExprFunction::Or => "or",
            ExprFunction::If => "if",
            ExprFunction::InstanceContext => "instanceContext",
            ExprFunction::FrontendSettings => "frontendSettings",
            ExprFunction::Component => "component",
            ExprFunction::DataModel => "dataModel",
            ExprFunction::Round => "round",
            ExprFunction::Text => "text",
            ExprFunction::Language => "language",
            ExprFunction::Contains => "contains",
            ExprFunction::NotContains => "notContains",
            ExprFunction::StartsWith => "startsWith",
            ExprFunction::EndsWith => "endsWith",
            ExprFunction::StringLength => "stringLength",
            ExprFunction::CommaContains => "commaContains",
            ExprFunction::LowerCase => "lowerCase",
            ExprFunction::UpperCase => "upperCase",
        }
    }

    /// Case-sensitive lookup by function name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|function| function.name() == name)
    }

    pub fn definition(self) -> FuncDef {
        match self {
            ExprFunction::Value => FuncDef::new(&[Str], Any).min(0),
            ExprFunction::Argv => FuncDef::new(&[Number], Any),
            ExprFunction::Equals | ExprFunction::NotEquals => FuncDef::new(&[Any, Any], Boolean),
            ExprFunction::Not => FuncDef::new(&[Boolean], Boolean),
            ExprFunction::GreaterThan
            | ExprFunction::GreaterThanEq
            | ExprFunction::LessThan
            | ExprFunction::LessThanEq => FuncDef::new(&[Number, Number], Boolean),
            ExprFunction::Add
            | ExprFunction::Subtract
            | ExprFunction::Multiply
            | ExprFunction::Divide => FuncDef::new(&[Number, Number], Number).spreads(),
            ExprFunction::Concat => FuncDef::new(&[Str], Str).min(0).spreads(),
            ExprFunction::And | ExprFunction::Or => FuncDef::new(&[Boolean], Boolean).spreads(),
            ExprFunction::If => FuncDef::new(&[Boolean, Any, Str, Any], Any).min(2),
            ExprFunction::InstanceContext => FuncDef::new(&[Str], Str),
            ExprFunction::FrontendSettings => FuncDef::new(&[Str], Any),
            ExprFunction::Component => FuncDef::new(&[Str], Any),
            ExprFunction::DataModel => FuncDef::new(&[Str, Str], Any).min(1),
            ExprFunction::Round => FuncDef::new(&[Number, Number], Str).min(1),
            ExprFunction::Text => FuncDef::new(&[Str], Str),
            ExprFunction::Language => FuncDef::new(&[], Str),
            ExprFunction::Contains
            | ExprFunction::NotContains
            | ExprFunction::StartsWith
            | ExprFunction::EndsWith
            | ExprFunction::CommaContains => FuncDef::new(&[Str, Str], Boolean),
            ExprFunction::StringLength => FuncDef::new(&[Str], Number),
            ExprFunction::LowerCase | ExprFunction::UpperCase => FuncDef::new(&[Str], Str),
        }
    }
}

impl fmt::Display for ExprFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
