//! # Expression Evaluator
//!
//! Evaluates `[functionName, ...args]` expression trees against explicitly
//! supplied data sources.
//!
//! ## Determinism Contract
//!
//! **INVARIANT: Evaluation is fully deterministic.**
//!
//! For any expression and `DataSources` state, `evaluate()` produces the same
//! value and the same diagnostics on every invocation. The evaluator holds
//! only its immutable options: there are no caches and no hidden state, and
//! callers own any memoization.
//!
//! ## Context Sensitivity
//!
//! `dataModel` and `component` resolve their keys through the location in
//! the data sources. The same expression evaluated with two different row
//! locations reads two different rows.
//!
//! ## Recursion Protection
//!
//! Nesting depth is bounded by `EvaluatorOptions::max_depth`. Exceeding it is
//! fatal.
//!
//! ## Error Recovery Boundaries
//!
//! **Recoverable** (evaluation errors): wrong arity, failed coercion, unknown
//! function, failed lookup. The configured default value is returned together
//! with a diagnostic, unless `error_as_exception` is set.
//!
//! **NOT recoverable** (configuration errors): depth exceeded, malformed field
//! path. These always propagate; the component tree is inconsistent.
//!
//! ## Evaluation Order
//!
//! Arguments are evaluated left to right before the function runs. Only `if`
//! skips work: the untaken branch is never evaluated.

use crate::{
    coerce, format_number, Diagnostic, EvalError, EvalResult, ExprFunction, ExprVal, ExprValue,
    Expression, DataSources,
};
use formbind_common::StructuredReference;
use formbind_location::anchor;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Default ceiling for expression nesting
pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluatorOptions {
    pub max_depth: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Per-call evaluation settings
#[derive(Debug, Clone, PartialEq)]
pub struct EvalConfig {
    pub returns: ExprVal,
    pub default_value: ExprValue,
    pub error_as_exception: bool,
}

impl EvalConfig {
    pub fn new(returns: ExprVal, default_value: impl Into<ExprValue>) -> Self {
        Self {
            returns,
            default_value: default_value.into(),
            error_as_exception: false,
        }
    }

    pub fn with_error_as_exception(mut self) -> Self {
        self.error_as_exception = true;
        self
    }
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: ExprValue,
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.level == crate::DiagnosticLevel::Error)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    options: EvaluatorOptions,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    #[instrument(skip_all, fields(returns = %config.returns, location = ?sources.location.map(|l| l.to_string())))]
    pub fn evaluate(
        &self,
        expr: &Expression,
        sources: &DataSources<'_>,
        config: &EvalConfig,
    ) -> EvalResult<Evaluation> {
        let mut run = Run {
            sources,
            max_depth: self.options.max_depth,
            diagnostics: Vec::new(),
        };
        let mut path = Vec::new();
        let outcome = run
            .eval(expr, 1, &mut path)
            .and_then(|value| coerce(value, config.returns).map_err(Failure::at_root));

        self.finish(outcome, run.diagnostics, config)
    }

    /// Parses and evaluates a raw JSON expression. A malformed expression is
    /// an evaluation error like any other.
    pub fn evaluate_json(
        &self,
        expr: &Value,
        sources: &DataSources<'_>,
        config: &EvalConfig,
    ) -> EvalResult<Evaluation> {
        match Expression::parse(expr) {
            Ok(expr) => self.evaluate(&expr, sources, config),
            Err(error) => self.finish(Err(Failure::at_root(error)), Vec::new(), config),
        }
    }

    fn finish(
        &self,
        outcome: Result<ExprValue, Failure>,
        mut diagnostics: Vec<Diagnostic>,
        config: &EvalConfig,
    ) -> EvalResult<Evaluation> {
        match outcome {
            Ok(value) => Ok(Evaluation { value, diagnostics }),
            Err(failure) if failure.error.is_fatal() || config.error_as_exception => {
                debug!(error = %failure.error, path = %failure.path, "evaluation aborted");
                Err(failure.error)
            }
            Err(failure) => {
                warn!(
                    error = %failure.error,
                    path = %failure.path,
                    "expression failed, using default value"
                );
                let mut diagnostic = Diagnostic::error(failure.error.to_string(), failure.path);
                if let Some(function) = failure.function {
                    diagnostic = diagnostic.with_function(function);
                }
                diagnostics.push(diagnostic);
                Ok(Evaluation {
                    value: config.default_value.clone(),
                    diagnostics,
                })
            }
        }
    }
}

/// An error together with where in the expression it happened
struct Failure {
    error: EvalError,
    path: String,
    function: Option<String>,
}

impl Failure {
    fn at_root(error: EvalError) -> Self {
        Self {
            error,
            path: String::new(),
            function: None,
        }
    }
}

fn format_path(path: &[usize]) -> String {
    path.iter().map(|position| format!("[{}]", position)).collect()
}

/// State of a single evaluation
struct Run<'s, 'a> {
    sources: &'s DataSources<'a>,
    max_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Run<'_, '_> {
    fn fail(&self, error: EvalError, path: &[usize], function: Option<&str>) -> Failure {
        Failure {
            error,
            path: format_path(path),
            function: function.map(str::to_string),
        }
    }

    fn warn(&mut self, function: ExprFunction, message: String, path: &[usize]) {
        warn!(function = function.name(), "{}", message);
        self.diagnostics
            .push(Diagnostic::warning(message, format_path(path)).with_function(function.name()));
    }

    fn eval(
        &mut self,
        expr: &Expression,
        depth: usize,
        path: &mut Vec<usize>,
    ) -> Result<ExprValue, Failure> {
        if depth > self.max_depth {
            return Err(self.fail(
                EvalError::DepthExceeded {
                    max_depth: self.max_depth,
                },
                path,
                None,
            ));
        }

        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::UnknownCall { name, .. } => {
                Err(self.fail(EvalError::UnknownFunction(name.clone()), path, Some(name)))
            }
            Expression::Call { function, args } => self.call(*function, args, depth, path),
        }
    }

    fn call(
        &mut self,
        function: ExprFunction,
        args: &[Expression],
        depth: usize,
        path: &mut Vec<usize>,
    ) -> Result<ExprValue, Failure> {
        let def = function.definition();
        def.check_arity(function, args.len())
            .map_err(|e| self.fail(e, path, Some(function.name())))?;

        if function == ExprFunction::If {
            return self.eval_if(args, depth, path);
        }

        let mut values = Vec::with_capacity(args.len());
        for (position, arg) in args.iter().enumerate() {
            path.push(position + 1);
            let value = self
                .eval(arg, depth + 1, path)
                .and_then(|value| {
                    coerce(value, def.arg_type(position))
                        .map_err(|e| self.fail(e, path, Some(function.name())))
                });
            path.pop();
            values.push(value?);
        }

        self.apply(function, &values, path)
            .map_err(|e| self.fail(e, path, Some(function.name())))
    }

    /// `["if", cond, then]` or `["if", cond, then, "else", otherwise]`
    fn eval_if(
        &mut self,
        args: &[Expression],
        depth: usize,
        path: &mut Vec<usize>,
    ) -> Result<ExprValue, Failure> {
        let function = ExprFunction::If.name();
        match args.len() {
            2 => {}
            4 => {
                if args[2] != Expression::literal("else") {
                    return Err(self.fail(
                        EvalError::InvalidArgument {
                            function: function.to_string(),
                            message: "expected \"else\" as the third argument".to_string(),
                        },
                        path,
                        Some(function),
                    ));
                }
            }
            received => {
                return Err(self.fail(
                    EvalError::WrongArity {
                        function: function.to_string(),
                        expected: "2 or 4".to_string(),
                        received,
                    },
                    path,
                    Some(function),
                ))
            }
        }

        path.push(1);
        let condition = self.eval(&args[0], depth + 1, path).and_then(|value| {
            coerce(value, ExprVal::Boolean).map_err(|e| self.fail(e, path, Some(function)))
        });
        path.pop();
        let condition = condition?.as_bool().unwrap_or(false);

        let branch = match (condition, args.len()) {
            (true, _) => 1,
            (false, 4) => 3,
            (false, _) => return Ok(ExprValue::Null),
        };

        path.push(branch + 1);
        let value = self.eval(&args[branch], depth + 1, path);
        path.pop();
        value
    }

    fn apply(
        &mut self,
        function: ExprFunction,
        args: &[ExprValue],
        path: &[usize],
    ) -> EvalResult<ExprValue> {
        use ExprFunction as F;

        let value = match function {
            F::Value => {
                let key = args.first().and_then(ExprValue::as_str).unwrap_or("value");
                self.sources
                    .value_arguments
                    .and_then(|values| values.get(key))
                    .cloned()
                    .ok_or_else(|| {
                        EvalError::Lookup(format!("No value argument named '{}'", key))
                    })?
            }
            F::Argv => {
                let index = non_negative_integer(function, &args[0])?;
                self.sources
                    .positional_arguments
                    .get(index)
                    .cloned()
                    .ok_or_else(|| {
                        EvalError::Lookup(format!("No positional argument at index {}", index))
                    })?
            }
            F::Equals => ExprValue::Bool(loose_equals(&args[0], &args[1])),
            F::NotEquals => ExprValue::Bool(!loose_equals(&args[0], &args[1])),
            F::Not => ExprValue::Bool(!args[0].as_bool().unwrap_or(false)),
            F::GreaterThan => compare(args, |a, b| a > b),
            F::GreaterThanEq => compare(args, |a, b| a >= b),
            F::LessThan => compare(args, |a, b| a < b),
            F::LessThanEq => compare(args, |a, b| a <= b),
            F::Add => arithmetic(args, |a, b| Ok(a + b))?,
            F::Subtract => arithmetic(args, |a, b| Ok(a - b))?,
            F::Multiply => arithmetic(args, |a, b| Ok(a * b))?,
            F::Divide => arithmetic(args, |a, b| {
                if b == 0.0 {
                    Err(EvalError::InvalidArgument {
                        function: function.name().to_string(),
                        message: "division by zero".to_string(),
                    })
                } else {
                    Ok(a / b)
                }
            })?,
            F::Concat => ExprValue::String(
                args.iter()
                    .map(|value| value.as_str().unwrap_or_default())
                    .collect(),
            ),
            F::And => ExprValue::Bool(args.iter().all(|v| v.as_bool().unwrap_or(false))),
            F::Or => ExprValue::Bool(args.iter().any(|v| v.as_bool().unwrap_or(false))),
            F::If => {
                return Err(EvalError::InvalidExpression(
                    "'if' is only evaluated through its branches".to_string(),
                ))
            }
            F::InstanceContext => {
                let key = args[0].as_str().unwrap_or_default();
                let context = self.sources.instance_context.cloned().unwrap_or_default();
                match context.get(key) {
                    Some(value) => value.map_or(ExprValue::Null, ExprValue::from),
                    None => {
                        return Err(EvalError::InvalidArgument {
                            function: function.name().to_string(),
                            message: format!("unknown instance context key '{}'", key),
                        })
                    }
                }
            }
            F::FrontendSettings => {
                let key = args[0].as_str().unwrap_or_default();
                self.sources
                    .application_settings
                    .and_then(|settings| settings.get(key))
                    .cloned()
                    .unwrap_or(ExprValue::Null)
            }
            F::Component => self.component(&args[0])?,
            F::DataModel => self.data_model(function, args, path)?,
            F::Round => round(function, args)?,
            F::Text => {
                let key = args[0].as_str().unwrap_or_default();
                match self.sources.translator {
                    Some(translator) => {
                        ExprValue::String(translator.translate(key, self.sources.location))
                    }
                    None => {
                        self.warn(function, format!("no translator available for '{}'", key), path);
                        ExprValue::String(key.to_string())
                    }
                }
            }
            F::Language => ExprValue::String(self.sources.language.unwrap_or("nb").to_string()),
            F::Contains => both_strings(args, false, |a, b| a.contains(b)),
            F::NotContains => both_strings(args, true, |a, b| !a.contains(b)),
            F::StartsWith => both_strings(args, false, |a, b| a.starts_with(b)),
            F::EndsWith => both_strings(args, false, |a, b| a.ends_with(b)),
            F::CommaContains => both_strings(args, false, |list, item| {
                list.split(',').map(str::trim).any(|part| part == item)
            }),
            F::StringLength => ExprValue::Number(
                args[0].as_str().map_or(0, |s| s.chars().count()) as f64,
            ),
            F::LowerCase => map_string(&args[0], str::to_lowercase),
            F::UpperCase => map_string(&args[0], str::to_uppercase),
        };

        Ok(value)
    }

    fn component(&self, id: &ExprValue) -> EvalResult<ExprValue> {
        let id = id.as_str().unwrap_or_default();
        let components = self.sources.components.ok_or_else(|| {
            EvalError::Lookup(format!("Unable to find component '{}': no components available", id))
        })?;
        let binding = components
            .find_binding(id, self.sources.location)
            .ok_or_else(|| EvalError::Lookup(format!("Unable to find component with id '{}'", id)))?;

        if binding.hidden {
            return Ok(ExprValue::Null);
        }
        match binding.reference {
            Some(reference) => self.read(&reference),
            None => Ok(ExprValue::Null),
        }
    }

    fn data_model(
        &mut self,
        function: ExprFunction,
        args: &[ExprValue],
        path: &[usize],
    ) -> EvalResult<ExprValue> {
        let field = args[0].as_str().unwrap_or_default();
        let document = args
            .get(1)
            .and_then(ExprValue::as_str)
            .or_else(|| self.sources.current_document())
            .ok_or_else(|| {
                EvalError::Lookup(format!("No data model available to look up '{}'", field))
            })?;

        if !self.sources.form_data.has_document(document) {
            return Err(EvalError::Lookup(format!(
                "Data model with type {} not found",
                document
            )));
        }

        let reference = StructuredReference::new(document, field);
        let raw = self
            .sources
            .form_data
            .get(&anchor(&reference, self.sources.location)?)
            .map_err(EvalError::from_store)?;

        Ok(match raw {
            Some(value @ (Value::Object(_) | Value::Array(_))) => {
                let kind = if value.is_array() { "a list" } else { "an object" };
                self.warn(function, format!("'{}' points to {}, not a value", field, kind), path);
                ExprValue::Null
            }
            Some(value) => ExprValue::from_json(&value),
            None => ExprValue::Null,
        })
    }

    fn read(&self, reference: &StructuredReference) -> EvalResult<ExprValue> {
        let anchored = anchor(reference, self.sources.location)?;
        let raw = self
            .sources
            .form_data
            .get(&anchored)
            .map_err(EvalError::from_store)?;
        Ok(raw.map_or(ExprValue::Null, |value| ExprValue::from_json(&value)))
    }
}

/// Numeric comparison when both sides are numbers, string comparison otherwise
pub fn loose_equals(a: &ExprValue, b: &ExprValue) -> bool {
    match (a, b) {
        (ExprValue::Null, ExprValue::Null) => true,
        (ExprValue::Null, _) | (_, ExprValue::Null) => false,
        _ => match (
            coerce(a.clone(), ExprVal::Number),
            coerce(b.clone(), ExprVal::Number),
        ) {
            (Ok(ExprValue::Number(x)), Ok(ExprValue::Number(y))) => x == y,
            _ => a.to_string() == b.to_string(),
        },
    }
}

fn compare(args: &[ExprValue], op: impl Fn(f64, f64) -> bool) -> ExprValue {
    match (args[0].as_number(), args[1].as_number()) {
        (Some(a), Some(b)) => ExprValue::Bool(op(a, b)),
        _ => ExprValue::Bool(false),
    }
}

fn arithmetic(
    args: &[ExprValue],
    op: impl Fn(f64, f64) -> EvalResult<f64>,
) -> EvalResult<ExprValue> {
    let mut numbers = Vec::with_capacity(args.len());
    for arg in args {
        match arg.as_number() {
            Some(n) => numbers.push(n),
            None => return Ok(ExprValue::Null),
        }
    }

    let mut iter = numbers.into_iter();
    let Some(first) = iter.next() else {
        return Ok(ExprValue::Null);
    };
    iter.try_fold(first, |acc, n| op(acc, n)).map(ExprValue::Number)
}

fn both_strings(
    args: &[ExprValue],
    when_null: bool,
    op: impl Fn(&str, &str) -> bool,
) -> ExprValue {
    match (args[0].as_str(), args[1].as_str()) {
        (Some(a), Some(b)) => ExprValue::Bool(op(a, b)),
        _ => ExprValue::Bool(when_null),
    }
}

fn map_string(value: &ExprValue, op: impl Fn(&str) -> String) -> ExprValue {
    match value.as_str() {
        Some(s) => ExprValue::String(op(s)),
        None => ExprValue::Null,
    }
}

fn non_negative_integer(function: ExprFunction, value: &ExprValue) -> EvalResult<usize> {
    match value.as_number() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(EvalError::InvalidArgument {
            function: function.name().to_string(),
            message: format!("expected a non-negative integer, got {}", value),
        }),
    }
}

fn round(function: ExprFunction, args: &[ExprValue]) -> EvalResult<ExprValue> {
    let decimals = match args.get(1) {
        Some(ExprValue::Null) | None => 0,
        Some(value) => non_negative_integer(function, value)?,
    };
    if decimals > 100 {
        return Err(EvalError::InvalidArgument {
            function: function.name().to_string(),
            message: format!("cannot round to {} decimals", decimals),
        });
    }

    let number = args[0].as_number().unwrap_or(0.0);
    let factor = 10f64.powi(decimals as i32);
    let rounded = (number * factor).round() / factor;

    if decimals == 0 {
        Ok(ExprValue::String(format_number(rounded)))
    } else {
        Ok(ExprValue::String(format!("{:.*}", decimals, rounded)))
    }
}
