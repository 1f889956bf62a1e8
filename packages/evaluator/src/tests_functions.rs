/// Tests for individual expression functions
use crate::{
    DataSources, EvalConfig, Evaluator, ExprFunction, ExprVal, ExprValue, InstanceContext,
};
use formbind_common::JsonDataStore;
use serde_json::json;
use std::collections::BTreeMap;

fn eval_with(expr: serde_json::Value, sources: &DataSources<'_>) -> ExprValue {
    let config = EvalConfig::new(ExprVal::Any, ExprValue::Null).with_error_as_exception();
    Evaluator::new()
        .evaluate_json(&expr, sources, &config)
        .expect("Evaluation should succeed")
        .value
}

fn eval(expr: serde_json::Value) -> ExprValue {
    let store = JsonDataStore::new();
    eval_with(expr, &DataSources::new(&store))
}

#[test]
fn test_every_function_name_round_trips() {
    for function in ExprFunction::ALL {
        assert_eq!(ExprFunction::from_name(function.name()), Some(*function));
    }
    assert_eq!(ExprFunction::from_name("Equals"), None, "Names are case-sensitive");
}

#[test]
fn test_comparisons() {
    assert_eq!(eval(json!(["greaterThan", 3, 2])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["greaterThanEq", 2, "2"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["lessThan", "10", 9])), ExprValue::Bool(false));
    assert_eq!(eval(json!(["lessThanEq", 1, 1.5])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["lessThan", null, 5])), ExprValue::Bool(false));
}

#[test]
fn test_arithmetic() {
    assert_eq!(eval(json!(["subtract", 10, 4, 1])), ExprValue::Number(5.0));
    assert_eq!(eval(json!(["multiply", 2.5, 4])), ExprValue::Number(10.0));
    assert_eq!(eval(json!(["divide", 9, 2])), ExprValue::Number(4.5));
    assert_eq!(eval(json!(["add", 1, null])), ExprValue::Null);
}

#[test]
fn test_logic() {
    assert_eq!(eval(json!(["and", true, "true", 1])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["and", true, false])), ExprValue::Bool(false));
    assert_eq!(eval(json!(["or", false, null, true])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["not", false])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["not", null])), ExprValue::Bool(true));
}

#[test]
fn test_if_branches() {
    assert_eq!(eval(json!(["if", true, "yes"])), ExprValue::from("yes"));
    assert_eq!(eval(json!(["if", false, "yes"])), ExprValue::Null);
    assert_eq!(
        eval(json!(["if", ["equals", 1, 2], "yes", "else", "no"])),
        ExprValue::from("no")
    );
}

#[test]
fn test_string_predicates() {
    assert_eq!(eval(json!(["contains", "hello world", "o w"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["notContains", "hello", "x"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["notContains", null, "x"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["contains", null, "x"])), ExprValue::Bool(false));
    assert_eq!(eval(json!(["startsWith", "prefix-rest", "prefix"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["endsWith", 12345, 45])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["commaContains", "a, b ,c", "b"])), ExprValue::Bool(true));
    assert_eq!(eval(json!(["commaContains", "a,b", "ab"])), ExprValue::Bool(false));
}

#[test]
fn test_string_length_and_case() {
    assert_eq!(eval(json!(["stringLength", "æøå"])), ExprValue::Number(3.0));
    assert_eq!(eval(json!(["stringLength", null])), ExprValue::Number(0.0));
    assert_eq!(eval(json!(["lowerCase", null])), ExprValue::Null);
    assert_eq!(eval(json!(["concat"])), ExprValue::from(""));
    assert_eq!(eval(json!(["concat", "a", null, "b"])), ExprValue::from("ab"));
}

#[test]
fn test_round() {
    assert_eq!(eval(json!(["round", 2.5])), ExprValue::from("3"));
    assert_eq!(eval(json!(["round", 1.239, 2])), ExprValue::from("1.24"));
    assert_eq!(eval(json!(["round", "4", 1])), ExprValue::from("4.0"));
    assert_eq!(eval(json!(["round", null])), ExprValue::from("0"));
}

#[test]
fn test_language_and_settings() {
    let store = JsonDataStore::new();
    let mut settings = BTreeMap::new();
    settings.insert("homeUrl".to_string(), ExprValue::from("https://example.org"));
    let context = InstanceContext {
        instance_id: Some("512345/abc".to_string()),
        ..Default::default()
    };

    let sources = DataSources::new(&store)
        .with_language("en")
        .with_application_settings(&settings)
        .with_instance_context(&context);

    assert_eq!(eval_with(json!(["language"]), &sources), ExprValue::from("en"));
    assert_eq!(
        eval_with(json!(["frontendSettings", "homeUrl"]), &sources),
        ExprValue::from("https://example.org")
    );
    assert_eq!(eval_with(json!(["frontendSettings", "missing"]), &sources), ExprValue::Null);
    assert_eq!(
        eval_with(json!(["instanceContext", "instanceId"]), &sources),
        ExprValue::from("512345/abc")
    );
    assert_eq!(eval_with(json!(["instanceContext", "appId"]), &sources), ExprValue::Null);
    assert_eq!(eval(json!(["language"])), ExprValue::from("nb"));
}

#[test]
fn test_arguments() {
    let store = JsonDataStore::new();
    let positional = vec![ExprValue::from("first"), ExprValue::Number(2.0)];
    let mut values = BTreeMap::new();
    values.insert("value".to_string(), ExprValue::from("current"));
    values.insert("other".to_string(), ExprValue::Bool(true));

    let sources = DataSources::new(&store)
        .with_positional_arguments(&positional)
        .with_value_arguments(&values);

    assert_eq!(eval_with(json!(["argv", 1]), &sources), ExprValue::Number(2.0));
    assert_eq!(eval_with(json!(["value"]), &sources), ExprValue::from("current"));
    assert_eq!(eval_with(json!(["value", "other"]), &sources), ExprValue::Bool(true));
}
