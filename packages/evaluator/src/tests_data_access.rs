/// Tests for context-sensitive data access: dataModel, component and text
use crate::{
    ComponentBinding, ComponentLookup, DataSources, EvalConfig, Evaluator, ExprVal, ExprValue,
    TextResource, TextResources, TextVariable,
};
use formbind_common::{DataStore, JsonDataStore, StructuredReference};
use formbind_location::{push, resolve_indexed_id, DataModelLocation};
use serde_json::json;

fn store() -> JsonDataStore {
    JsonDataStore::new().with_document(
        "model",
        json!({
            "people": [
                { "altinnRowId": "u1", "name": "Ada", "age": 36, "address": { "city": "Oslo" } },
                { "altinnRowId": "u2", "name": "Bob", "age": 17, "address": { "city": "Bergen" } }
            ],
            "title": "Register",
            "nested": { "a": 1 }
        }),
    )
}

fn row(index: usize) -> DataModelLocation {
    push(None, &StructuredReference::new("model", "people"), index).unwrap()
}

fn eval_with(expr: serde_json::Value, sources: &DataSources<'_>) -> ExprValue {
    let config = EvalConfig::new(ExprVal::Any, ExprValue::Null).with_error_as_exception();
    Evaluator::new()
        .evaluate_json(&expr, sources, &config)
        .expect("Evaluation should succeed")
        .value
}

#[test]
fn test_data_model_reads_current_row() {
    let store = store();
    let first = row(0);
    let second = row(1);
    let expr = json!(["dataModel", "people.name"]);

    let base = DataSources::new(&store);
    assert_eq!(
        eval_with(expr.clone(), &base.with_location(Some(&first))),
        ExprValue::from("Ada")
    );
    assert_eq!(
        eval_with(expr, &base.with_location(Some(&second))),
        ExprValue::from("Bob")
    );
}

#[test]
fn test_row_isolation() {
    let mut store = store();
    let first = row(0);
    let second = row(1);
    let expr = json!(["greaterThanEq", ["dataModel", "people.age"], 18]);

    let before = eval_with(expr.clone(), &DataSources::new(&store).with_location(Some(&first)));
    store
        .set(&StructuredReference::new("model", "people[1].age"), json!(99))
        .unwrap();
    let after = eval_with(expr.clone(), &DataSources::new(&store).with_location(Some(&first)));
    let other = eval_with(expr, &DataSources::new(&store).with_location(Some(&second)));

    assert_eq!(before, ExprValue::Bool(true));
    assert_eq!(after, before, "Editing row 1 must not change row 0's result");
    assert_eq!(other, ExprValue::Bool(true));
}

#[test]
fn test_data_model_explicit_document_and_default() {
    let store = store().with_document("extra", json!({ "flag": true }));
    let sources = DataSources::new(&store).with_default_document("model");

    assert_eq!(eval_with(json!(["dataModel", "title"]), &sources), ExprValue::from("Register"));
    assert_eq!(
        eval_with(json!(["dataModel", "flag", "extra"]), &sources),
        ExprValue::Bool(true)
    );
    assert_eq!(eval_with(json!(["dataModel", "missing"]), &sources), ExprValue::Null);
}

#[test]
fn test_data_model_non_scalar_warns() {
    let store = store();
    let sources = DataSources::new(&store).with_default_document("model");
    let config = EvalConfig::new(ExprVal::Any, ExprValue::Null);

    let result = Evaluator::new()
        .evaluate_json(&json!(["dataModel", "nested"]), &sources, &config)
        .unwrap();

    assert_eq!(result.value, ExprValue::Null);
    assert_eq!(result.diagnostics.len(), 1);
    assert!(!result.has_errors(), "A non-scalar read is only a warning");
}

/// Resolves ids the way a materialized tree would: `name-<row>` inside rows
struct PeopleComponents;

impl ComponentLookup for PeopleComponents {
    fn find_binding(
        &self,
        id: &str,
        location: Option<&DataModelLocation>,
    ) -> Option<ComponentBinding> {
        match id {
            "name" => {
                let indexed = resolve_indexed_id(location, "name");
                let row = indexed.strip_prefix("name-")?.parse::<usize>().ok()?;
                Some(ComponentBinding {
                    reference: Some(StructuredReference::new(
                        "model",
                        format!("people[{}].name", row),
                    )),
                    hidden: false,
                })
            }
            "secret" => Some(ComponentBinding {
                reference: Some(StructuredReference::new("model", "title")),
                hidden: true,
            }),
            _ => None,
        }
    }
}

#[test]
fn test_component_lookup_uses_location() {
    let store = store();
    let components = PeopleComponents;
    let second = row(1);
    let sources = DataSources::new(&store)
        .with_components(&components)
        .with_location(Some(&second));

    assert_eq!(eval_with(json!(["component", "name"]), &sources), ExprValue::from("Bob"));
    assert_eq!(
        eval_with(json!(["component", "secret"]), &sources),
        ExprValue::Null,
        "Hidden components read as null"
    );
}

#[test]
fn test_text_with_row_variables() {
    let store = store();
    let texts = TextResources::new(
        vec![
            TextResource {
                id: "greeting".to_string(),
                value: "Hello {0} from {1}".to_string(),
                variables: vec![
                    TextVariable {
                        key: "people[{0}].name".to_string(),
                        data_source: "dataModel.default".to_string(),
                        default_value: None,
                    },
                    TextVariable {
                        key: "people.address.city".to_string(),
                        data_source: "dataModel.model".to_string(),
                        default_value: None,
                    },
                ],
            },
            TextResource {
                id: "alias".to_string(),
                value: "greeting".to_string(),
                variables: vec![],
            },
        ],
        &store,
    )
    .with_default_document("model");

    let second = row(1);
    let sources = DataSources::new(&store)
        .with_translator(&texts)
        .with_location(Some(&second));

    assert_eq!(
        eval_with(json!(["text", "greeting"]), &sources),
        ExprValue::from("Hello Bob from Bergen")
    );
    assert_eq!(
        eval_with(json!(["text", "alias"]), &sources),
        ExprValue::from("Hello Bob from Bergen"),
        "Texts pointing at other keys are followed"
    );
    assert_eq!(eval_with(json!(["text", "unknown.key"]), &sources), ExprValue::from("unknown.key"));
}

#[test]
fn test_text_variable_falls_back_to_default_then_key() {
    let store = store();
    let texts = TextResources::new(
        vec![TextResource {
            id: "missing".to_string(),
            value: "[{0}] [{1}]".to_string(),
            variables: vec![
                TextVariable {
                    key: "nothing.here".to_string(),
                    data_source: "dataModel.model".to_string(),
                    default_value: Some("fallback".to_string()),
                },
                TextVariable {
                    key: "nothing.there".to_string(),
                    data_source: "dataModel.model".to_string(),
                    default_value: None,
                },
            ],
        }],
        &store,
    );
    let sources = DataSources::new(&store).with_translator(&texts);

    assert_eq!(
        eval_with(json!(["text", "missing"]), &sources),
        ExprValue::from("[fallback] [nothing.there]")
    );
}
