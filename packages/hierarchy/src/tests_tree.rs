/// Tests for the layout tree index and closest-instance lookup
use crate::{ComponentRegistry, HierarchyError, HierarchyGenerator, Layout, LayoutTree};
use formbind_common::{JsonDataStore, StructuredReference};
use formbind_evaluator::{ComponentLookup, DataSources, EvalConfig, Evaluator, ExprVal, ExprValue};
use formbind_location::push;
use serde_json::json;

fn tree(store: &JsonDataStore) -> LayoutTree {
    let layout = Layout::from_json(
        json!([
            { "id": "title", "type": "Input", "dataModelBindings": { "simpleBinding": "title" } },
            {
                "id": "people",
                "type": "RepeatingGroup",
                "dataModelBindings": { "group": "people" },
                "children": ["name", "secret"]
            },
            { "id": "name", "type": "Input", "dataModelBindings": { "simpleBinding": "people.name" } },
            { "id": "secret", "type": "Input", "dataModelBindings": { "simpleBinding": "people.secret" } },
            {
                "id": "hiddenPanel",
                "type": "Group",
                "hidden": true,
                "children": ["inner"]
            },
            { "id": "inner", "type": "Paragraph" }
        ]),
        "model",
        &ComponentRegistry::standard(),
    )
    .unwrap();
    HierarchyGenerator::new().generate(&layout, store).unwrap()
}

fn store() -> JsonDataStore {
    JsonDataStore::new().with_document(
        "model",
        json!({
            "title": "Family",
            "people": [
                { "altinnRowId": "a", "name": "Ada" },
                { "altinnRowId": "b", "name": "Bob" }
            ]
        }),
    )
}

#[test]
fn test_index_and_order() {
    let store = store();
    let tree = tree(&store);

    let ids: Vec<_> = tree.ids().collect();
    assert_eq!(
        ids,
        vec!["title", "people", "name-0", "secret-0", "name-1", "secret-1", "hiddenPanel", "inner"]
    );
    assert_eq!(tree.len(), 8);
    assert_eq!(tree.get("name-1").unwrap().parent.as_deref(), Some("people"));

    let names: Vec<_> = tree.all_by_base_id("name").iter().map(|info| info.id.as_str()).collect();
    assert_eq!(names, vec!["name-0", "name-1"]);
}

#[test]
fn test_hidden_is_inherited() {
    let store = store();
    let tree = tree(&store);

    assert!(tree.is_hidden("hiddenPanel"));
    assert!(tree.is_hidden("inner"));
    assert!(!tree.is_hidden("title"));
    assert!(!tree.is_hidden("nope"));
}

#[test]
fn test_closest_instance_follows_location() {
    let store = store();
    let tree = tree(&store);
    let second = push(None, &StructuredReference::new("model", "people"), 1).unwrap();

    let binding = tree.find_binding("name", Some(&second)).unwrap();
    assert_eq!(
        binding.reference,
        Some(StructuredReference::new("model", "people[1].name"))
    );

    let outside = tree.find_binding("title", Some(&second)).unwrap();
    assert_eq!(outside.reference, Some(StructuredReference::new("model", "title")));

    assert!(
        tree.find_binding("name", None).is_none(),
        "Without a location there is no single closest row"
    );
}

#[test]
fn test_component_function_reads_through_tree() {
    let store = store();
    let tree = tree(&store);
    let first = push(None, &StructuredReference::new("model", "people"), 0).unwrap();
    let sources = DataSources::new(&store)
        .with_components(&tree)
        .with_location(Some(&first));
    let config = EvalConfig::new(ExprVal::String, ExprValue::Null).with_error_as_exception();

    let value = Evaluator::new()
        .evaluate_json(&json!(["component", "name"]), &sources, &config)
        .unwrap()
        .value;
    assert_eq!(value, ExprValue::from("Ada"));
}

#[test]
fn test_colliding_instance_ids_are_rejected() {
    let layout = Layout::from_json(
        json!([
            { "id": "a-1", "type": "Input" },
            {
                "id": "people",
                "type": "RepeatingGroup",
                "dataModelBindings": { "group": "people" },
                "children": ["a"]
            },
            { "id": "a", "type": "Input", "dataModelBindings": { "simpleBinding": "people.name" } }
        ]),
        "model",
        &ComponentRegistry::standard(),
    )
    .unwrap();

    let result = HierarchyGenerator::new().generate(&layout, &store());
    assert!(matches!(result, Err(HierarchyError::DuplicateId(id)) if id == "a-1"));
}
