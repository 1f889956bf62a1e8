/// Tests for the in-memory JSON data store
use crate::{
    CommonError, DataStore, JsonDataStore, RowRemoval, StructuredReference, ROW_ID_FIELD,
};
use serde_json::json;

fn store() -> JsonDataStore {
    JsonDataStore::new().with_document(
        "model",
        json!({
            "people": [
                { "altinnRowId": "u1", "name": "Ada", "addresses": [{ "city": "Oslo" }] },
                { "altinnRowId": "u2", "name": "Bob", "addresses": [] },
                { "name": "Cy" }
            ],
            "title": "Register"
        }),
    )
}

fn reference(field: &str) -> StructuredReference {
    StructuredReference::new("model", field)
}

#[test]
fn test_get_indexed_value() {
    let store = store();

    assert_eq!(store.get(&reference("people[1].name")).unwrap(), Some(json!("Bob")));
    assert_eq!(store.get(&reference("people[9].name")).unwrap(), None);
    assert_eq!(store.get(&reference("people.name")).unwrap(), None);
}

#[test]
fn test_unknown_document() {
    let store = store();
    let result = store.get(&StructuredReference::new("other", "title"));

    match result {
        Err(CommonError::DocumentNotFound(id)) => assert_eq!(id, "other"),
        other => panic!("Expected DocumentNotFound, got {:?}", other),
    }
}

#[test]
fn test_get_rows_reports_identity() {
    let rows = store().get_rows(&reference("people")).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].identity.as_deref(), Some("u1"));
    assert_eq!(rows[1].identity.as_deref(), Some("u2"));
    assert_eq!(rows[2].identity, None, "Third row has no identity field");
    assert_eq!(rows[2].index, 2);
}

#[test]
fn test_get_rows_of_scalar_is_error() {
    let result = store().get_rows(&reference("title"));
    assert!(matches!(result, Err(CommonError::NotACollection { .. })));
}

#[test]
fn test_set_creates_intermediate_structure() {
    let mut store = JsonDataStore::new();
    store
        .set(&reference("group[2].inner.value"), json!(5))
        .expect("Set should succeed");

    assert_eq!(store.get(&reference("group[2].inner.value")).unwrap(), Some(json!(5)));
    assert_eq!(store.row_count(&reference("group")).unwrap(), 3);
}

#[test]
fn test_append_assigns_row_identity() {
    let mut store = store();
    store
        .append(&reference("people"), json!({ "name": "Dee" }))
        .unwrap();

    let rows = store.get_rows(&reference("people")).unwrap();
    assert_eq!(rows.len(), 4);
    let identity = rows[3].value.get(ROW_ID_FIELD).and_then(|v| v.as_str());
    assert!(identity.is_some(), "Appended row should get an identity");
    assert_eq!(rows[3].identity.as_deref(), identity);
}

#[test]
fn test_remove_with_predicate() {
    let mut store = store();
    store
        .remove(&reference("people"), &|row: &serde_json::Value| row["name"] == json!("Ada"))
        .unwrap();

    let rows = store.get_rows(&reference("people")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].identity.as_deref(), Some("u2"));
}

#[test]
fn test_resolved_keys_expand_rows() {
    let keys = store().resolved_keys(&reference("people.name")).unwrap();
    let fields: Vec<_> = keys.iter().map(|k| k.field_path.as_str()).collect();

    assert_eq!(fields, vec!["people[0].name", "people[1].name", "people[2].name"]);
}

#[test]
fn test_resolved_keys_nested() {
    let keys = store()
        .resolved_keys(&reference("people.addresses.city"))
        .unwrap();
    let fields: Vec<_> = keys.iter().map(|k| k.field_path.as_str()).collect();

    // Bob has no addresses, Cy has no addresses field at all
    assert_eq!(
        fields,
        vec!["people[0].addresses[0].city", "people[2].addresses.city"]
    );
}

#[test]
fn test_remove_field_row_options() {
    let mut deleted = store();
    deleted
        .remove_field(&reference("people[0]"), RowRemoval::DeleteRow)
        .unwrap();
    assert_eq!(deleted.row_count(&reference("people")).unwrap(), 2);

    let mut nulled = store();
    nulled
        .remove_field(&reference("people[0]"), RowRemoval::SetToNull)
        .unwrap();
    assert_eq!(nulled.row_count(&reference("people")).unwrap(), 3);
    assert_eq!(nulled.get(&reference("people[0]")).unwrap(), Some(json!(null)));

    let mut field = store();
    field
        .remove_field(&reference("people[1].name"), RowRemoval::DeleteRow)
        .unwrap();
    assert_eq!(field.get(&reference("people[1].name")).unwrap(), None);
}
