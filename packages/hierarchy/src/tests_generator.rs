/// Tests for the memoizing generator and its per-group state machine
use crate::{ComponentRegistry, GroupKey, GroupState, HierarchyError, HierarchyGenerator, Layout};
use formbind_common::{DataStore, JsonDataStore, StructuredReference};
use serde_json::json;

fn layout() -> Layout {
    Layout::from_json(
        json!([
            {
                "id": "people",
                "type": "RepeatingGroup",
                "dataModelBindings": { "group": "people" },
                "children": ["name", "pets"]
            },
            { "id": "name", "type": "Input", "dataModelBindings": { "simpleBinding": "people.name" } },
            {
                "id": "pets",
                "type": "RepeatingGroup",
                "dataModelBindings": { "group": "people.pets" },
                "children": ["petName"]
            },
            { "id": "petName", "type": "Input", "dataModelBindings": { "simpleBinding": "people.pets.name" } }
        ]),
        "model",
        &ComponentRegistry::standard(),
    )
    .unwrap()
}

fn store() -> JsonDataStore {
    JsonDataStore::new().with_document(
        "model",
        json!({
            "people": [
                { "altinnRowId": "ada", "name": "Ada", "pets": [{ "altinnRowId": "cat", "name": "Tom" }] },
                { "altinnRowId": "bob", "name": "Bob", "pets": [] }
            ]
        }),
    )
}

fn people_key() -> GroupKey {
    GroupKey::new("people", "model::people")
}

#[test]
fn test_unchanged_rows_are_reused() {
    let layout = layout();
    let store = store();
    let mut generator = HierarchyGenerator::new();

    let first = generator.generate(&layout, &store).unwrap();
    let rebuilds = generator.rebuilds();
    assert_eq!(rebuilds, 3, "people plus one pets group per person");
    assert_eq!(generator.state_of(&people_key()), Some(GroupState::Materialized));

    let second = generator.generate(&layout, &store).unwrap();
    assert_eq!(generator.rebuilds(), rebuilds, "Nothing changed, nothing is rebuilt");
    assert_eq!(first.top_level(), second.top_level());
}

#[test]
fn test_value_edits_do_not_rebuild() {
    let layout = layout();
    let mut store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout, &store).unwrap();
    let rebuilds = generator.rebuilds();

    store
        .set(&StructuredReference::new("model", "people[0].name"), json!("Ada L."))
        .unwrap();
    generator.generate(&layout, &store).unwrap();

    assert_eq!(generator.rebuilds(), rebuilds);
}

#[test]
fn test_new_row_rebuilds_only_the_changed_group() {
    let layout = layout();
    let mut store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout, &store).unwrap();
    let rebuilds = generator.rebuilds();

    store
        .append(&StructuredReference::new("model", "people[1].pets"), json!({ "name": "Rex" }))
        .unwrap();
    let tree = generator.generate(&layout, &store).unwrap();

    assert_eq!(generator.rebuilds(), rebuilds + 1);
    assert!(tree.get("petName-1-0").is_some());
    assert_eq!(
        generator.state_of(&GroupKey::new("pets-1", "model::people[1].pets")),
        Some(GroupState::Materialized)
    );
}

#[test]
fn test_row_identities_survive_reorder() {
    let layout = layout();
    let mut store = store();
    let mut generator = HierarchyGenerator::new();
    let before = generator.generate(&layout, &store).unwrap();

    let people = store
        .document("model")
        .and_then(|doc| doc.get("people"))
        .cloned()
        .unwrap();
    let reversed: Vec<_> = people.as_array().unwrap().iter().rev().cloned().collect();
    store
        .set(&StructuredReference::new("model", "people"), json!(reversed))
        .unwrap();
    let after = generator.generate(&layout, &store).unwrap();

    let uuids = |tree: &crate::LayoutTree| -> Vec<String> {
        tree.top_level()[0].rows().iter().map(|row| row.uuid.clone()).collect()
    };
    assert_eq!(uuids(&before), vec!["ada", "bob"]);
    assert_eq!(uuids(&after), vec!["bob", "ada"]);
    assert_eq!(
        after.get("petName-1-0").and_then(|info| info.simple_binding.clone()),
        Some(StructuredReference::new("model", "people[1].pets[0].name")),
        "Ada's pet moved with Ada"
    );
}

#[test]
fn test_removed_groups_are_pruned() {
    let layout = layout();
    let mut store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout, &store).unwrap();
    let pets_of_bob = GroupKey::new("pets-1", "model::people[1].pets");
    assert!(generator.state_of(&pets_of_bob).is_some());

    store
        .remove(
            &StructuredReference::new("model", "people"),
            &|row: &serde_json::Value| row["altinnRowId"] == "bob",
        )
        .unwrap();
    generator.generate(&layout, &store).unwrap();

    assert_eq!(generator.state_of(&pets_of_bob), None);
    assert_eq!(generator.group_keys().len(), 2);
}

#[test]
fn test_failed_rebuild_leaves_group_stale() {
    let layout = layout();
    let mut store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout, &store).unwrap();

    store
        .set(&StructuredReference::new("model", "people[1].pets"), json!([{ "name": "no id" }]))
        .unwrap();
    let result = generator.generate(&layout, &store);

    assert!(matches!(result, Err(HierarchyError::MissingRowIdentity { .. })));
    assert_eq!(generator.state_of(&people_key()), Some(GroupState::Materialized));
}

#[test]
fn test_invalidate_forces_rebuild() {
    let layout = layout();
    let store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout, &store).unwrap();
    let rebuilds = generator.rebuilds();

    generator.invalidate();
    assert_eq!(generator.state_of(&people_key()), Some(GroupState::Stale));

    generator.generate(&layout, &store).unwrap();
    assert_eq!(generator.rebuilds(), rebuilds * 2);
}

#[test]
fn test_switching_layouts_rebuilds_reused_group_ids() {
    let store = store();
    let mut generator = HierarchyGenerator::new();
    generator.generate(&layout(), &store).unwrap();

    let ages_only = Layout::from_json(
        json!([
            {
                "id": "people",
                "type": "RepeatingGroup",
                "dataModelBindings": { "group": "people" },
                "children": ["age"]
            },
            { "id": "age", "type": "Input", "dataModelBindings": { "simpleBinding": "people.age" } }
        ]),
        "model",
        &ComponentRegistry::standard(),
    )
    .unwrap();
    let tree = generator.generate(&ages_only, &store).unwrap();
    let fresh = HierarchyGenerator::new().generate(&ages_only, &store).unwrap();

    let ids: Vec<_> = tree.ids().collect();
    assert_eq!(ids, vec!["people", "age-0", "age-1"]);
    assert_eq!(ids, fresh.ids().collect::<Vec<_>>());
    assert_eq!(generator.state_of(&people_key()), Some(GroupState::Materialized));
}
