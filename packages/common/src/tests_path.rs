/// Tests for field path parsing and prefix handling
use crate::{CommonError, FieldPath, PathSegment};

#[test]
fn test_parse_indexed_path() {
    let path = FieldPath::parse("people[2].address.city").expect("Failed to parse");

    assert_eq!(path.len(), 3);
    assert_eq!(path.segments()[0], PathSegment::indexed("people", 2));
    assert_eq!(path.segments()[1], PathSegment::new("address"));
    assert_eq!(path.to_string(), "people[2].address.city");
}

#[test]
fn test_malformed_paths_are_rejected() {
    for raw in ["", "people[x].name", "people[{0}].name", "a..b", "people[1", "a b"] {
        match FieldPath::parse(raw) {
            Err(CommonError::MalformedPath { path, .. }) => assert_eq!(path, raw),
            other => panic!("Expected malformed path for {:?}, got {:?}", raw, other),
        }
    }
}

#[test]
fn test_prefix_is_segment_aware() {
    let people = FieldPath::parse("people").unwrap();

    assert!(FieldPath::parse("people.name").unwrap().starts_with(&people));
    assert!(!FieldPath::parse("peopleCount").unwrap().starts_with(&people));
    assert!(!FieldPath::parse("people[0].name").unwrap().starts_with(&people));
}

#[test]
fn test_strip_prefix_returns_remainder() {
    let path = FieldPath::parse("people[1].address.city").unwrap();
    let prefix = FieldPath::parse("people[1]").unwrap();

    let rest = path.strip_prefix(&prefix).expect("Should be a prefix");
    assert_eq!(rest.to_string(), "address.city");
}

#[test]
fn test_row_indices_and_without_indexes() {
    let path = FieldPath::parse("a[1].b.c[3].d").unwrap();

    assert_eq!(path.row_indices(), vec![1, 3]);
    assert_eq!(path.without_indexes().to_string(), "a.b.c.d");
    assert!(path.has_indexes());
    assert!(!path.without_indexes().has_indexes());
}

#[test]
fn test_with_last_index() {
    let path = FieldPath::parse("people[0].addresses").unwrap();
    assert_eq!(path.with_last_index(4).to_string(), "people[0].addresses[4]");
}
