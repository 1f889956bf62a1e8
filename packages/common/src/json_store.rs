//! In-memory `DataStore` over `serde_json` documents.

use crate::{
    CommonError, CommonResult, DataStore, FieldPath, PathSegment, RowEntry, RowRemoval,
    StructuredReference, ROW_ID_FIELD,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

/// Documents keyed by document id (data type)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JsonDataStore {
    documents: BTreeMap<String, Value>,
}

impl JsonDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a `{ "<documentId>": { ... } }` map
    pub fn from_json(value: Value) -> CommonResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn with_document(mut self, document_id: impl Into<String>, value: Value) -> Self {
        self.insert_document(document_id, value);
        self
    }

    pub fn insert_document(&mut self, document_id: impl Into<String>, value: Value) {
        self.documents.insert(document_id.into(), value);
    }

    pub fn document(&self, document_id: &str) -> Option<&Value> {
        self.documents.get(document_id)
    }

    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    fn root(&self, document_id: &str) -> CommonResult<&Value> {
        self.documents
            .get(document_id)
            .ok_or_else(|| CommonError::DocumentNotFound(document_id.to_string()))
    }

    /// Expands every unindexed collection segment (except the last) into one
    /// reference per existing row, e.g. `people.name` gives `people[0].name`,
    /// `people[1].name`.
    pub fn resolved_keys(
        &self,
        reference: &StructuredReference,
    ) -> CommonResult<Vec<StructuredReference>> {
        let path = reference.path()?;
        let root = self.root(&reference.document_id)?;

        let mut expanded = Vec::new();
        expand_keys(Some(root), path.segments(), Vec::new(), &mut expanded);

        Ok(expanded
            .into_iter()
            .map(|segments| {
                StructuredReference::from_path(
                    reference.document_id.clone(),
                    &FieldPath::from_segments(segments),
                )
            })
            .collect())
    }

    pub fn row_count(&self, reference: &StructuredReference) -> CommonResult<usize> {
        Ok(self.get_rows(reference)?.len())
    }

    /// Removes the field at `reference`. When the last segment addresses a row
    /// (`people[2]`), `removal` decides whether the row is deleted or nulled.
    pub fn remove_field(
        &mut self,
        reference: &StructuredReference,
        removal: RowRemoval,
    ) -> CommonResult<()> {
        let path = reference.path()?;
        let Some((last, parent)) = path.segments().split_last() else {
            return Ok(());
        };
        let Some(root) = self.documents.get_mut(&reference.document_id) else {
            return Ok(());
        };

        let parent_value = if parent.is_empty() {
            Some(root)
        } else {
            lookup_mut(root, parent)
        };
        let Some(Value::Object(map)) = parent_value else {
            return Ok(());
        };

        match last.index {
            None => {
                map.remove(&last.name);
            }
            Some(index) => {
                let Some(Value::Array(items)) = map.get_mut(&last.name) else {
                    return Ok(());
                };
                if index < items.len() {
                    match removal {
                        RowRemoval::DeleteRow => {
                            items.remove(index);
                        }
                        RowRemoval::SetToNull => items[index] = Value::Null,
                        RowRemoval::Ignore => {}
                    }
                }
            }
        }

        Ok(())
    }
}

impl DataStore for JsonDataStore {
    fn get(&self, reference: &StructuredReference) -> CommonResult<Option<Value>> {
        let path = reference.path()?;
        let root = self.root(&reference.document_id)?;
        Ok(lookup(root, path.segments()).cloned())
    }

    fn get_rows(&self, reference: &StructuredReference) -> CommonResult<Vec<RowEntry>> {
        let path = reference.path()?;
        let root = self.root(&reference.document_id)?;

        match lookup(root, path.segments()) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items
                .iter()
                .enumerate()
                .map(|(index, value)| RowEntry {
                    index,
                    identity: value
                        .get(ROW_ID_FIELD)
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    value: value.clone(),
                })
                .collect()),
            Some(_) => Err(CommonError::NotACollection {
                path: reference.field_path.clone(),
            }),
        }
    }

    fn set(&mut self, reference: &StructuredReference, value: Value) -> CommonResult<()> {
        let path = reference.path()?;
        let root = self
            .documents
            .entry(reference.document_id.clone())
            .or_insert(Value::Null);
        let slot = ensure_path(root, &path)?;
        *slot = value;
        Ok(())
    }

    fn append(&mut self, reference: &StructuredReference, value: Value) -> CommonResult<()> {
        let path = reference.path()?;
        let root = self
            .documents
            .entry(reference.document_id.clone())
            .or_insert(Value::Null);
        let slot = ensure_path(root, &path)?;
        if slot.is_null() {
            *slot = Value::Array(Vec::new());
        }

        match slot {
            Value::Array(items) => {
                items.push(with_row_identity(value));
                debug!(reference = %reference, rows = items.len(), "appended row");
                Ok(())
            }
            _ => Err(CommonError::NotACollection {
                path: reference.field_path.clone(),
            }),
        }
    }

    fn remove(
        &mut self,
        reference: &StructuredReference,
        predicate: &dyn Fn(&Value) -> bool,
    ) -> CommonResult<()> {
        let path = reference.path()?;
        let Some(root) = self.documents.get_mut(&reference.document_id) else {
            return Err(CommonError::DocumentNotFound(reference.document_id.clone()));
        };

        match lookup_mut(root, path.segments()) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::Array(items)) => {
                items.retain(|item| !predicate(item));
                Ok(())
            }
            Some(_) => Err(CommonError::NotACollection {
                path: reference.field_path.clone(),
            }),
        }
    }

    fn has_document(&self, document_id: &str) -> bool {
        self.documents.contains_key(document_id)
    }
}

fn with_row_identity(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if !map.contains_key(ROW_ID_FIELD) {
                map.insert(
                    ROW_ID_FIELD.to_string(),
                    Value::String(Uuid::new_v4().to_string()),
                );
            }
            Value::Object(map)
        }
        other => other,
    }
}

fn lookup<'a>(root: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object()?.get(&segment.name)?;
        if let Some(index) = segment.index {
            current = current.as_array()?.get(index)?;
        }
    }
    Some(current)
}

fn lookup_mut<'a>(root: &'a mut Value, segments: &[PathSegment]) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(&segment.name)?;
        if let Some(index) = segment.index {
            current = current.as_array_mut()?.get_mut(index)?;
        }
    }
    Some(current)
}

/// Walks to the slot for `path`, creating objects and padding arrays on the way
fn ensure_path<'a>(root: &'a mut Value, path: &FieldPath) -> CommonResult<&'a mut Value> {
    let mut current = root;

    for (position, segment) in path.segments().iter().enumerate() {
        if current.is_null() {
            *current = Value::Object(Map::new());
        }
        let object = match current {
            Value::Object(map) => map,
            other => {
                return Err(CommonError::TypeMismatch {
                    path: prefix_of(path, position),
                    found: kind_of(other).to_string(),
                })
            }
        };
        current = object.entry(segment.name.clone()).or_insert(Value::Null);

        if let Some(index) = segment.index {
            if current.is_null() {
                *current = Value::Array(Vec::new());
            }
            let items = match current {
                Value::Array(items) => items,
                _ => {
                    return Err(CommonError::NotACollection {
                        path: prefix_of(path, position + 1),
                    })
                }
            };
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            current = &mut items[index];
        }
    }

    Ok(current)
}

fn prefix_of(path: &FieldPath, len: usize) -> String {
    FieldPath::from_segments(path.segments()[..len].to_vec()).to_string()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expand_keys(
    current: Option<&Value>,
    remaining: &[PathSegment],
    done: Vec<PathSegment>,
    out: &mut Vec<Vec<PathSegment>>,
) {
    let Some((segment, rest)) = remaining.split_first() else {
        out.push(done);
        return;
    };
    let child = current
        .and_then(Value::as_object)
        .and_then(|map| map.get(&segment.name));

    match (segment.index, child) {
        (None, Some(Value::Array(items))) if !rest.is_empty() => {
            for (index, item) in items.iter().enumerate() {
                let mut next = done.clone();
                next.push(PathSegment::indexed(segment.name.clone(), index));
                expand_keys(Some(item), rest, next, out);
            }
        }
        (Some(index), child) => {
            let mut next = done;
            next.push(segment.clone());
            let item = child.and_then(Value::as_array).and_then(|items| items.get(index));
            expand_keys(item, rest, next, out);
        }
        (None, child) => {
            let mut next = done;
            next.push(segment.clone());
            expand_keys(child, rest, next, out);
        }
    }
}
