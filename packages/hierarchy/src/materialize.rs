//! Expansion of repeating groups into rows.
//!
//! Every row gets a deep copy of the group's children, rewritten so ids,
//! bindings and placeholders point at that row. Rewriting never touches the
//! prototype it started from, so the same prototype can be expanded any
//! number of times with the same result.

use crate::{ComponentKind, HierarchyError, HierarchyResult, Prototype, SIMPLE_BINDING};
use formbind_common::{DataStore, StructuredReference};
use formbind_location::{anchor, push, DataModelLocation};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// One expanded row of a repeating group
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub uuid: String,
    pub index: usize,
    pub location: DataModelLocation,
    pub items: Vec<Node>,
}

/// A component instance in the materialized tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub base_component_id: Option<String>,
    pub component_type: String,
    pub kind: ComponentKind,
    pub bindings: BTreeMap<String, StructuredReference>,
    pub text_bindings: BTreeMap<String, Value>,
    pub properties: Map<String, Value>,
    pub hidden: bool,
    /// Row this instance lives in, `None` outside any repeating group
    pub location: Option<DataModelLocation>,
    pub children: Vec<Node>,
    /// Expanded rows, only for repeating groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows_before: Vec<Node>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rows_after: Vec<Node>,

    /// Rewritten prototype a repeating group expands its rows from
    #[serde(skip)]
    pub template: Option<Arc<Prototype>>,
}

impl Node {
    pub fn base_id(&self) -> &str {
        self.base_component_id.as_deref().unwrap_or(&self.id)
    }

    pub fn simple_binding(&self) -> Option<&StructuredReference> {
        self.bindings.get(SIMPLE_BINDING)
    }

    pub fn is_repeating(&self) -> bool {
        self.kind == ComponentKind::RepeatingGroup
    }

    pub fn rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or(&[])
    }
}

/// Supplies the rows of nested repeating groups while a tree is built
pub trait Expand {
    fn expand_group(
        &mut self,
        group: &Prototype,
        location: Option<&DataModelLocation>,
    ) -> HierarchyResult<Vec<Row>>;
}

/// Expands every group straight from the data store, without memoization
pub struct StoreExpander<'a> {
    store: &'a dyn DataStore,
}

impl<'a> StoreExpander<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }
}

impl Expand for StoreExpander<'_> {
    fn expand_group(
        &mut self,
        group: &Prototype,
        location: Option<&DataModelLocation>,
    ) -> HierarchyResult<Vec<Row>> {
        let binding = group_reference(group, location)?;
        let uuids = read_row_uuids(self.store, &binding)?;
        materialize(group, &uuids, location, self)
    }
}

/// Builds `prototype`'s rows for the given row identities, nested groups included.
#[instrument(skip_all, fields(group = %prototype.id, rows = row_uuids.len()))]
pub fn materialize(
    prototype: &Prototype,
    row_uuids: &[String],
    parent: Option<&DataModelLocation>,
    expander: &mut dyn Expand,
) -> HierarchyResult<Vec<Row>> {
    let mut rows = materialize_rows(prototype, row_uuids, parent)?;
    for row in &mut rows {
        expand_nodes(&mut row.items, expander)?;
    }
    Ok(rows)
}

/// Builds rows with nested groups left unexpanded
pub(crate) fn materialize_rows(
    prototype: &Prototype,
    row_uuids: &[String],
    parent: Option<&DataModelLocation>,
) -> HierarchyResult<Vec<Row>> {
    let group = prototype
        .group_binding()
        .ok_or_else(|| HierarchyError::MissingGroupBinding(prototype.id.clone()))?;
    let depth = parent.map_or(0, DataModelLocation::depth);

    row_uuids
        .iter()
        .enumerate()
        .map(|(index, uuid)| -> HierarchyResult<Row> {
            let location = push(parent, group, index)?;
            let rewrite = RowRewrite::new(group, depth, index);
            let items = prototype
                .children
                .iter()
                .map(|child| build_node(&rewrite.apply(child), Some(&location)))
                .collect();

            Ok(Row {
                uuid: uuid.clone(),
                index,
                location,
                items,
            })
        })
        .collect()
}

/// Turns a prototype into an unexpanded node at `location`
pub fn build_node(prototype: &Prototype, location: Option<&DataModelLocation>) -> Node {
    let build_all = |prototypes: &[Prototype]| -> Vec<Node> {
        prototypes
            .iter()
            .map(|prototype| build_node(prototype, location))
            .collect()
    };

    let repeating = prototype.is_repeating();
    Node {
        id: prototype.id.clone(),
        base_component_id: prototype.base_component_id.clone(),
        component_type: prototype.component_type.clone(),
        kind: prototype.kind,
        bindings: prototype.bindings.clone(),
        text_bindings: prototype.text_bindings.clone(),
        properties: prototype.properties.clone(),
        hidden: prototype.hidden,
        location: location.cloned(),
        children: if repeating {
            Vec::new()
        } else {
            build_all(&prototype.children)
        },
        rows: None,
        rows_before: build_all(&prototype.rows_before),
        rows_after: build_all(&prototype.rows_after),
        template: repeating.then(|| Arc::new(prototype.clone())),
    }
}

/// Fills in the rows of every repeating group among `nodes` and their descendants
pub fn expand_nodes(nodes: &mut [Node], expander: &mut dyn Expand) -> HierarchyResult<()> {
    for node in nodes {
        if let Some(template) = node.template.clone() {
            node.rows = Some(expander.expand_group(&template, node.location.as_ref())?);
        }
        expand_nodes(&mut node.children, expander)?;
        expand_nodes(&mut node.rows_before, expander)?;
        expand_nodes(&mut node.rows_after, expander)?;
    }
    Ok(())
}

/// Row identities of the collection at `reference`, in storage order
pub fn read_row_uuids(
    store: &dyn DataStore,
    reference: &StructuredReference,
) -> HierarchyResult<Vec<String>> {
    store
        .get_rows(reference)?
        .into_iter()
        .map(|row| {
            row.identity.ok_or_else(|| HierarchyError::MissingRowIdentity {
                reference: reference.to_string(),
                index: row.index,
            })
        })
        .collect()
}

/// Absolute collection reference of a group placed at `location`
pub(crate) fn group_reference(
    group: &Prototype,
    location: Option<&DataModelLocation>,
) -> HierarchyResult<StructuredReference> {
    let binding = group
        .group_binding()
        .ok_or_else(|| HierarchyError::MissingGroupBinding(group.id.clone()))?;
    Ok(anchor(binding, location)?)
}

/// The rewrite applied to every component copied into one row
struct RowRewrite<'a> {
    group: &'a StructuredReference,
    group_segments: Vec<&'a str>,
    placeholder: String,
    index: usize,
}

impl<'a> RowRewrite<'a> {
    fn new(group: &'a StructuredReference, depth: usize, index: usize) -> Self {
        Self {
            group,
            group_segments: group.field_path.split('.').collect(),
            placeholder: format!("[{{{}}}]", depth),
            index,
        }
    }

    fn apply(&self, prototype: &Prototype) -> Prototype {
        let rewrite_all = |prototypes: &[Prototype]| -> Vec<Prototype> {
            prototypes.iter().map(|child| self.apply(child)).collect()
        };

        Prototype {
            id: format!("{}-{}", prototype.id, self.index),
            base_component_id: Some(prototype.base_id().to_string()),
            component_type: prototype.component_type.clone(),
            kind: prototype.kind,
            bindings: prototype
                .bindings
                .iter()
                .map(|(key, binding)| (key.clone(), self.binding(binding)))
                .collect(),
            text_bindings: prototype
                .text_bindings
                .iter()
                .map(|(key, value)| (key.clone(), self.value(value)))
                .collect(),
            properties: prototype
                .properties
                .iter()
                .map(|(key, value)| (key.clone(), self.value(value)))
                .collect(),
            hidden: prototype.hidden,
            children: rewrite_all(&prototype.children),
            rows_before: rewrite_all(&prototype.rows_before),
            rows_after: rewrite_all(&prototype.rows_after),
        }
    }

    fn binding(&self, binding: &StructuredReference) -> StructuredReference {
        let field = self.placeholders(&binding.field_path);
        if binding.document_id != self.group.document_id {
            return binding.with_field(field);
        }

        let mut segments: Vec<String> = field.split('.').map(str::to_string).collect();
        let prefixed = segments.len() > self.group_segments.len()
            && segments
                .iter()
                .zip(&self.group_segments)
                .all(|(ours, group)| ours == group);
        if prefixed {
            let last = self.group_segments.len() - 1;
            segments[last] = format!("{}[{}]", segments[last], self.index);
        }

        binding.with_field(segments.join("."))
    }

    fn placeholders(&self, text: &str) -> String {
        text.replace(&self.placeholder, &format!("[{}]", self.index))
    }

    fn value(&self, value: &Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.placeholders(text)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.value(item)).collect()),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.value(item)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}
