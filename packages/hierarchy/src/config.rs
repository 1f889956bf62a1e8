//! Layout configuration as it arrives from layout files.

use crate::HierarchyResult;
use formbind_common::StructuredReference;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A binding is either a bare field path in the default document or a full reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BindingConfig {
    Path(String),
    Reference(StructuredReference),
}

impl BindingConfig {
    pub fn resolve(&self, default_document: &str) -> StructuredReference {
        match self {
            BindingConfig::Path(path) => StructuredReference::new(default_document, path.clone()),
            BindingConfig::Reference(reference) => reference.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentConfig {
    pub id: String,

    #[serde(rename = "type")]
    pub component_type: String,

    #[serde(default)]
    pub data_model_bindings: BTreeMap<String, BindingConfig>,

    #[serde(default)]
    pub text_resource_bindings: BTreeMap<String, Value>,

    #[serde(default)]
    pub children: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,

    /// `true`/`false`, or an expression left for callers to evaluate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Value>,

    /// Static components shown before the repeated rows
    #[serde(default)]
    pub rows_before: Vec<String>,

    /// Static components shown after the repeated rows
    #[serde(default)]
    pub rows_after: Vec<String>,

    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl ComponentConfig {
    /// Every id this component places below itself
    pub fn referenced_ids(&self) -> impl Iterator<Item = &String> {
        self.children
            .iter()
            .chain(&self.rows_before)
            .chain(&self.rows_after)
    }
}

/// Reads either a bare component array or a `{ "data": { "layout": [...] } }` page
pub fn parse_layout(value: Value) -> HierarchyResult<Vec<ComponentConfig>> {
    let components = match value {
        Value::Object(mut page) => page
            .remove("data")
            .and_then(|data| match data {
                Value::Object(mut data) => data.remove("layout"),
                _ => None,
            })
            .unwrap_or(Value::Array(Vec::new())),
        other => other,
    };
    Ok(serde_json::from_value(components)?)
}
