//! Text resources with variables, the reference `Translator`.

use crate::{ExprValue, InstanceContext, Translator};
use formbind_common::{DataStore, StructuredReference};
use formbind_location::{anchor, DataModelLocation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Texts that point to other texts are followed at most this many times
const MAX_TEXT_DEPTH: usize = 8;

static INDEX_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\{\d+\}\]").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextVariable {
    pub key: String,
    /// `dataModel.<documentId>`, `dataModel.default`, `instanceContext` or `applicationSettings`
    pub data_source: String,
    #[serde(default)]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResource {
    pub id: String,
    pub value: String,
    #[serde(default)]
    pub variables: Vec<TextVariable>,
}

/// On-disk shape of a text resource file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResourceFile {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub resources: Vec<TextResource>,
}

pub struct TextResources<'a> {
    resources: BTreeMap<String, TextResource>,
    store: &'a dyn DataStore,
    default_document: Option<&'a str>,
    instance_context: Option<&'a InstanceContext>,
    application_settings: Option<&'a BTreeMap<String, ExprValue>>,
}

impl<'a> TextResources<'a> {
    pub fn new(resources: Vec<TextResource>, store: &'a dyn DataStore) -> Self {
        Self {
            resources: resources
                .into_iter()
                .map(|resource| (resource.id.clone(), resource))
                .collect(),
            store,
            default_document: None,
            instance_context: None,
            application_settings: None,
        }
    }

    pub fn with_default_document(mut self, document_id: &'a str) -> Self {
        self.default_document = Some(document_id);
        self
    }

    pub fn with_instance_context(mut self, context: &'a InstanceContext) -> Self {
        self.instance_context = Some(context);
        self
    }

    pub fn with_application_settings(
        mut self,
        settings: &'a BTreeMap<String, ExprValue>,
    ) -> Self {
        self.application_settings = Some(settings);
        self
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    fn lookup(&self, key: &str, location: Option<&DataModelLocation>, depth: usize) -> String {
        let Some(resource) = self.resources.get(key) else {
            return key.to_string();
        };
        let text = self.replace_variables(resource, location);

        if text == key || depth >= MAX_TEXT_DEPTH || !self.resources.contains_key(&text) {
            return text;
        }
        self.lookup(&text, location, depth + 1)
    }

    fn replace_variables(&self, resource: &TextResource, location: Option<&DataModelLocation>) -> String {
        let mut out = resource.value.clone();

        for (idx, variable) in resource.variables.iter().enumerate() {
            let value = self
                .variable_value(variable, location)
                .or_else(|| variable.default_value.clone())
                .unwrap_or_else(|| variable.key.clone());
            out = out.replace(&format!("{{{}}}", idx), &value);
        }

        out
    }

    fn variable_value(
        &self,
        variable: &TextVariable,
        location: Option<&DataModelLocation>,
    ) -> Option<String> {
        if let Some(model) = variable.data_source.strip_prefix("dataModel") {
            let name = model.trim_start_matches('.');
            let document = if name == "default" || name.is_empty() {
                self.default_document?
            } else {
                name
            };
            let field = INDEX_PLACEHOLDER.replace_all(&variable.key, "");
            let reference = StructuredReference::new(document, field.into_owned());

            return match anchor(&reference, location).and_then(|r| self.store.get(&r)) {
                Ok(Some(value)) => match ExprValue::from_json(&value) {
                    ExprValue::Null => None,
                    scalar => Some(scalar.to_string()),
                },
                Ok(None) => None,
                Err(error) => {
                    debug!(error = %error, key = %variable.key, "text variable could not be read");
                    None
                }
            };
        }

        match variable.data_source.as_str() {
            "instanceContext" => self
                .instance_context
                .and_then(|context| context.get(&variable.key))
                .flatten()
                .map(str::to_string),
            "applicationSettings" => self
                .application_settings
                .and_then(|settings| settings.get(&variable.key))
                .filter(|value| !value.is_null())
                .map(ExprValue::to_string),
            _ => None,
        }
    }
}

impl Translator for TextResources<'_> {
    fn translate(&self, key: &str, location: Option<&DataModelLocation>) -> String {
        self.lookup(key, location, 0)
    }
}

impl std::fmt::Debug for TextResources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextResources")
            .field("resources", &self.resources.len())
            .field("default_document", &self.default_document)
            .finish()
    }
}
