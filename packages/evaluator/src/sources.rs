use crate::ExprValue;
use formbind_common::{DataStore, StructuredReference};
use formbind_location::DataModelLocation;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resolves text resource keys for the `text` function
pub trait Translator {
    /// Translates `key`; the location lets variables read from the current row
    fn translate(&self, key: &str, location: Option<&DataModelLocation>) -> String;
}

/// What the `component` function needs to know about a component instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentBinding {
    /// The component's simple data model binding, already indexed for its row
    pub reference: Option<StructuredReference>,
    pub hidden: bool,
}

/// Finds the instance of a component closest to the current location
pub trait ComponentLookup {
    fn find_binding(
        &self,
        id: &str,
        location: Option<&DataModelLocation>,
    ) -> Option<ComponentBinding>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceContext {
    pub instance_owner_party_id: Option<String>,
    pub instance_id: Option<String>,
    pub app_id: Option<String>,
    pub instance_owner_party_type: Option<String>,
}

impl InstanceContext {
    pub const KEYS: &'static [&'static str] = &[
        "instanceOwnerPartyId",
        "instanceId",
        "appId",
        "instanceOwnerPartyType",
    ];

    /// `None` for keys that are not part of the instance context
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        let value = match key {
            "instanceOwnerPartyId" => &self.instance_owner_party_id,
            "instanceId" => &self.instance_id,
            "appId" => &self.app_id,
            "instanceOwnerPartyType" => &self.instance_owner_party_type,
            _ => return None,
        };
        Some(value.as_deref())
    }
}

/// Everything an expression may read from, passed explicitly to every evaluation
#[derive(Clone, Copy)]
pub struct DataSources<'a> {
    pub form_data: &'a dyn DataStore,
    pub translator: Option<&'a dyn Translator>,
    pub components: Option<&'a dyn ComponentLookup>,
    pub location: Option<&'a DataModelLocation>,
    pub default_document: Option<&'a str>,
    pub language: Option<&'a str>,
    pub instance_context: Option<&'a InstanceContext>,
    pub application_settings: Option<&'a BTreeMap<String, ExprValue>>,
    pub positional_arguments: &'a [ExprValue],
    pub value_arguments: Option<&'a BTreeMap<String, ExprValue>>,
}

impl<'a> DataSources<'a> {
    pub fn new(form_data: &'a dyn DataStore) -> Self {
        Self {
            form_data,
            translator: None,
            components: None,
            location: None,
            default_document: None,
            language: None,
            instance_context: None,
            application_settings: None,
            positional_arguments: &[],
            value_arguments: None,
        }
    }

    pub fn with_translator(mut self, translator: &'a dyn Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_components(mut self, components: &'a dyn ComponentLookup) -> Self {
        self.components = Some(components);
        self
    }

    /// Copy of these sources evaluated from another row
    pub fn with_location(mut self, location: Option<&'a DataModelLocation>) -> Self {
        self.location = location;
        self
    }

    pub fn with_default_document(mut self, document_id: &'a str) -> Self {
        self.default_document = Some(document_id);
        self
    }

    pub fn with_language(mut self, language: &'a str) -> Self {
        self.language = Some(language);
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

    pub fn with_positional_arguments(mut self, arguments: &'a [ExprValue]) -> Self {
        self.positional_arguments = arguments;
        self
    }

    pub fn with_value_arguments(mut self, arguments: &'a BTreeMap<String, ExprValue>) -> Self {
        self.value_arguments = Some(arguments);
        self
    }

    /// Document used when an expression does not name one
    pub fn current_document(&self) -> Option<&'a str> {
        self.location
            .map(DataModelLocation::document_id)
            .or(self.default_document)
    }
}

impl fmt::Debug for DataSources<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSources")
            .field("location", &self.location)
            .field("default_document", &self.default_document)
            .field("language", &self.language)
            .field("has_translator", &self.translator.is_some())
            .field("has_components", &self.components.is_some())
            .finish()
    }
}
