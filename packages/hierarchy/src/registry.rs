use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Leaf,
    Container,
    RepeatingGroup,
}

/// Case-insensitive component type table.
///
/// Built once and passed by reference to whatever needs it; it is never
/// modified after construction.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    kinds: BTreeMap<String, ComponentKind>,
}

impl ComponentRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in component types
    pub fn standard() -> Self {
        const LEAVES: &[&str] = &[
            "Input",
            "TextArea",
            "Checkboxes",
            "RadioButtons",
            "Dropdown",
            "MultipleSelect",
            "Datepicker",
            "Header",
            "Paragraph",
            "Button",
            "NavigationButtons",
            "Summary",
            "Image",
            "Likert",
            "Alert",
            "Panel",
            "AddressComponent",
            "FileUpload",
            "Custom",
        ];
        const CONTAINERS: &[&str] = &["Group", "Grid", "Accordion", "ButtonGroup", "Tabs"];

        let registry = LEAVES
            .iter()
            .fold(Self::empty(), |registry, name| registry.with(name, ComponentKind::Leaf));
        CONTAINERS
            .iter()
            .fold(registry, |registry, name| registry.with(name, ComponentKind::Container))
            .with("RepeatingGroup", ComponentKind::RepeatingGroup)
    }

    pub fn with(mut self, type_name: &str, kind: ComponentKind) -> Self {
        self.kinds.insert(type_name.to_ascii_lowercase(), kind);
        self
    }

    pub fn kind_of(&self, type_name: &str) -> Option<ComponentKind> {
        self.kinds.get(&type_name.to_ascii_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
