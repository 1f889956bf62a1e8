use crate::{parse_layout, ComponentConfig, ComponentKind, ComponentRegistry, HierarchyError, HierarchyResult};
use formbind_common::StructuredReference;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Binding key that points a repeating group at its collection
pub const GROUP_BINDING: &str = "group";

/// Binding key a leaf component's value lives under
pub const SIMPLE_BINDING: &str = "simpleBinding";

/// A component with its children resolved, before any row is expanded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prototype {
    pub id: String,
    /// Id from the layout file, set once the id has been rewritten for a row
    pub base_component_id: Option<String>,
    pub component_type: String,
    pub kind: ComponentKind,
    pub bindings: BTreeMap<String, StructuredReference>,
    pub text_bindings: BTreeMap<String, Value>,
    pub properties: Map<String, Value>,
    pub hidden: bool,
    pub children: Vec<Prototype>,
    pub rows_before: Vec<Prototype>,
    pub rows_after: Vec<Prototype>,
}

impl Prototype {
    pub fn is_repeating(&self) -> bool {
        self.kind == ComponentKind::RepeatingGroup
    }

    pub fn group_binding(&self) -> Option<&StructuredReference> {
        self.bindings.get(GROUP_BINDING)
    }

    /// The id this component has in the layout file
    pub fn base_id(&self) -> &str {
        self.base_component_id.as_deref().unwrap_or(&self.id)
    }
}

/// All top-level prototypes of one page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    top_level: Vec<Prototype>,
}

impl Layout {
    pub fn from_json(
        value: Value,
        default_document: &str,
        registry: &ComponentRegistry,
    ) -> HierarchyResult<Self> {
        let configs = parse_layout(value)?;
        Self::build(&configs, default_document, registry)
    }

    /// Resolves child ids into a prototype tree.
    ///
    /// Components nobody references become top level, in file order. Each
    /// component may be placed below at most one parent.
    pub fn build(
        configs: &[ComponentConfig],
        default_document: &str,
        registry: &ComponentRegistry,
    ) -> HierarchyResult<Self> {
        let mut by_id: HashMap<&str, &ComponentConfig> = HashMap::with_capacity(configs.len());
        for config in configs {
            if by_id.insert(&config.id, config).is_some() {
                return Err(HierarchyError::DuplicateId(config.id.clone()));
            }
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        for config in configs {
            for child in config.referenced_ids() {
                if !by_id.contains_key(child.as_str()) {
                    return Err(HierarchyError::UnknownComponent(child.clone()));
                }
                if let Some(first) = parents.insert(child, &config.id) {
                    return Err(HierarchyError::ChildClaimedTwice {
                        child: child.clone(),
                        first: first.to_string(),
                        second: config.id.clone(),
                    });
                }
            }
        }

        let builder = Builder {
            by_id: &by_id,
            default_document,
            registry,
        };
        let top_level = configs
            .iter()
            .filter(|config| !parents.contains_key(config.id.as_str()))
            .map(|config| builder.build(config))
            .collect::<HierarchyResult<Vec<_>>>()?;

        let layout = Self { top_level };
        let reached = layout.len();
        if reached != configs.len() {
            let mut reachable = Vec::with_capacity(reached);
            layout.visit(&mut |prototype| reachable.push(prototype.id.clone()));
            if let Some(config) = configs.iter().find(|config| !reachable.contains(&config.id)) {
                return Err(HierarchyError::Cycle(config.id.clone()));
            }
        }

        debug!(components = reached, top_level = layout.top_level.len(), "built layout");
        Ok(layout)
    }

    pub fn top_level(&self) -> &[Prototype] {
        &self.top_level
    }

    /// Number of prototypes in the whole tree
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| count += 1);
        count
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Prototype> {
        fn search<'a>(prototypes: &'a [Prototype], id: &str) -> Option<&'a Prototype> {
            prototypes.iter().find_map(|prototype| {
                if prototype.id == id {
                    return Some(prototype);
                }
                search(&prototype.rows_before, id)
                    .or_else(|| search(&prototype.children, id))
                    .or_else(|| search(&prototype.rows_after, id))
            })
        }
        search(&self.top_level, id)
    }

    fn visit(&self, f: &mut dyn FnMut(&Prototype)) {
        fn walk(prototypes: &[Prototype], f: &mut dyn FnMut(&Prototype)) {
            for prototype in prototypes {
                f(prototype);
                walk(&prototype.rows_before, f);
                walk(&prototype.children, f);
                walk(&prototype.rows_after, f);
            }
        }
        walk(&self.top_level, f);
    }
}

struct Builder<'a> {
    by_id: &'a HashMap<&'a str, &'a ComponentConfig>,
    default_document: &'a str,
    registry: &'a ComponentRegistry,
}

impl Builder<'_> {
    fn build(&self, config: &ComponentConfig) -> HierarchyResult<Prototype> {
        let kind = self.kind_of(config)?;

        let bindings: BTreeMap<String, StructuredReference> = config
            .data_model_bindings
            .iter()
            .map(|(key, binding)| (key.clone(), binding.resolve(self.default_document)))
            .collect();
        if kind == ComponentKind::RepeatingGroup && !bindings.contains_key(GROUP_BINDING) {
            return Err(HierarchyError::MissingGroupBinding(config.id.clone()));
        }

        let mut properties = config.properties.clone();
        let hidden = match &config.hidden {
            None => false,
            Some(Value::Bool(hidden)) => *hidden,
            Some(expression) => {
                properties.insert("hidden".to_string(), expression.clone());
                false
            }
        };
        if let Some(max_count) = config.max_count {
            properties.insert("maxCount".to_string(), Value::from(max_count));
        }

        Ok(Prototype {
            id: config.id.clone(),
            base_component_id: None,
            component_type: config.component_type.clone(),
            kind,
            bindings,
            text_bindings: config.text_resource_bindings.clone(),
            properties,
            hidden,
            children: self.build_all(&config.children)?,
            rows_before: self.build_all(&config.rows_before)?,
            rows_after: self.build_all(&config.rows_after)?,
        })
    }

    fn build_all(&self, ids: &[String]) -> HierarchyResult<Vec<Prototype>> {
        ids.iter()
            .map(|id| {
                let config = self
                    .by_id
                    .get(id.as_str())
                    .ok_or_else(|| HierarchyError::UnknownComponent(id.clone()))?;
                self.build(config)
            })
            .collect()
    }

    fn kind_of(&self, config: &ComponentConfig) -> HierarchyResult<ComponentKind> {
        let kind = self.registry.kind_of(&config.component_type).ok_or_else(|| {
            HierarchyError::UnknownComponentType {
                id: config.id.clone(),
                component_type: config.component_type.clone(),
            }
        })?;

        let repeats = config.component_type.eq_ignore_ascii_case("group")
            && config.max_count.map_or(false, |max| max > 1);
        Ok(if repeats {
            ComponentKind::RepeatingGroup
        } else {
            kind
        })
    }
}
