use crate::{HierarchyError, HierarchyResult, Node};
use formbind_common::StructuredReference;
use formbind_evaluator::{ComponentBinding, ComponentLookup};
use formbind_location::{apply_mutators, DataModelLocation};
use std::collections::BTreeMap;

/// Flattened facts about one node of a [`LayoutTree`]
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: String,
    pub base_component_id: Option<String>,
    pub component_type: String,
    pub simple_binding: Option<StructuredReference>,
    /// Hidden itself or below a hidden ancestor
    pub hidden: bool,
    pub location: Option<DataModelLocation>,
    pub parent: Option<String>,
}

impl NodeInfo {
    pub fn base_id(&self) -> &str {
        self.base_component_id.as_deref().unwrap_or(&self.id)
    }
}

/// A materialized layout with an index over every node instance
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    top_level: Vec<Node>,
    index: BTreeMap<String, NodeInfo>,
    order: Vec<String>,
}

impl LayoutTree {
    /// Indexes every node; two instances ending up with the same id is an error
    pub fn new(top_level: Vec<Node>) -> HierarchyResult<Self> {
        let mut tree = Self {
            top_level: Vec::new(),
            index: BTreeMap::new(),
            order: Vec::new(),
        };
        for node in &top_level {
            tree.insert(node, None, false)?;
        }
        tree.top_level = top_level;
        Ok(tree)
    }

    fn insert(
        &mut self,
        node: &Node,
        parent: Option<&str>,
        ancestor_hidden: bool,
    ) -> HierarchyResult<()> {
        let hidden = ancestor_hidden || node.hidden;
        if self.index.contains_key(&node.id) {
            return Err(HierarchyError::DuplicateId(node.id.clone()));
        }
        self.order.push(node.id.clone());
        self.index.insert(
            node.id.clone(),
            NodeInfo {
                id: node.id.clone(),
                base_component_id: node.base_component_id.clone(),
                component_type: node.component_type.clone(),
                simple_binding: node.simple_binding().cloned(),
                hidden,
                location: node.location.clone(),
                parent: parent.map(str::to_string),
            },
        );

        let below = node
            .rows_before
            .iter()
            .chain(&node.children)
            .chain(node.rows().iter().flat_map(|row| &row.items))
            .chain(&node.rows_after);
        for child in below {
            self.insert(child, Some(&node.id), hidden)?;
        }
        Ok(())
    }

    pub fn top_level(&self) -> &[Node] {
        &self.top_level
    }

    pub fn get(&self, id: &str) -> Option<&NodeInfo> {
        self.index.get(id)
    }

    /// Every instance of a layout component, in tree order
    pub fn all_by_base_id(&self, base_id: &str) -> Vec<&NodeInfo> {
        self.iter().filter(|info| info.base_id() == base_id).collect()
    }

    /// Depth-first, rows in storage order
    pub fn iter(&self) -> impl Iterator<Item = &NodeInfo> {
        self.order.iter().filter_map(|id| self.index.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Unknown ids are not hidden
    pub fn is_hidden(&self, id: &str) -> bool {
        self.index.get(id).map_or(false, |info| info.hidden)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The instance of `id` nearest to `location`.
    ///
    /// Tries the id with every enclosing row index applied, then with the
    /// innermost indices dropped one at a time. A component outside all
    /// groups is found by the last attempt. Falls back to the only instance
    /// of a base id when there is exactly one.
    pub fn closest(&self, id: &str, location: Option<&DataModelLocation>) -> Option<&NodeInfo> {
        let mutators = location.map_or(&[][..], DataModelLocation::id_mutators);
        let found = (0..=mutators.len())
            .rev()
            .find_map(|depth| self.index.get(&apply_mutators(&mutators[..depth], id)));
        if found.is_some() {
            return found;
        }

        match self.all_by_base_id(id).as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }
}

impl ComponentLookup for LayoutTree {
    fn find_binding(
        &self,
        id: &str,
        location: Option<&DataModelLocation>,
    ) -> Option<ComponentBinding> {
        self.closest(id, location).map(|info| ComponentBinding {
            reference: info.simple_binding.clone(),
            hidden: info.hidden,
        })
    }
}
