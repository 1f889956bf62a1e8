use crate::materialize::{expand_nodes, group_reference, materialize_rows};
use crate::{build_node, read_row_uuids, Expand, HierarchyResult, Layout, LayoutTree, Prototype, Row};
use formbind_common::DataStore;
use formbind_location::DataModelLocation;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, instrument};

/// Lifecycle of one repeating group instance in the memo table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupState {
    /// Row identities changed (or were never read); rows must be rebuilt
    Stale,
    Rebuilding,
    Materialized,
}

/// Identifies one repeating group instance: its (row-rewritten) id and indexed binding.
///
/// Cached rows are only reused while the prototype behind the key is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub prototype_id: String,
    pub binding: String,
}

impl GroupKey {
    pub fn new(prototype_id: impl Into<String>, binding: impl Into<String>) -> Self {
        Self {
            prototype_id: prototype_id.into(),
            binding: binding.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.prototype_id, self.binding)
    }
}

#[derive(Debug)]
struct GroupEntry {
    state: GroupState,
    /// Prototype the rows were built from; another layout may reuse the id
    template: Option<Prototype>,
    uuids: Vec<String>,
    /// Rows with nested groups unexpanded
    rows: Vec<Row>,
}

/// Builds layout trees, reusing the rows of every group whose row identities
/// did not change since the previous pass.
#[derive(Debug, Default)]
pub struct HierarchyGenerator {
    groups: HashMap<GroupKey, GroupEntry>,
    rebuilds: usize,
}

impl HierarchyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    #[instrument(skip_all, fields(top_level = layout.top_level().len()))]
    pub fn generate(
        &mut self,
        layout: &Layout,
        store: &dyn DataStore,
    ) -> HierarchyResult<LayoutTree> {
        let mut nodes: Vec<_> = layout
            .top_level()
            .iter()
            .map(|prototype| build_node(prototype, None))
            .collect();

        let mut pass = Pass {
            generator: &mut *self,
            store,
            visited: HashSet::new(),
        };
        expand_nodes(&mut nodes, &mut pass)?;

        let visited = pass.visited;
        let before = self.groups.len();
        self.groups.retain(|key, _| visited.contains(key));
        if self.groups.len() != before {
            debug!(dropped = before - self.groups.len(), "dropped groups no longer in the tree");
        }

        LayoutTree::new(nodes)
    }

    /// `None` for groups the last pass did not reach
    pub fn state_of(&self, key: &GroupKey) -> Option<GroupState> {
        self.groups.get(key).map(|entry| entry.state)
    }

    /// Keys of every group instance currently memoized
    pub fn group_keys(&self) -> Vec<&GroupKey> {
        let mut keys: Vec<_> = self.groups.keys().collect();
        keys.sort();
        keys
    }

    /// Number of group materializations done since creation
    pub fn rebuilds(&self) -> usize {
        self.rebuilds
    }

    /// Marks every group stale so the next pass rebuilds all rows
    pub fn invalidate(&mut self) {
        for (key, entry) in &mut self.groups {
            debug!(group = %key, from = ?entry.state, to = ?GroupState::Stale, "group transition");
            entry.state = GroupState::Stale;
        }
    }

    fn rows_for(
        &mut self,
        key: GroupKey,
        group: &Prototype,
        uuids: Vec<String>,
        location: Option<&DataModelLocation>,
    ) -> HierarchyResult<Vec<Row>> {
        let entry = self.groups.entry(key.clone()).or_insert_with(|| GroupEntry {
            state: GroupState::Stale,
            template: None,
            uuids: Vec::new(),
            rows: Vec::new(),
        });

        let same_template = entry.template.as_ref() == Some(group);
        if entry.state == GroupState::Materialized && same_template && entry.uuids == uuids {
            debug!(group = %key, rows = uuids.len(), "reusing rows");
            return Ok(entry.rows.clone());
        }

        transition(&key, entry, GroupState::Stale);
        transition(&key, entry, GroupState::Rebuilding);
        match materialize_rows(group, &uuids, location) {
            Ok(rows) => {
                entry.template = Some(group.clone());
                entry.uuids = uuids;
                entry.rows = rows.clone();
                transition(&key, entry, GroupState::Materialized);
                self.rebuilds += 1;
                Ok(rows)
            }
            Err(error) => {
                transition(&key, entry, GroupState::Stale);
                Err(error)
            }
        }
    }
}

fn transition(key: &GroupKey, entry: &mut GroupEntry, to: GroupState) {
    if entry.state != to {
        debug!(group = %key, from = ?entry.state, to = ?to, "group transition");
        entry.state = to;
    }
}

/// One generation pass; remembers which groups it reached
struct Pass<'a> {
    generator: &'a mut HierarchyGenerator,
    store: &'a dyn DataStore,
    visited: HashSet<GroupKey>,
}

impl Expand for Pass<'_> {
    fn expand_group(
        &mut self,
        group: &Prototype,
        location: Option<&DataModelLocation>,
    ) -> HierarchyResult<Vec<Row>> {
        let binding = group_reference(group, location)?;
        let uuids = read_row_uuids(self.store, &binding)?;
        let key = GroupKey::new(group.id.clone(), binding.to_string());
        self.visited.insert(key.clone());

        let mut rows = self.generator.rows_for(key, group, uuids, location)?;
        for row in &mut rows {
            expand_nodes(&mut row.items, &mut *self)?;
        }
        Ok(rows)
    }
}
