//! Repeating-group hierarchy: turns a flat layout into a tree of component
//! instances, one copy of a group's children per row of its collection.

pub mod config;
pub mod error;
pub mod generator;
pub mod layout;
pub mod materialize;
pub mod registry;
pub mod tree;

pub use config::*;
pub use error::*;
pub use generator::*;
pub use layout::*;
pub use materialize::{
    build_node, expand_nodes, materialize, read_row_uuids, Expand, Node, Row, StoreExpander,
};
pub use registry::*;
pub use tree::*;



#[cfg(test)]
mod tests_generator;

#[cfg(test)]
mod tests_tree;
