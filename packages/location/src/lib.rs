//! Data Model Location: where in the nested data the current component lives.
//!
//! A location is a row-indexed reference (`people[0].addresses[1]`) plus one
//! id mutator per enclosing repeating group. Locations are plain values passed
//! explicitly to every operation that depends on them; nesting always returns
//! a new location and never touches the parent.

pub mod location;

pub use location::*;
