//! Option lists built from repeating data, one option per row.

pub mod error;
pub mod options;

pub use error::*;
pub use options::*;
