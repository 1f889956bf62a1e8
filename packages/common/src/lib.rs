pub mod data_store;
pub mod error;
pub mod json_store;
pub mod path;
pub mod reference;
pub mod result;

pub use data_store::*;
pub use error::*;
pub use json_store::*;
pub use path::*;
pub use reference::*;
pub use result::*;

#[cfg(test)]
mod tests_path;

#[cfg(test)]
mod tests_json_store;
