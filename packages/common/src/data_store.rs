use crate::{CommonResult, StructuredReference};
use serde_json::Value;

/// One entry of a repeated collection
#[derive(Debug, Clone, PartialEq)]
pub struct RowEntry {
    pub index: usize,
    /// Stable row identity, `None` when the entry lacks one
    pub identity: Option<String>,
    pub value: Value,
}

/// What to do with a row when removing a field that addresses the row itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowRemoval {
    #[default]
    DeleteRow,
    SetToNull,
    Ignore,
}

/// Narrow access to the nested documents a form edits.
///
/// All reads are synchronous snapshots. Implementations must only ever see
/// fully indexed references for single values; unindexed collection segments
/// are treated as "not found".
pub trait DataStore {
    fn get(&self, reference: &StructuredReference) -> CommonResult<Option<Value>>;

    /// Entries of the collection at `reference`, in storage order. A missing
    /// collection yields no rows.
    fn get_rows(&self, reference: &StructuredReference) -> CommonResult<Vec<RowEntry>>;

    fn set(&mut self, reference: &StructuredReference, value: Value) -> CommonResult<()>;

    fn append(&mut self, reference: &StructuredReference, value: Value) -> CommonResult<()>;

    fn remove(
        &mut self,
        reference: &StructuredReference,
        predicate: &dyn Fn(&Value) -> bool,
    ) -> CommonResult<()>;

    fn has_document(&self, document_id: &str) -> bool;
}
