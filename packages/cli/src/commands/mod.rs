pub mod eval;
pub mod options;
pub mod tree;

pub use eval::{eval, EvalArgs};
pub use options::{options, OptionsArgs};
pub use tree::{tree, TreeArgs};

use anyhow::{anyhow, Context, Result};
use formbind_common::{JsonDataStore, StructuredReference};
use formbind_evaluator::{TextResource, TextResourceFile};
use formbind_location::{location_of, DataModelLocation};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Paths on the command line are relative to the working directory
pub(crate) fn resolve_path(cwd: &str, path: &Path) -> PathBuf {
    PathBuf::from(cwd).join(path)
}

pub(crate) fn read_json(path: &Path) -> Result<Value> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Reads a `{ "<documentId>": {...} }` data file; no file means no documents
pub(crate) fn load_store(cwd: &str, data: Option<&Path>) -> Result<JsonDataStore> {
    let Some(data) = data else {
        return Ok(JsonDataStore::new());
    };
    let path = resolve_path(cwd, data);
    let store = JsonDataStore::from_json(read_json(&path)?)
        .with_context(|| format!("{} is not a map of documents", path.display()))?;
    debug!(path = %path.display(), documents = store.document_ids().count(), "loaded data");
    Ok(store)
}

pub(crate) fn load_texts(path: Option<&Path>) -> Result<Vec<TextResource>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let file: TextResourceFile = serde_json::from_value(read_json(path)?)
        .with_context(|| format!("{} is not a text resource file", path.display()))?;
    Ok(file.resources)
}

/// Flag, then config, then the only document in the store
pub(crate) fn pick_document(
    flag: Option<String>,
    configured: Option<&str>,
    store: &JsonDataStore,
) -> Option<String> {
    flag.or_else(|| configured.map(str::to_string)).or_else(|| {
        let mut ids = store.document_ids();
        match (ids.next(), ids.next()) {
            (Some(only), None) => Some(only.to_string()),
            _ => None,
        }
    })
}

/// Location for a row path such as `people[1].addresses[0]`
pub(crate) fn location_at(
    document: Option<&str>,
    at: Option<&str>,
) -> Result<Option<DataModelLocation>> {
    let Some(at) = at else {
        return Ok(None);
    };
    let document = document.ok_or_else(|| anyhow!("--at needs a document; pass --document"))?;
    let location = location_of(&StructuredReference::new(document, at))?;
    if location.is_none() {
        return Err(anyhow!("'{}' does not address a row; use indices like people[0]", at));
    }
    Ok(location)
}
