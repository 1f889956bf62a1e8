use crate::OptionsResult;
use formbind_common::{DataStore, FieldPath, StructuredReference};
use formbind_evaluator::{DataSources, EvalConfig, Evaluator, ExprVal, ExprValue};
use formbind_location::{anchor, location_of, push, DataModelLocation};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

static ROW_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\{\d+\}\]").expect("placeholder pattern is valid"));

/// Describes options built from the rows of a repeating collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsSource {
    /// Collection to read rows from, e.g. `people`
    pub group: String,
    /// Path to the option value inside each row, e.g. `people[{0}].id`
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<Value>,
    /// Document to read from; the current location's document otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppOption {
    pub value: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,
}

/// Builds one option per row of `source.group`, in storage order.
///
/// Labels, descriptions and help texts are either expressions, evaluated at
/// the row, or text keys translated at the row. Duplicate values are kept.
#[instrument(skip_all, fields(group = %source.group))]
pub fn resolve_options(
    source: &OptionsSource,
    location: Option<&DataModelLocation>,
    sources: &DataSources<'_>,
    evaluator: &Evaluator,
) -> OptionsResult<Vec<AppOption>> {
    let document = source
        .data_type
        .as_deref()
        .or_else(|| location.map(DataModelLocation::document_id))
        .or(sources.default_document);
    let Some(document) = document else {
        debug!("no data model to read options from");
        return Ok(Vec::new());
    };

    if !sources.form_data.has_document(document) {
        debug!(document, "option source document is not loaded");
        return Ok(Vec::new());
    }

    let (group, parent) = group_collection(
        &StructuredReference::new(document, source.group.as_str()),
        location,
    )?;
    let rows = sources.form_data.get_rows(&group)?;
    if rows.is_empty() {
        debug!(group = %group, "option source has no rows");
        return Ok(Vec::new());
    }

    let value_path = ROW_PLACEHOLDER.replace_all(&source.value, "");
    let value_reference = StructuredReference::new(document, value_path.into_owned());

    let mut options = Vec::with_capacity(rows.len());
    for row in rows {
        let row_location = push(parent.as_ref(), &group, row.index)?;
        let row_sources = sources.with_location(Some(&row_location));

        let value = read_value(sources.form_data, &value_reference, &row_location)?;
        let label = text_value(source.label.as_ref(), &row_location, &row_sources, evaluator)?;
        let description =
            text_value(source.description.as_ref(), &row_location, &row_sources, evaluator)?;
        let help_text =
            text_value(source.help_text.as_ref(), &row_location, &row_sources, evaluator)?;

        options.push(AppOption {
            value,
            label: label.unwrap_or_default(),
            description,
            help_text,
        });
    }

    debug!(count = options.len(), "resolved options");
    Ok(options)
}

/// The collection to list and the location its rows sit below.
///
/// Anchoring fills in indices from the current row. When the current row is
/// one of the group's own rows, the last index is dropped again so the whole
/// group is listed, with its rows placed below the group's parent row.
fn group_collection(
    group: &StructuredReference,
    location: Option<&DataModelLocation>,
) -> OptionsResult<(StructuredReference, Option<DataModelLocation>)> {
    let anchored = anchor(group, location)?;
    let mut segments = anchored.path()?.into_segments();

    match segments.last_mut() {
        Some(last) if last.index.is_some() => {
            last.index = None;
            let collection = StructuredReference::from_path(
                anchored.document_id.clone(),
                &FieldPath::from_segments(segments),
            );
            let parent = location_of(&collection)?;
            Ok((collection, parent))
        }
        _ => Ok((anchored, location.cloned())),
    }
}

fn read_value(
    store: &dyn DataStore,
    reference: &StructuredReference,
    location: &DataModelLocation,
) -> OptionsResult<String> {
    let absolute = anchor(reference, Some(location))?;
    let value = store
        .get(&absolute)?
        .map(|value| ExprValue::from_json(&value))
        .unwrap_or_default();
    Ok(match value {
        ExprValue::Null => String::new(),
        scalar => scalar.to_string(),
    })
}

/// An expression array is evaluated; a plain string is a text key
fn text_value(
    text: Option<&Value>,
    location: &DataModelLocation,
    sources: &DataSources<'_>,
    evaluator: &Evaluator,
) -> OptionsResult<Option<String>> {
    let Some(text) = text else {
        return Ok(None);
    };

    if let Value::String(key) = text {
        let translated = match sources.translator {
            Some(translator) => translator.translate(key, Some(location)),
            None => key.clone(),
        };
        return Ok(Some(translated));
    }

    let config = EvalConfig::new(ExprVal::String, "");
    let result = evaluator.evaluate_json(text, sources, &config)?;
    Ok(Some(match result.value {
        ExprValue::Null => String::new(),
        value => value.to_string(),
    }))
}
