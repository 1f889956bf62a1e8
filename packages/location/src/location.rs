use formbind_common::{CommonError, CommonResult, FieldPath, PathSegment, StructuredReference};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Appends `-{row_index}` to a component id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdMutator {
    pub row_index: usize,
}

impl IdMutator {
    pub fn apply(&self, id: &str) -> String {
        format!("{}-{}", id, self.row_index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelLocation {
    reference: StructuredReference,
    id_mutators: Vec<IdMutator>,
}

impl DataModelLocation {
    /// Reference to the current row, e.g. `people[0].addresses[1]`
    pub fn reference(&self) -> &StructuredReference {
        &self.reference
    }

    pub fn document_id(&self) -> &str {
        &self.reference.document_id
    }

    pub fn id_mutators(&self) -> &[IdMutator] {
        &self.id_mutators
    }

    /// Number of repeating groups above this point
    pub fn depth(&self) -> usize {
        self.id_mutators.len()
    }

    /// Index of the innermost row
    pub fn row_index(&self) -> Option<usize> {
        self.id_mutators.last().map(|mutator| mutator.row_index)
    }

    /// Joins a path relative to the current row onto the row reference
    pub fn resolve(&self, relative: &StructuredReference) -> CommonResult<StructuredReference> {
        let row_path = self.reference.path()?;
        let relative_path = relative.path()?;
        Ok(StructuredReference::from_path(
            self.reference.document_id.clone(),
            &row_path.join(&relative_path),
        ))
    }
}

impl fmt::Display for DataModelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// One level of repeating-group nesting extracted from an indexed path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupContext {
    pub group_binding: StructuredReference,
    pub row_index: usize,
}

/// Enters row `row_index` of `group`, one level below `parent`.
///
/// The group binding may be given unindexed; it is anchored at the parent row
/// first so nested groups land inside the parent's row.
pub fn push(
    parent: Option<&DataModelLocation>,
    group: &StructuredReference,
    row_index: usize,
) -> CommonResult<DataModelLocation> {
    let anchored = anchor(group, parent)?;
    let path = anchored.path()?;

    if path.last().and_then(|segment| segment.index).is_some() {
        return Err(CommonError::malformed(
            anchored.field_path,
            "group binding already addresses a single row",
        ));
    }

    let mut id_mutators = parent
        .map(|location| location.id_mutators.clone())
        .unwrap_or_default();
    id_mutators.push(IdMutator { row_index });

    let location = DataModelLocation {
        reference: StructuredReference::from_path(
            anchored.document_id.clone(),
            &path.with_last_index(row_index),
        ),
        id_mutators,
    };
    trace!(location = %location, depth = location.depth(), "entered row");
    Ok(location)
}

/// Applies every mutator of `location` to `base_id`, outermost first.
///
/// A location from an unrelated subtree still produces an id; it is simply
/// the wrong one.
pub fn resolve_indexed_id(location: Option<&DataModelLocation>, base_id: &str) -> String {
    match location {
        Some(location) => apply_mutators(&location.id_mutators, base_id),
        None => base_id.to_string(),
    }
}

pub fn apply_mutators(mutators: &[IdMutator], base_id: &str) -> String {
    mutators
        .iter()
        .fold(base_id.to_string(), |id, mutator| mutator.apply(&id))
}

/// Rewrites `reference` relative to the current row when it points inside it.
///
/// `people[1].address.city` (or `people.address.city`) inside `people[1]`
/// becomes `address.city`. References outside the row, in another document,
/// or addressing a different row index are returned unchanged.
pub fn transpose(
    reference: &StructuredReference,
    location: Option<&DataModelLocation>,
) -> CommonResult<StructuredReference> {
    let Some(location) = location else {
        return Ok(reference.clone());
    };
    if location.reference.document_id != reference.document_id {
        return Ok(reference.clone());
    }

    let path = reference.path()?;
    let row_path = location.reference.path()?;
    if path.len() <= row_path.len() {
        return Ok(reference.clone());
    }

    let descends = path
        .segments()
        .iter()
        .zip(row_path.segments())
        .all(|(ours, theirs)| {
            ours.same_field(theirs) && (ours.index.is_none() || ours.index == theirs.index)
        });
    if !descends {
        return Ok(reference.clone());
    }

    let relative = FieldPath::from_segments(path.segments()[row_path.len()..].to_vec());
    Ok(reference.with_field(relative.to_string()))
}

/// Fills missing row indices of `reference` from the current row, producing
/// an absolute reference the data store can read.
///
/// Walks both paths from the left while segment names match. Unindexed
/// segments take the location's index; an explicit index that differs from
/// the location's ends the walk, leaving the rest as written.
pub fn anchor(
    reference: &StructuredReference,
    location: Option<&DataModelLocation>,
) -> CommonResult<StructuredReference> {
    let Some(location) = location else {
        return Ok(reference.clone());
    };
    if location.reference.document_id != reference.document_id {
        return Ok(reference.clone());
    }

    let mut segments = reference.path()?.into_segments();
    let row_path = location.reference.path()?;

    for (ours, theirs) in segments.iter_mut().zip(row_path.segments()) {
        if !ours.same_field(theirs) {
            break;
        }
        match ours.index {
            None => ours.index = theirs.index,
            Some(index) if Some(index) == theirs.index => {}
            Some(_) => break,
        }
    }

    Ok(StructuredReference::from_path(
        reference.document_id.clone(),
        &FieldPath::from_segments(segments),
    ))
}

/// Splits an indexed path into its enclosing groups, outermost first.
///
/// `people[0].addresses[1].street` gives `(people, 0)` and
/// `(people[0].addresses, 1)`.
pub fn parse_group_contexts(reference: &StructuredReference) -> CommonResult<Vec<GroupContext>> {
    let path = reference.path()?;
    let mut prefix: Vec<PathSegment> = Vec::with_capacity(path.len());
    let mut contexts = Vec::new();

    for segment in path.segments() {
        if let Some(row_index) = segment.index {
            let mut group = prefix.clone();
            group.push(PathSegment::new(segment.name.clone()));
            contexts.push(GroupContext {
                group_binding: StructuredReference::from_path(
                    reference.document_id.clone(),
                    &FieldPath::from_segments(group),
                ),
                row_index,
            });
        }
        prefix.push(segment.clone());
    }

    Ok(contexts)
}

/// Rebuilds the location chain for a list of group contexts
pub fn from_group_contexts(contexts: &[GroupContext]) -> CommonResult<Option<DataModelLocation>> {
    let mut location: Option<DataModelLocation> = None;
    for context in contexts {
        location = Some(push(
            location.as_ref(),
            &context.group_binding,
            context.row_index,
        )?);
    }
    Ok(location)
}

/// Location of the row that contains `reference`, e.g. the location for
/// `people[0].addresses[1].street` is `people[0].addresses[1]` at depth 2.
pub fn location_of(reference: &StructuredReference) -> CommonResult<Option<DataModelLocation>> {
    from_group_contexts(&parse_group_contexts(reference)?)
}
