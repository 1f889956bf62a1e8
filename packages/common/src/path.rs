//! Dotted field paths with optional row indices, e.g. `people[2].address.city`.
//!
//! Every segment is a name optionally followed by a single `[k]` where `k` is a
//! non-negative integer literal. Placeholders such as `[{0}]` are not valid here:
//! they must be resolved before a path is parsed.

use crate::{CommonError, CommonResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

static SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\s\[\]\.]+)(?:\[(\d+)\])?$").expect("segment pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: String,
    pub index: Option<usize>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    pub fn indexed(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index: Some(index),
        }
    }

    fn parse(raw: &str, full_path: &str) -> CommonResult<Self> {
        let captures = SEGMENT.captures(raw).ok_or_else(|| {
            CommonError::malformed(full_path, format!("invalid segment '{}'", raw))
        })?;

        let name = captures[1].to_string();
        let index = match captures.get(2) {
            Some(digits) => Some(digits.as_str().parse::<usize>().map_err(|_| {
                CommonError::malformed(full_path, format!("index out of range in '{}'", raw))
            })?),
            None => None,
        };

        Ok(Self { name, index })
    }

    /// Same name, ignoring any index
    pub fn same_field(&self, other: &PathSegment) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn parse(path: &str) -> CommonResult<Self> {
        if path.trim().is_empty() {
            return Err(CommonError::malformed(path, "path is empty"));
        }

        let segments = path
            .split('.')
            .map(|raw| PathSegment::parse(raw, path))
            .collect::<CommonResult<Vec<_>>>()?;

        Ok(Self { segments })
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn into_segments(self) -> Vec<PathSegment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Appends the segments of `other` after this path
    pub fn join(&self, other: &FieldPath) -> FieldPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        FieldPath { segments }
    }

    /// Copy of this path with the last segment indexed
    pub fn with_last_index(&self, index: usize) -> FieldPath {
        let mut segments = self.segments.clone();
        if let Some(last) = segments.last_mut() {
            last.index = Some(index);
        }
        FieldPath { segments }
    }

    pub fn without_indexes(&self) -> FieldPath {
        FieldPath {
            segments: self
                .segments
                .iter()
                .map(|segment| PathSegment::new(segment.name.clone()))
                .collect(),
        }
    }

    pub fn has_indexes(&self) -> bool {
        self.segments.iter().any(|segment| segment.index.is_some())
    }

    /// Row indices in left-to-right order, e.g. `a[1].b.c[3]` gives `[1, 3]`
    pub fn row_indices(&self) -> Vec<usize> {
        self.segments.iter().filter_map(|segment| segment.index).collect()
    }

    /// Segment-aware prefix test: `people` prefixes `people.name` but not `peopleCount`.
    /// Indices must match exactly.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        prefix.segments.len() <= self.segments.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a == b)
    }

    /// Returns the segments after `prefix`, if `prefix` is a prefix of this path
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        if self.starts_with(prefix) {
            Some(FieldPath {
                segments: self.segments[prefix.segments.len()..].to_vec(),
            })
        } else {
            None
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::parse(s)
    }
}
