//! Dotted field paths
//!
//! Nested fields are addressed by an ordered list of segments. The textual
//! form joins segments with [`SEPARATOR`]; field names may never contain it,
//! so `join` and `parse` are inverse operations.

use crate::error::{Error, Result};
use std::fmt;

/// Segment separator of the textual (flattened) form
pub const SEPARATOR: char = '.';

/// Ordered sequence of field-name segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path (a root node)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a separator-joined path; empty segments are rejected
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = text.split(SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(Error::StructuralMismatch(format!(
                "Invalid field path '{text}'"
            )));
        }
        Ok(Self(segments))
    }

    /// Path extended by one segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn contains(&self, segment: &str) -> bool {
        self.0.iter().any(|s| s == segment)
    }

    /// The last `n` segments
    pub fn suffix(&self, n: usize) -> Self {
        let start = self.0.len().saturating_sub(n);
        Self(self.0[start..].to_vec())
    }

    /// Remaining path below `prefix`, if this path lies under it
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<FieldPath> {
        if self.0.starts_with(&prefix.0) {
            Some(Self(self.0[prefix.0.len()..].to_vec()))
        } else {
            None
        }
    }

    pub fn join(&self) -> String {
        self.0.join(&SEPARATOR.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}
