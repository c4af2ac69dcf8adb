// Copyright 2025 TracePulse (https://github.com/tracepulse)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Typed extraction paths shared by the query compiler and result extractor.
//!
//! A path describes how to descend from a date bucket in the store response
//! to a leaf numeric value. Both the compiler and the extractor consume the
//! same `ExtractionPath` instance produced by a single planning function, so
//! the two sides can never disagree on structure.

use crate::error::{AnalyticsError, Result};
use serde_json::Value;
use std::fmt;

/// One step of an extraction path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Descend into a named sub-aggregation
    Key(String),
    /// Descend into the per-group bucket list; valid only in group paths,
    /// and at most once per path
    GroupBuckets,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::GroupBuckets => write!(f, "buckets"),
        }
    }
}

/// Ordered sequence of segments from a response bucket down to a value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionPath {
    segments: Vec<PathSegment>,
}

impl ExtractionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a path out of plain key segments
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: keys.into_iter().map(|k| PathSegment::Key(k.into())).collect(),
        }
    }

    /// Append a key segment (builder style)
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Append the group-buckets marker (builder style)
    pub fn group_buckets(mut self) -> Self {
        self.segments.push(PathSegment::GroupBuckets);
        self
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split at the group-buckets marker: segments before it locate the
    /// bucket list within a date bucket, segments after it are applied
    /// inside each group bucket. Returns `None` when the path has no marker.
    pub fn split_at_group_buckets(&self) -> Option<(&[PathSegment], &[PathSegment])> {
        let idx = self
            .segments
            .iter()
            .position(|s| *s == PathSegment::GroupBuckets)?;
        Some((&self.segments[..idx], &self.segments[idx + 1..]))
    }

    /// Render the key segments as a `>`-joined store buckets_path.
    ///
    /// Only meaningful for metric paths, which never contain the
    /// group-buckets marker.
    pub fn to_buckets_path(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(">")
    }

    /// Descend every key segment through a JSON tree
    pub fn walk<'a>(&self, root: &'a Value) -> Result<&'a Value> {
        walk_segments(&self.segments, root)
    }

    /// Walk the full path and read the terminal numeric value
    pub fn read_leaf(&self, root: &Value) -> Result<f64> {
        leaf_value(self.walk(root)?, self)
    }
}

impl fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_buckets_path())
    }
}

/// Descend a slice of segments through a JSON tree, failing with a
/// descriptive `ExtractionPathMismatch` when a segment is absent.
pub fn walk_segments<'a>(segments: &[PathSegment], root: &'a Value) -> Result<&'a Value> {
    let mut current = root;
    for segment in segments {
        let key = match segment {
            PathSegment::Key(key) => key.as_str(),
            PathSegment::GroupBuckets => {
                return Err(AnalyticsError::ExtractionPathMismatch(format!(
                    "group-buckets marker encountered while walking value path {}",
                    render(segments)
                )))
            }
        };
        current = current.get(key).ok_or_else(|| {
            AnalyticsError::ExtractionPathMismatch(format!(
                "segment '{}' not found while walking {}",
                key,
                render(segments)
            ))
        })?;
    }
    Ok(current)
}

/// Read the numeric value at a terminal node.
///
/// A terminal node must be either a bare JSON number (doc_count-style
/// leaves) or an object carrying a numeric `value` field (stat and pipeline
/// aggregation results). Anything else means the compiler and extractor
/// disagreed on structure and the response is aborted.
pub fn leaf_value(node: &Value, path: &ExtractionPath) -> Result<f64> {
    if let Some(n) = node.as_f64() {
        return Ok(n);
    }
    if let Some(n) = node.get("value").and_then(Value::as_f64) {
        return Ok(n);
    }
    Err(AnalyticsError::ExtractionPathMismatch(format!(
        "no numeric value at end of path {}",
        path
    )))
}

fn render(segments: &[PathSegment]) -> String {
    segments
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_walk_descends_key_segments() {
        let tree = json!({"a": {"b": {"value": 42.0}}});
        let path = ExtractionPath::from_keys(["a", "b"]);
        assert_eq!(path.read_leaf(&tree).unwrap(), 42.0);
    }

    #[test]
    fn test_bare_number_is_a_valid_leaf() {
        let tree = json!({"a": {"doc_count": 3}});
        let path = ExtractionPath::from_keys(["a", "doc_count"]);
        assert_eq!(path.read_leaf(&tree).unwrap(), 3.0);
    }

    #[test]
    fn test_missing_segment_is_a_path_mismatch() {
        let tree = json!({"a": {}});
        let path = ExtractionPath::from_keys(["a", "b"]);
        let err = path.read_leaf(&tree).unwrap_err();
        assert!(matches!(err, AnalyticsError::ExtractionPathMismatch(_)));
        assert!(err.to_string().contains("'b'"));
    }

    #[test]
    fn test_non_numeric_terminal_fails_loudly() {
        let tree = json!({"a": {"value": "oops"}});
        let path = ExtractionPath::from_keys(["a"]);
        let err = path.read_leaf(&tree).unwrap_err();
        assert!(matches!(err, AnalyticsError::ExtractionPathMismatch(_)));
    }

    #[test]
    fn test_split_at_group_buckets() {
        let path = ExtractionPath::new()
            .key("evaluations.evaluation_state")
            .key("child")
            .group_buckets()
            .key("nested");
        let (before, after) = path.split_at_group_buckets().unwrap();
        assert_eq!(before.len(), 2);
        assert_eq!(after, &[PathSegment::Key("nested".into())]);

        let plain = ExtractionPath::from_keys(["a"]);
        assert!(plain.split_at_group_buckets().is_none());
    }

    #[test]
    fn test_display_renders_legacy_form() {
        let path = ExtractionPath::new().key("metadata.model").group_buckets();
        assert_eq!(path.to_string(), "metadata.model>buckets");
    }
}
