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

//! Group-by definitions.
//!
//! A group wraps the composite series aggregations one level deeper inside
//! a bucketing aggregation. Its extraction path carries exactly one
//! group-buckets marker: segments before it locate the bucket list within
//! a date bucket, segments after it apply inside each group bucket.

use serde_json::{json, Map, Value};
use tracepulse_core::ExtractionPath;

/// Where a group's buckets come from
#[derive(Debug, Clone, Copy)]
pub enum GroupSource {
    /// Terms bucketing over one document field
    Terms { field: &'static str, size: usize },
    /// A `filter` aggregation wrapping the terms bucketing
    FilteredTerms {
        filter_field: &'static str,
        filter_value: &'static str,
        field: &'static str,
        size: usize,
    },
}

/// Immutable group definition, registered once at startup
#[derive(Debug, Clone, Copy)]
pub struct GroupDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub source: GroupSource,
}

/// Wrapped aggregation mapping plus the path locating its bucket list
#[derive(Debug, Clone)]
pub struct GroupPlan {
    /// Group id the result map is keyed under
    pub id: String,
    /// Composite aggregations nested inside the grouping aggregation
    pub aggs: Map<String, Value>,
    /// Path with exactly one group-buckets marker
    pub path: ExtractionPath,
}

impl GroupDefinition {
    /// Nest the composite series aggregations inside this group
    pub fn plan(&self, inner: Map<String, Value>) -> GroupPlan {
        let (aggs, path) = match self.source {
            GroupSource::Terms { field, size } => {
                let spec = json!({
                    "terms": { "field": field, "size": size },
                    "aggs": Value::Object(inner),
                });
                let mut aggs = Map::new();
                aggs.insert(self.id.to_string(), spec);
                let path = ExtractionPath::new().key(self.id).group_buckets();
                (aggs, path)
            }
            GroupSource::FilteredTerms { filter_field, filter_value, field, size } => {
                let spec = json!({
                    "filter": { "term": { filter_field: filter_value } },
                    "aggs": {
                        "child": {
                            "terms": { "field": field, "size": size },
                            "aggs": Value::Object(inner),
                        }
                    },
                });
                let mut aggs = Map::new();
                aggs.insert(self.id.to_string(), spec);
                let path = ExtractionPath::new().key(self.id).key("child").group_buckets();
                (aggs, path)
            }
        };
        GroupPlan { id: self.id.to_string(), aggs, path }
    }
}

const GROUP_TERMS_SIZE: usize = 100;

/// Built-in group catalog
pub fn builtin_groups() -> Vec<GroupDefinition> {
    vec![
        GroupDefinition {
            id: "metadata.model",
            label: "Model",
            source: GroupSource::Terms { field: "spans.model", size: GROUP_TERMS_SIZE },
        },
        GroupDefinition {
            id: "metadata.user_id",
            label: "User",
            source: GroupSource::Terms { field: "trace.metadata.user_id", size: GROUP_TERMS_SIZE },
        },
        GroupDefinition {
            id: "metadata.thread_id",
            label: "Thread",
            source: GroupSource::Terms { field: "trace.metadata.thread_id", size: GROUP_TERMS_SIZE },
        },
        GroupDefinition {
            id: "metadata.customer_id",
            label: "Customer",
            source: GroupSource::Terms { field: "trace.metadata.customer_id", size: GROUP_TERMS_SIZE },
        },
        GroupDefinition {
            id: "metadata.labels",
            label: "Label",
            source: GroupSource::Terms { field: "trace.metadata.labels", size: GROUP_TERMS_SIZE },
        },
        GroupDefinition {
            id: "evaluations.evaluation_state",
            label: "Evaluation State",
            source: GroupSource::FilteredTerms {
                filter_field: "evaluations.type",
                filter_value: "evaluation",
                field: "evaluations.status",
                size: GROUP_TERMS_SIZE,
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracepulse_core::PathSegment;

    fn group(id: &str) -> GroupDefinition {
        builtin_groups()
            .into_iter()
            .find(|g| g.id == id)
            .unwrap_or_else(|| panic!("group {} not in catalog", id))
    }

    fn inner() -> Map<String, Value> {
        let mut inner = Map::new();
        inner.insert(
            "performance.total_cost/sum".to_string(),
            json!({"sum": {"field": "trace.metrics.total_cost"}}),
        );
        inner
    }

    #[test]
    fn test_terms_group_nests_series_one_level_deeper() {
        let plan = group("metadata.model").plan(inner());
        let spec = plan.aggs.get("metadata.model").unwrap();
        assert_eq!(spec.pointer("/terms/field").unwrap(), &json!("spans.model"));
        assert!(spec
            .pointer("/aggs/performance.total_cost~1sum")
            .is_some());
        assert_eq!(plan.path.to_string(), "metadata.model>buckets");
    }

    #[test]
    fn test_filtered_group_adds_a_before_segment() {
        let plan = group("evaluations.evaluation_state").plan(inner());
        let (before, after) = plan.path.split_at_group_buckets().unwrap();
        assert_eq!(
            before,
            &[
                PathSegment::Key("evaluations.evaluation_state".into()),
                PathSegment::Key("child".into()),
            ]
        );
        assert!(after.is_empty());
        let spec = plan.aggs.get("evaluations.evaluation_state").unwrap();
        assert_eq!(
            spec.pointer("/filter/term/evaluations.type").unwrap(),
            &json!("evaluation")
        );
    }

    #[test]
    fn test_every_builtin_group_path_has_one_buckets_marker() {
        for group in builtin_groups() {
            let plan = group.plan(Map::new());
            let markers = plan
                .path
                .segments()
                .iter()
                .filter(|s| **s == PathSegment::GroupBuckets)
                .count();
            assert_eq!(markers, 1, "group {}", group.id);
        }
    }
}
