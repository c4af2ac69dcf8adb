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

//! Metric definitions.
//!
//! Each metric declares its allowed aggregations, key/subkey requirements
//! and the document field(s) it aggregates over. `plan()` produces the
//! store aggregation spec and its extraction path together, from the same
//! source data, so the compiler and the extractor cannot drift apart.

use serde_json::{json, Map, Value};
use tracepulse_core::{AggregationKind, AnalyticsError, ExtractionPath, Result};

/// Key requirement declared by a metric
#[derive(Debug, Clone, Copy)]
pub struct KeyRequirement {
    /// Filter field the key is matched against in the UI
    pub filter: &'static str,
    /// When true, a missing key falls back to the unfiltered field
    pub optional: bool,
}

/// Subkey requirement declared by a metric
#[derive(Debug, Clone, Copy)]
pub struct SubkeyRequirement {
    pub filter: &'static str,
}

/// Where a metric's numbers come from.
///
/// The single source of truth for both the aggregation spec and the
/// extraction path.
#[derive(Debug, Clone, Copy)]
pub enum MetricSource {
    /// Plain stat/cardinality aggregation over one document field
    Field { field: &'static str },
    /// A `filter` aggregation on `term_field == key` wrapping the stat
    /// aggregation over `value_field`
    KeyedFilter {
        term_field: &'static str,
        value_field: &'static str,
    },
    /// Two nested `filter` aggregations (key, then subkey) wrapping the
    /// stat aggregation over `value_field`
    SubkeyedFilter {
        key_field: &'static str,
        subkey_field: &'static str,
        value_field: &'static str,
    },
}

/// Immutable metric definition, registered once at startup
#[derive(Debug, Clone, Copy)]
pub struct MetricDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub allowed_aggregations: &'static [AggregationKind],
    pub requires_key: Option<KeyRequirement>,
    pub requires_subkey: Option<SubkeyRequirement>,
    pub source: MetricSource,
}

/// Aggregation spec plus the matching extraction path for one series
#[derive(Debug, Clone)]
pub struct SeriesPlan {
    /// Composite-keyed aggregation mapping to merge into the search request
    pub aggs: Map<String, Value>,
    /// Path from a date (or group) bucket down to the numeric leaf
    pub path: ExtractionPath,
    /// Key the value is reported under in the flat result
    pub output_key: String,
}

impl MetricDefinition {
    /// Validate a series request against this metric and produce its plan.
    ///
    /// Fails with `BadRequest` naming the metric when a required key or
    /// subkey is missing, or when the aggregation is not allowed.
    pub fn plan(
        &self,
        aggregation: AggregationKind,
        key: Option<&str>,
        subkey: Option<&str>,
    ) -> Result<SeriesPlan> {
        if !self.allowed_aggregations.contains(&aggregation) {
            return Err(AnalyticsError::BadRequest(format!(
                "Aggregation {} is not allowed for metric {}",
                aggregation, self.id
            )));
        }
        if let Some(requirement) = &self.requires_key {
            if !requirement.optional && key.is_none() {
                return Err(AnalyticsError::BadRequest(format!(
                    "Metric {} requires a key to be defined",
                    self.id
                )));
            }
        }
        if self.requires_subkey.is_some() && subkey.is_none() {
            return Err(AnalyticsError::BadRequest(format!(
                "Metric {} requires a subkey to be defined",
                self.id
            )));
        }

        let output_key = format!("{}/{}", self.id, aggregation);
        let operator = aggregation.as_str();

        let (root_key, spec, path) = match (self.source, key) {
            (MetricSource::Field { field }, _) | (MetricSource::KeyedFilter { value_field: field, .. }, None) => {
                // Optional-key metrics without a key aggregate the bare field
                let root_key = output_key.clone();
                let spec = json!({ operator: { "field": field } });
                let path = ExtractionPath::from_keys([root_key.clone()]);
                (root_key, spec, path)
            }
            (MetricSource::KeyedFilter { term_field, value_field }, Some(key)) => {
                let root_key = format!("{}/{}", output_key, key);
                let spec = json!({
                    "filter": { "term": { term_field: key } },
                    "aggs": { "metric": { operator: { "field": value_field } } },
                });
                let path = ExtractionPath::from_keys([root_key.as_str(), "metric"]);
                (root_key, spec, path)
            }
            (MetricSource::SubkeyedFilter { key_field, subkey_field, value_field }, key) => {
                // requires_subkey implies requires_key for the catalog below
                let key = key.ok_or_else(|| {
                    AnalyticsError::BadRequest(format!(
                        "Metric {} requires a key to be defined",
                        self.id
                    ))
                })?;
                let subkey = subkey.unwrap_or_default();
                let root_key = format!("{}/{}/{}", output_key, key, subkey);
                let spec = json!({
                    "filter": { "term": { key_field: key } },
                    "aggs": {
                        "subkey": {
                            "filter": { "term": { subkey_field: subkey } },
                            "aggs": { "metric": { operator: { "field": value_field } } },
                        }
                    },
                });
                let path = ExtractionPath::from_keys([root_key.as_str(), "subkey", "metric"]);
                (root_key, spec, path)
            }
        };

        let mut aggs = Map::new();
        aggs.insert(root_key, spec);
        Ok(SeriesPlan { aggs, path, output_key })
    }
}

const STAT_AGGREGATIONS: &[AggregationKind] = &[
    AggregationKind::Sum,
    AggregationKind::Avg,
    AggregationKind::Min,
    AggregationKind::Max,
];

const SPREAD_AGGREGATIONS: &[AggregationKind] = &[
    AggregationKind::Avg,
    AggregationKind::Min,
    AggregationKind::Max,
];

/// Built-in metric catalog
pub fn builtin_metrics() -> Vec<MetricDefinition> {
    vec![
        MetricDefinition {
            id: "metadata.trace_id",
            label: "Messages",
            allowed_aggregations: &[AggregationKind::Cardinality],
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.trace_id" },
        },
        MetricDefinition {
            id: "metadata.user_id",
            label: "Users",
            allowed_aggregations: &[AggregationKind::Cardinality],
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metadata.user_id" },
        },
        MetricDefinition {
            id: "metadata.thread_id",
            label: "Threads",
            allowed_aggregations: &[AggregationKind::Cardinality],
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metadata.thread_id" },
        },
        MetricDefinition {
            id: "performance.total_cost",
            label: "Total Cost",
            allowed_aggregations: STAT_AGGREGATIONS,
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metrics.total_cost" },
        },
        MetricDefinition {
            id: "performance.prompt_tokens",
            label: "Prompt Tokens",
            allowed_aggregations: STAT_AGGREGATIONS,
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metrics.prompt_tokens" },
        },
        MetricDefinition {
            id: "performance.completion_tokens",
            label: "Completion Tokens",
            allowed_aggregations: STAT_AGGREGATIONS,
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metrics.completion_tokens" },
        },
        MetricDefinition {
            id: "performance.total_time_ms",
            label: "Total Duration",
            allowed_aggregations: SPREAD_AGGREGATIONS,
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metrics.total_time_ms" },
        },
        MetricDefinition {
            id: "performance.first_token_ms",
            label: "Time to First Token",
            allowed_aggregations: SPREAD_AGGREGATIONS,
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "trace.metrics.first_token_ms" },
        },
        MetricDefinition {
            id: "evaluations.evaluation_score",
            label: "Evaluation Score",
            allowed_aggregations: SPREAD_AGGREGATIONS,
            requires_key: Some(KeyRequirement {
                filter: "evaluations.evaluation_id",
                optional: true,
            }),
            requires_subkey: None,
            source: MetricSource::KeyedFilter {
                term_field: "evaluations.evaluation_id",
                value_field: "evaluations.score",
            },
        },
        MetricDefinition {
            id: "events.event_score",
            label: "Event Metric",
            allowed_aggregations: STAT_AGGREGATIONS,
            requires_key: Some(KeyRequirement {
                filter: "events.event_type",
                optional: false,
            }),
            requires_subkey: Some(SubkeyRequirement {
                filter: "events.metrics.key",
            }),
            source: MetricSource::SubkeyedFilter {
                key_field: "events.event_type",
                subkey_field: "events.metrics.key",
                value_field: "events.metrics.value",
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(id: &str) -> MetricDefinition {
        builtin_metrics()
            .into_iter()
            .find(|m| m.id == id)
            .unwrap_or_else(|| panic!("metric {} not in catalog", id))
    }

    #[test]
    fn test_plain_field_plan() {
        let plan = metric("performance.total_cost")
            .plan(AggregationKind::Sum, None, None)
            .unwrap();
        assert_eq!(plan.output_key, "performance.total_cost/sum");
        assert_eq!(
            plan.aggs.get("performance.total_cost/sum").unwrap(),
            &json!({"sum": {"field": "trace.metrics.total_cost"}})
        );
        assert_eq!(plan.path.to_buckets_path(), "performance.total_cost/sum");
    }

    #[test]
    fn test_disallowed_aggregation_is_bad_request() {
        let err = metric("metadata.trace_id")
            .plan(AggregationKind::Sum, None, None)
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::BadRequest(_)));
        assert!(err.to_string().contains("metadata.trace_id"));
    }

    #[test]
    fn test_missing_required_key_is_bad_request() {
        let err = metric("events.event_score")
            .plan(AggregationKind::Sum, None, Some("score"))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::BadRequest(_)));
        assert!(err.to_string().contains("events.event_score"));
    }

    #[test]
    fn test_missing_subkey_is_bad_request() {
        let err = metric("events.event_score")
            .plan(AggregationKind::Sum, Some("thumbs_up_down"), None)
            .unwrap_err();
        assert!(err.to_string().contains("requires a subkey"));
    }

    #[test]
    fn test_keyed_plan_wraps_a_filter_layer() {
        let plan = metric("evaluations.evaluation_score")
            .plan(AggregationKind::Avg, Some("eval-1"), None)
            .unwrap();
        let root = "evaluations.evaluation_score/avg/eval-1";
        assert_eq!(
            plan.aggs.get(root).unwrap(),
            &json!({
                "filter": {"term": {"evaluations.evaluation_id": "eval-1"}},
                "aggs": {"metric": {"avg": {"field": "evaluations.score"}}},
            })
        );
        assert_eq!(plan.path.to_buckets_path(), format!("{}>metric", root));
        assert_eq!(plan.output_key, "evaluations.evaluation_score/avg");
    }

    #[test]
    fn test_optional_key_falls_back_to_bare_field() {
        let plan = metric("evaluations.evaluation_score")
            .plan(AggregationKind::Avg, None, None)
            .unwrap();
        assert_eq!(
            plan.aggs.get("evaluations.evaluation_score/avg").unwrap(),
            &json!({"avg": {"field": "evaluations.score"}})
        );
    }

    #[test]
    fn test_subkeyed_plan_nests_two_filters() {
        let plan = metric("events.event_score")
            .plan(AggregationKind::Sum, Some("thumbs_up_down"), Some("vote"))
            .unwrap();
        let root = "events.event_score/sum/thumbs_up_down/vote";
        assert_eq!(plan.path.to_buckets_path(), format!("{}>subkey>metric", root));
        let spec = plan.aggs.get(root).unwrap();
        assert_eq!(
            spec.pointer("/filter/term/events.event_type").unwrap(),
            &json!("thumbs_up_down")
        );
        assert_eq!(
            spec.pointer("/aggs/subkey/aggs/metric/sum/field").unwrap(),
            &json!("events.metrics.value")
        );
    }

    // Compiler/extractor round-trip: executing the spec shape against a
    // store returning {value: v} at the deepest level and walking the
    // plan's path must yield v.
    #[test]
    fn test_plan_round_trip_for_every_builtin_metric() {
        for metric in builtin_metrics() {
            for &aggregation in metric.allowed_aggregations {
                let plan = metric
                    .plan(aggregation, Some("some-key"), Some("some-subkey"))
                    .unwrap();
                let response = synthesize_response(&plan.aggs, 7.5);
                assert_eq!(
                    plan.path.read_leaf(&response).unwrap(),
                    7.5,
                    "round trip failed for {}/{}",
                    metric.id,
                    aggregation
                );
            }
        }
    }

    /// Build the response bucket the store would produce for a spec,
    /// placing `{value: v}` at the deepest aggregation
    fn synthesize_response(aggs: &Map<String, Value>, v: f64) -> Value {
        let mut bucket = Map::new();
        for (name, spec) in aggs {
            bucket.insert(name.clone(), synthesize_node(spec, v));
        }
        Value::Object(bucket)
    }

    fn synthesize_node(spec: &Value, v: f64) -> Value {
        match spec.get("aggs").and_then(Value::as_object) {
            Some(children) => {
                let mut node = Map::new();
                node.insert("doc_count".to_string(), json!(1));
                for (name, child) in children {
                    node.insert(name.clone(), synthesize_node(child, v));
                }
                Value::Object(node)
            }
            None => json!({"value": v}),
        }
    }
}
