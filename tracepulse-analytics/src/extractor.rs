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

//! Result extraction.
//!
//! Walks the nested bucket tree returned by the store back into the flat
//! per-date (and per-group) shape the caller asked for, using the very
//! plans the compiler produced. Any structural surprise aborts the whole
//! response; partial or silently-null numbers are never returned.

use crate::registry::{GroupPlan, SeriesPlan};
use serde_json::Value;
use std::collections::BTreeMap;
use tracepulse_core::{
    walk_segments, AnalyticsError, BucketValues, DatedBucket, PathSegment, Result,
};

/// Walks store responses with the plans produced at compile time
pub struct ResultExtractor<'a> {
    plans: &'a [SeriesPlan],
    group: Option<&'a GroupPlan>,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(plans: &'a [SeriesPlan], group: Option<&'a GroupPlan>) -> Self {
        Self { plans, group }
    }

    /// Flatten the ordered per-date bucket list
    pub fn extract(&self, date_buckets: &[Value]) -> Result<Vec<DatedBucket>> {
        date_buckets.iter().map(|b| self.extract_date_bucket(b)).collect()
    }

    fn extract_date_bucket(&self, bucket: &Value) -> Result<DatedBucket> {
        let date = bucket
            .get("key_as_string")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AnalyticsError::ExtractionPathMismatch(
                    "date bucket has no key_as_string".to_string(),
                )
            })?
            .to_string();

        let values = match self.group {
            None => BucketValues::Flat(self.extract_series(bucket, &[])?),
            Some(group) => {
                let (before, after) = group.path.split_at_group_buckets().ok_or_else(|| {
                    AnalyticsError::ExtractionPathMismatch(format!(
                        "group path {} has no buckets marker",
                        group.path
                    ))
                })?;
                let container = walk_segments(before, bucket)?;
                let buckets = container.get("buckets").ok_or_else(|| {
                    AnalyticsError::ExtractionPathMismatch(format!(
                        "could not find buckets for {} group at {}",
                        group.id, group.path
                    ))
                })?;

                let mut entries = BTreeMap::new();
                match buckets {
                    // Terms-style responses carry a bucket list...
                    Value::Array(list) => {
                        for group_bucket in list {
                            let key = bucket_key(group_bucket, &group.id)?;
                            entries.insert(key, self.extract_series(group_bucket, after)?);
                        }
                    }
                    // ...keyed-filter responses a map keyed by group value
                    Value::Object(map) => {
                        for (key, group_bucket) in map {
                            entries.insert(key.clone(), self.extract_series(group_bucket, after)?);
                        }
                    }
                    _ => {
                        return Err(AnalyticsError::ExtractionPathMismatch(format!(
                            "buckets for {} group are neither a list nor a map",
                            group.id
                        )))
                    }
                }
                BucketValues::Grouped(BTreeMap::from([(group.id.clone(), entries)]))
            }
        };

        Ok(DatedBucket { date, values })
    }

    /// Apply every series path inside one (date or group) bucket
    fn extract_series(
        &self,
        bucket: &Value,
        after_buckets: &[PathSegment],
    ) -> Result<BTreeMap<String, f64>> {
        let root = walk_segments(after_buckets, bucket)?;
        let mut flat = BTreeMap::new();
        for plan in self.plans {
            flat.insert(plan.output_key.clone(), plan.path.read_leaf(root)?);
        }
        Ok(flat)
    }
}

fn bucket_key(group_bucket: &Value, group_id: &str) -> Result<String> {
    match group_bucket.get("key") {
        Some(Value::String(key)) => Ok(key.clone()),
        Some(Value::Number(key)) => Ok(key.to_string()),
        _ => Err(AnalyticsError::ExtractionPathMismatch(format!(
            "group bucket for {} has no key",
            group_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{GroupDefinition, GroupSource, MetricDefinition, MetricSource};
    use serde_json::{json, Map};
    use tracepulse_core::{AggregationKind, ExtractionPath};

    fn cost_plan() -> SeriesPlan {
        MetricDefinition {
            id: "metric",
            label: "Metric",
            allowed_aggregations: &[AggregationKind::Sum],
            requires_key: None,
            requires_subkey: None,
            source: MetricSource::Field { field: "doc.value" },
        }
        .plan(AggregationKind::Sum, None, None)
        .unwrap()
    }

    fn model_group_plan() -> GroupPlan {
        GroupDefinition {
            id: "metadata.model",
            label: "Model",
            source: GroupSource::Terms { field: "spans.model", size: 100 },
        }
        .plan(Map::new())
    }

    #[test]
    fn test_flat_extraction() {
        let plans = vec![cost_plan()];
        let extractor = ResultExtractor::new(&plans, None);
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "key": 1_709_251_200_000i64,
            "metric/sum": {"value": 12.5},
        })];
        let result = extractor.extract(&buckets).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].date, "2024-03-01");
        assert_eq!(
            result[0].values.as_flat().unwrap().get("metric/sum"),
            Some(&12.5)
        );
    }

    #[test]
    fn test_grouped_extraction_over_bucket_list() {
        let plans = vec![cost_plan()];
        let group = model_group_plan();
        let extractor = ResultExtractor::new(&plans, Some(&group));
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "metadata.model": {
                "buckets": [
                    {"key": "gpt-4", "metric/sum": {"value": 10.0}},
                    {"key": "gpt-3.5", "metric/sum": {"value": 5.0}},
                ],
            },
        })];
        let result = extractor.extract(&buckets).unwrap();
        let groups = result[0].values.as_grouped().unwrap();
        let by_model = groups.get("metadata.model").unwrap();
        assert_eq!(by_model.get("gpt-4").unwrap().get("metric/sum"), Some(&10.0));
        assert_eq!(by_model.get("gpt-3.5").unwrap().get("metric/sum"), Some(&5.0));
    }

    #[test]
    fn test_grouped_extraction_over_keyed_map() {
        let plans = vec![cost_plan()];
        let group = model_group_plan();
        let extractor = ResultExtractor::new(&plans, Some(&group));
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "metadata.model": {
                "buckets": {
                    "gpt-4": {"metric/sum": {"value": 10.0}},
                    "gpt-3.5": {"metric/sum": {"value": 5.0}},
                },
            },
        })];
        let result = extractor.extract(&buckets).unwrap();
        let by_model = result[0].values.as_grouped().unwrap().get("metadata.model").unwrap();
        assert_eq!(by_model.len(), 2);
        assert_eq!(by_model.get("gpt-4").unwrap().get("metric/sum"), Some(&10.0));
    }

    #[test]
    fn test_numeric_group_keys_become_strings() {
        let plans = vec![cost_plan()];
        let group = model_group_plan();
        let extractor = ResultExtractor::new(&plans, Some(&group));
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "metadata.model": {
                "buckets": [{"key": 404, "metric/sum": {"value": 1.0}}],
            },
        })];
        let result = extractor.extract(&buckets).unwrap();
        let by_model = result[0].values.as_grouped().unwrap().get("metadata.model").unwrap();
        assert!(by_model.contains_key("404"));
    }

    #[test]
    fn test_segments_after_the_buckets_marker_are_descended() {
        let plans = vec![cost_plan()];
        // filtered groups nest the series under a child aggregation
        // inside every group bucket
        let group = GroupPlan {
            id: "evaluations.state".to_string(),
            aggs: Map::new(),
            path: ExtractionPath::new()
                .key("evaluations.state")
                .group_buckets()
                .key("child"),
        };
        let extractor = ResultExtractor::new(&plans, Some(&group));
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "evaluations.state": {
                "buckets": [
                    {"key": "succeeded", "child": {"metric/sum": {"value": 3.0}}},
                    {"key": "failed", "child": {"metric/sum": {"value": 1.0}}},
                ],
            },
        })];
        let result = extractor.extract(&buckets).unwrap();
        let by_state = result[0].values.as_grouped().unwrap().get("evaluations.state").unwrap();
        assert_eq!(by_state.get("succeeded").unwrap().get("metric/sum"), Some(&3.0));
        assert_eq!(by_state.get("failed").unwrap().get("metric/sum"), Some(&1.0));

        // a group bucket missing the child node aborts the response
        let broken = vec![json!({
            "key_as_string": "2024-03-01",
            "evaluations.state": {
                "buckets": [{"key": "succeeded", "metric/sum": {"value": 3.0}}],
            },
        })];
        assert!(matches!(
            extractor.extract(&broken),
            Err(AnalyticsError::ExtractionPathMismatch(_))
        ));
    }

    #[test]
    fn test_missing_bucket_list_is_a_loud_mismatch() {
        let plans = vec![cost_plan()];
        let group = model_group_plan();
        let extractor = ResultExtractor::new(&plans, Some(&group));
        let buckets = vec![json!({
            "key_as_string": "2024-03-01",
            "metadata.model": {},
        })];
        let err = extractor.extract(&buckets).unwrap_err();
        assert!(matches!(err, AnalyticsError::ExtractionPathMismatch(_)));
        assert!(err.to_string().contains("metadata.model"));
    }

    #[test]
    fn test_missing_series_value_aborts_the_response() {
        let plans = vec![cost_plan()];
        let extractor = ResultExtractor::new(&plans, None);
        let buckets = vec![json!({"key_as_string": "2024-03-01"})];
        assert!(matches!(
            extractor.extract(&buckets),
            Err(AnalyticsError::ExtractionPathMismatch(_))
        ));
    }
}
