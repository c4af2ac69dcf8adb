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

//! Query compilation.
//!
//! Turns a list of requested series (plus optional group-by) into one
//! composite aggregation query under an outer date histogram, together
//! with the filter clause of the search request. All validation happens
//! here, before any store call.

use crate::period::PeriodBounds;
use crate::pipeline::wrap_pipeline;
use crate::registry::{AnalyticsRegistry, GroupPlan, SeriesPlan};
use serde_json::{json, Map, Value};
use tracepulse_core::{AnalyticsConfig, AnalyticsError, Result, TimeseriesRequest};

/// Aggregation name of the outer date histogram
pub const DATE_HISTOGRAM_KEY: &str = "traces_per_day";

/// Compiled search request plus the plans needed to walk its response
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    /// Full search body: `{size, query, aggs}`
    pub body: Value,
    pub plans: Vec<SeriesPlan>,
    pub group: Option<GroupPlan>,
}

/// Compiles timeseries requests against an immutable registry
pub struct QueryCompiler<'a> {
    registry: &'a AnalyticsRegistry,
    config: &'a AnalyticsConfig,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(registry: &'a AnalyticsRegistry, config: &'a AnalyticsConfig) -> Self {
        Self { registry, config }
    }

    /// Validate and compile a request. Fails fast on the first violation;
    /// nothing is sent to the store on error.
    pub fn compile(
        &self,
        request: &TimeseriesRequest,
        bounds: &PeriodBounds,
    ) -> Result<CompiledQuery> {
        let mut plans = Vec::with_capacity(request.series.len());
        let mut composite = Map::new();

        for series in &request.series {
            let metric = self.registry.get_metric(&series.metric)?;
            let mut plan = metric.plan(
                series.aggregation,
                series.key.as_deref(),
                series.subkey.as_deref(),
            )?;
            if let Some(pipeline) = &series.pipeline {
                plan = wrap_pipeline(
                    plan,
                    &series.metric,
                    series.aggregation,
                    pipeline,
                    self.config.pipeline_terms_size,
                );
            }
            for (name, spec) in &plan.aggs {
                if composite.insert(name.clone(), spec.clone()).is_some() {
                    // Composite keys embed the full series identity, so a
                    // collision means the caller sent the same series twice
                    return Err(AnalyticsError::BadRequest(format!(
                        "Duplicate series {} in request",
                        name
                    )));
                }
            }
            plans.push(plan);
        }

        let (group, aggs) = match &request.group_by {
            Some(group_id) => {
                let plan = self.registry.get_group(group_id)?.plan(composite);
                let aggs = plan.aggs.clone();
                (Some(plan), aggs)
            }
            None => (None, composite),
        };

        let body = json!({
            "size": 0,
            "query": { "bool": { "filter": self.filter_conditions(request, bounds) } },
            "aggs": {
                DATE_HISTOGRAM_KEY: {
                    "date_histogram": {
                        "field": self.config.timestamp_field,
                        "calendar_interval": self.config.histogram_interval,
                        "format": self.config.date_format,
                        "min_doc_count": 0,
                        "extended_bounds": {
                            "min": bounds.previous_start_ms,
                            "max": bounds.end_ms,
                        },
                    },
                    "aggs": Value::Object(aggs),
                }
            }
        });

        Ok(CompiledQuery { body, plans, group })
    }

    /// Filter clause: project scope, combined-period time range and the
    /// caller's metadata/topic terms
    fn filter_conditions(&self, request: &TimeseriesRequest, bounds: &PeriodBounds) -> Vec<Value> {
        let mut conditions = vec![
            json!({ "term": { "trace.project_id": request.project_id } }),
            json!({
                "range": {
                    self.config.timestamp_field.as_str(): {
                        "gte": bounds.previous_start_ms,
                        "lte": bounds.end_ms,
                        "format": "epoch_millis",
                    }
                }
            }),
        ];

        let metadata = &request.filters.metadata;
        if let Some(user_id) = &metadata.user_id {
            conditions.push(json!({ "terms": { "trace.metadata.user_id": user_id } }));
        }
        if let Some(thread_id) = &metadata.thread_id {
            conditions.push(json!({ "terms": { "trace.metadata.thread_id": thread_id } }));
        }
        if let Some(customer_id) = &metadata.customer_id {
            conditions.push(json!({ "terms": { "trace.metadata.customer_id": customer_id } }));
        }
        if let Some(labels) = &metadata.labels {
            conditions.push(json!({ "terms": { "trace.metadata.labels": labels } }));
        }
        if let Some(topics) = &request.filters.topics {
            conditions.push(json!({ "terms": { "trace.metadata.topics": topics } }));
        }

        conditions
    }
}
