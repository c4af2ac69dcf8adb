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

//! Pipeline aggregation translation.
//!
//! A pipeline series is compiled into two stages: an inner terms bucketing
//! over the pipeline's identity field wrapping the metric's normal
//! aggregation, and a sibling pipeline aggregation referencing the inner
//! bucket path. Missing buckets are filled with zero (not null) so gaps
//! never propagate into cumulative sums.

use crate::registry::SeriesPlan;
use serde_json::{json, Map};
use tracepulse_core::{AggregationKind, ExtractionPath, PipelineAggregationKind, PipelineRequest};

/// Store operator implementing a pipeline aggregation
pub fn pipeline_operator(kind: PipelineAggregationKind) -> &'static str {
    match kind {
        PipelineAggregationKind::Sum => "sum_bucket",
        PipelineAggregationKind::Avg => "avg_bucket",
        PipelineAggregationKind::Min => "min_bucket",
        PipelineAggregationKind::Max => "max_bucket",
        PipelineAggregationKind::CumulativeSum => "cumulative_sum",
    }
}

/// Wrap a metric plan into the two-stage pipeline form.
///
/// The inner stage is keyed `<metric>.<aggregation>.<field>`, the sibling
/// stage `<metric>/<aggregation>/<field>/<pipelineAggregation>`; the
/// sibling key becomes both the extraction path and the output key.
pub fn wrap_pipeline(
    plan: SeriesPlan,
    metric_id: &str,
    aggregation: AggregationKind,
    pipeline: &PipelineRequest,
    terms_size: usize,
) -> SeriesPlan {
    let inner_key = format!("{}.{}.{}", metric_id, aggregation, pipeline.field);
    let sibling_key = format!(
        "{}/{}/{}/{}",
        metric_id, aggregation, pipeline.field, pipeline.aggregation
    );

    let inner = json!({
        "terms": {
            "field": pipeline.field.store_field(),
            "size": terms_size,
        },
        "aggs": Map::from_iter(plan.aggs),
    });
    let sibling = json!({
        pipeline_operator(pipeline.aggregation): {
            "buckets_path": format!("{}>{}", inner_key, plan.path.to_buckets_path()),
            "gap_policy": "insert_zeros",
        },
    });

    let mut aggs = Map::new();
    aggs.insert(inner_key, inner);
    aggs.insert(sibling_key.clone(), sibling);

    SeriesPlan {
        aggs,
        path: ExtractionPath::from_keys([sibling_key.clone()]),
        output_key: sibling_key,
    }
}
