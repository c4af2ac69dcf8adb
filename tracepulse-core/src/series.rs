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

//! Request and response model for timeseries analytics calls.
//!
//! A "series" is one requested metric + aggregation (+ optional key/subkey
//! and pipeline post-aggregation) within a single analytics call. Requests
//! are created per API call and discarded after the response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// First-stage aggregation applied to a metric's document field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Cardinality,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 5] = [
        AggregationKind::Cardinality,
        AggregationKind::Sum,
        AggregationKind::Avg,
        AggregationKind::Min,
        AggregationKind::Max,
    ];

    /// Store operator name
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Cardinality => "cardinality",
            AggregationKind::Sum => "sum",
            AggregationKind::Avg => "avg",
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Second-stage aggregation computed over per-entity buckets.
///
/// Distinct namespace from [`AggregationKind`] even though names overlap;
/// `cumulative_sum` has no first-stage analog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineAggregationKind {
    Sum,
    Avg,
    Min,
    Max,
    CumulativeSum,
}

impl PipelineAggregationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineAggregationKind::Sum => "sum",
            PipelineAggregationKind::Avg => "avg",
            PipelineAggregationKind::Min => "min",
            PipelineAggregationKind::Max => "max",
            PipelineAggregationKind::CumulativeSum => "cumulative_sum",
        }
    }
}

impl fmt::Display for PipelineAggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity field a pipeline aggregation buckets by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineField {
    TraceId,
    UserId,
    ThreadId,
    CustomerId,
}

impl PipelineField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineField::TraceId => "trace_id",
            PipelineField::UserId => "user_id",
            PipelineField::ThreadId => "thread_id",
            PipelineField::CustomerId => "customer_id",
        }
    }

    /// Concrete document field backing this identity
    pub fn store_field(&self) -> &'static str {
        match self {
            PipelineField::TraceId => "trace.trace_id",
            PipelineField::UserId => "trace.metadata.user_id",
            PipelineField::ThreadId => "trace.metadata.thread_id",
            PipelineField::CustomerId => "trace.metadata.customer_id",
        }
    }
}

impl fmt::Display for PipelineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline post-aggregation attached to a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub field: PipelineField,
    pub aggregation: PipelineAggregationKind,
}

/// One requested series within an analytics call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub metric: String,
    pub aggregation: AggregationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineRequest>,
}

impl SeriesRequest {
    pub fn new(metric: impl Into<String>, aggregation: AggregationKind) -> Self {
        Self {
            metric: metric.into(),
            aggregation,
            key: None,
            subkey: None,
            pipeline: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_subkey(mut self, subkey: impl Into<String>) -> Self {
        self.subkey = Some(subkey.into());
        self
    }

    pub fn with_pipeline(mut self, field: PipelineField, aggregation: PipelineAggregationKind) -> Self {
        self.pipeline = Some(PipelineRequest { field, aggregation });
        self
    }
}

/// Metadata term filters owned by the caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

/// Filter predicates shared by every analytics call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: MetadataFilters,
}

/// Caller-facing timeseries request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesRequest {
    pub project_id: String,
    /// Range start, epoch milliseconds
    pub start_date: i64,
    /// Range end, epoch milliseconds
    pub end_date: i64,
    #[serde(default)]
    pub filters: SharedFilters,
    pub series: Vec<SeriesRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

/// Per-series numeric values of one date bucket.
///
/// Flat when no group-by was requested; grouped otherwise, keyed first by
/// the group id and then by each group value (e.g. model name).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BucketValues {
    Flat(BTreeMap<String, f64>),
    Grouped(BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>),
}

impl BucketValues {
    pub fn as_flat(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            BucketValues::Flat(values) => Some(values),
            BucketValues::Grouped(_) => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&BTreeMap<String, BTreeMap<String, BTreeMap<String, f64>>>> {
        match self {
            BucketValues::Flat(_) => None,
            BucketValues::Grouped(groups) => Some(groups),
        }
    }
}

/// One date bucket of the flattened result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedBucket {
    pub date: String,
    #[serde(flatten)]
    pub values: BucketValues,
}

/// Caller-facing timeseries response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesResponse {
    pub previous_period: Vec<DatedBucket>,
    pub current_period: Vec<DatedBucket>,
}
