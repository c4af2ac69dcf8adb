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

//! TracePulse Core
//!
//! Fundamental data structures for trace analytics: the series
//! request/response model, typed extraction paths, configuration and the
//! error taxonomy.

pub mod config;
pub mod error;
pub mod path;
pub mod series;

pub use config::{
    AnalyticsConfig, DEFAULT_PIPELINE_TERMS_SIZE, DEFAULT_SNAP_TO_NOW_THRESHOLD_MS,
    DEFAULT_TIMESTAMP_FIELD, DEFAULT_TRACES_INDEX,
};
pub use error::{AnalyticsError, Result};
pub use path::{leaf_value, walk_segments, ExtractionPath, PathSegment};
pub use series::{
    AggregationKind, BucketValues, DatedBucket, MetadataFilters, PipelineAggregationKind,
    PipelineField, PipelineRequest, SeriesRequest, SharedFilters, TimeseriesRequest,
    TimeseriesResponse,
};
