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

//! TracePulse Analytics Engine
//!
//! Compiles declarative timeseries requests (metric + aggregation +
//! optional grouping + optional pipeline post-aggregation) into nested
//! search-engine aggregation queries, and re-flattens the nested responses
//! back into the shape the caller asked for. The compilation and the
//! extraction share one typed plan per series, so the two sides can never
//! drift apart.

pub mod compiler;
pub mod extractor;
pub mod period;
pub mod pipeline;
pub mod registry;
pub mod store;
pub mod timeseries;

pub use compiler::{CompiledQuery, QueryCompiler, DATE_HISTOGRAM_KEY};
pub use extractor::ResultExtractor;
pub use period::{split_periods, PeriodBounds, MS_PER_DAY};
pub use pipeline::{pipeline_operator, wrap_pipeline};
pub use registry::{
    builtin_registry, AnalyticsRegistry, GroupDefinition, GroupPlan, GroupSource, KeyRequirement,
    MetricDefinition, MetricSource, SeriesPlan, SubkeyRequirement,
};
pub use store::{HttpSearchClient, SearchClient};
pub use timeseries::TimeseriesEngine;
