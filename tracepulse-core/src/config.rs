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

//! Configuration for the analytics query layer.

use serde::{Deserialize, Serialize};

/// Default index holding the pivoted trace documents
pub const DEFAULT_TRACES_INDEX: &str = "traces-pivot";

/// Default timestamp field driving the date histogram
pub const DEFAULT_TIMESTAMP_FIELD: &str = "trace.timestamps.started_at";

/// Cardinality cap for the inner terms bucketing of pipeline aggregations
pub const DEFAULT_PIPELINE_TERMS_SIZE: usize = 10_000;

/// End dates closer than this to "now" are snapped forward to "now",
/// keeping live dashboards refreshing through the current partial day
pub const DEFAULT_SNAP_TO_NOW_THRESHOLD_MS: i64 = 60 * 60 * 1000;

/// Settings shared by the query compiler, extractor and engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Index the search request is issued against
    pub index: String,
    /// Document field holding the trace start timestamp
    pub timestamp_field: String,
    /// Calendar interval of the outer date histogram
    pub histogram_interval: String,
    /// Date format the store renders bucket keys with
    pub date_format: String,
    /// Distinct-bucket cap for pipeline terms aggregations
    pub pipeline_terms_size: usize,
    /// Snap-to-now window for near-live end dates, milliseconds
    pub snap_to_now_threshold_ms: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_TRACES_INDEX.to_string(),
            timestamp_field: DEFAULT_TIMESTAMP_FIELD.to_string(),
            histogram_interval: "1d".to_string(),
            date_format: "yyyy-MM-dd".to_string(),
            pipeline_terms_size: DEFAULT_PIPELINE_TERMS_SIZE,
            snap_to_now_threshold_ms: DEFAULT_SNAP_TO_NOW_THRESHOLD_MS,
        }
    }
}

impl AnalyticsConfig {
    /// Config pointed at a non-default index
    pub fn for_index(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            ..Self::default()
        }
    }
}
