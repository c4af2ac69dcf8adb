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

//! Timeseries orchestration.
//!
//! One request is one synchronous-looking call chain: compute the combined
//! period, compile the query, await the store, extract, split. No state is
//! shared across requests beyond the read-only registry, so concurrent
//! calls never interact.

use crate::compiler::{QueryCompiler, DATE_HISTOGRAM_KEY};
use crate::extractor::ResultExtractor;
use crate::period::{split_periods, PeriodBounds};
use crate::registry::AnalyticsRegistry;
use crate::store::SearchClient;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracepulse_core::{
    AnalyticsConfig, AnalyticsError, Result, TimeseriesRequest, TimeseriesResponse,
};
use tracing::{debug, info};

/// End-to-end timeseries analytics engine
pub struct TimeseriesEngine {
    client: Arc<dyn SearchClient>,
    registry: Arc<AnalyticsRegistry>,
    config: AnalyticsConfig,
}

impl TimeseriesEngine {
    pub fn new(
        client: Arc<dyn SearchClient>,
        registry: Arc<AnalyticsRegistry>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Run one analytics call: either the full
    /// `{previousPeriod, currentPeriod}` response or a failure, never
    /// partial numbers.
    pub async fn timeseries(&self, request: &TimeseriesRequest) -> Result<TimeseriesResponse> {
        self.timeseries_at(request, Utc::now().timestamp_millis())
            .await
    }

    /// Same as [`timeseries`](Self::timeseries) with an explicit "now",
    /// which the snapping rule compares end dates against
    pub async fn timeseries_at(
        &self,
        request: &TimeseriesRequest,
        now_ms: i64,
    ) -> Result<TimeseriesResponse> {
        let bounds = PeriodBounds::compute(
            request.start_date,
            request.end_date,
            now_ms,
            self.config.snap_to_now_threshold_ms,
        );
        let compiler = QueryCompiler::new(&self.registry, &self.config);
        let compiled = compiler.compile(request, &bounds)?;
        debug!(
            project_id = %request.project_id,
            series = request.series.len(),
            group_by = request.group_by.as_deref().unwrap_or("-"),
            days = bounds.days_difference,
            "compiled timeseries query"
        );

        let response = self.client.search(&self.config.index, &compiled.body).await?;
        let buckets = response
            .pointer(&format!("/aggregations/{}/buckets", DATE_HISTOGRAM_KEY))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                AnalyticsError::ExtractionPathMismatch(format!(
                    "store response carries no {} buckets",
                    DATE_HISTOGRAM_KEY
                ))
            })?;

        let extractor = ResultExtractor::new(&compiled.plans, compiled.group.as_ref());
        let dated = extractor.extract(buckets)?;
        info!(
            project_id = %request.project_id,
            buckets = dated.len(),
            "timeseries extracted"
        );

        let (previous_period, current_period) = split_periods(dated, bounds.days_difference);
        Ok(TimeseriesResponse {
            previous_period,
            current_period,
        })
    }
}
