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

//! Current-versus-previous period arithmetic.
//!
//! One combined query spans both periods; the flat per-date results are
//! split back at the day boundary so the caller can compare day over day.

use chrono::Duration;
use tracepulse_core::DatedBucket;
use tracing::warn;

pub const MS_PER_DAY: i64 = 86_400_000;

/// Date range extended with the equal-length previous period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    /// Start of the previous period, epoch milliseconds
    pub previous_start_ms: i64,
    /// Start of the requested period
    pub start_ms: i64,
    /// End of the requested period, possibly snapped to "now"
    pub end_ms: i64,
    /// Whole days covered by the requested period
    pub days_difference: i64,
}

impl PeriodBounds {
    /// Compute the combined bounds for a requested range.
    ///
    /// The day difference and the previous-period start come from the
    /// requested dates; only then is an end date within
    /// `snap_threshold_ms` of `now_ms` snapped forward to `now_ms`, so
    /// live dashboards keep refreshing through the current partial day
    /// without shifting the comparison window.
    pub fn compute(start_ms: i64, end_ms: i64, now_ms: i64, snap_threshold_ms: i64) -> Self {
        let span_ms = (end_ms - start_ms).max(0);
        let days_difference = ((span_ms + MS_PER_DAY - 1) / MS_PER_DAY).max(1);
        let previous_start_ms = start_ms - Duration::days(days_difference).num_milliseconds();
        let end_ms = if now_ms - end_ms < snap_threshold_ms {
            now_ms
        } else {
            end_ms
        };
        Self {
            previous_start_ms,
            start_ms,
            end_ms,
            days_difference,
        }
    }
}

/// Split the ordered per-date sequence into previous/current halves at the
/// day boundary.
///
/// Both halves must end up the same length for a valid day-over-day
/// comparison; a mismatch points at a date-histogram boundary bug and is
/// logged rather than silently tolerated.
pub fn split_periods(
    mut buckets: Vec<DatedBucket>,
    days_difference: i64,
) -> (Vec<DatedBucket>, Vec<DatedBucket>) {
    let split_at = (days_difference.max(0) as usize).min(buckets.len());
    let current = buckets.split_off(split_at);
    if buckets.len() != current.len() {
        warn!(
            previous_len = buckets.len(),
            current_len = current.len(),
            "period halves differ in length; date histogram bounds are off"
        );
    }
    (buckets, current)
}
