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

//! Error taxonomy for the analytics engine.

use thiserror::Error;

/// Errors surfaced by analytics compilation, execution and extraction
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Caller-supplied series data violates a metric's declared requirements.
    /// The message names the offending metric and field.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Requested metric is not registered
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Requested group-by is not registered
    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    /// Requested pipeline aggregation has no store operator
    #[error("Unsupported pipeline aggregation: {0}")]
    UnsupportedPipeline(String),

    /// Compiler and extractor disagreed on the response structure.
    /// Always a bug; the whole response is aborted, never partial numbers.
    #[error("Extraction path mismatch: {0}")]
    ExtractionPathMismatch(String),

    /// Transport failure or timeout from the external store.
    /// Retryable by the caller; never retried internally.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AnalyticsError {
    /// Whether the caller may retry the same request as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalyticsError::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_errors_are_retryable() {
        assert!(AnalyticsError::StoreUnavailable("timeout".into()).is_retryable());
        assert!(!AnalyticsError::BadRequest("missing key".into()).is_retryable());
        assert!(!AnalyticsError::ExtractionPathMismatch("x".into()).is_retryable());
    }

    #[test]
    fn test_display_names_the_metric() {
        let err = AnalyticsError::UnknownMetric("performance.total_cost".into());
        assert_eq!(err.to_string(), "Unknown metric: performance.total_cost");
    }
}
