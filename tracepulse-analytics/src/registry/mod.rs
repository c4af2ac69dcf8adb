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

//! Metric and group lookup tables.
//!
//! Registries are populated once at startup and read-only thereafter. The
//! compiler and extractor receive a registry reference explicitly, so unit
//! tests can pass a minimal fake instead of the built-in catalog.

pub mod groups;
pub mod metrics;

pub use groups::{builtin_groups, GroupDefinition, GroupPlan, GroupSource};
pub use metrics::{
    builtin_metrics, KeyRequirement, MetricDefinition, MetricSource, SeriesPlan,
    SubkeyRequirement,
};

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use tracepulse_core::{AnalyticsError, Result};

/// Immutable metric/group lookup table
pub struct AnalyticsRegistry {
    metrics: BTreeMap<&'static str, MetricDefinition>,
    groups: BTreeMap<&'static str, GroupDefinition>,
}

impl AnalyticsRegistry {
    pub fn new(metrics: Vec<MetricDefinition>, groups: Vec<GroupDefinition>) -> Self {
        Self {
            metrics: metrics.into_iter().map(|m| (m.id, m)).collect(),
            groups: groups.into_iter().map(|g| (g.id, g)).collect(),
        }
    }

    /// Registry holding the full built-in catalog
    pub fn builtin() -> Self {
        Self::new(builtin_metrics(), builtin_groups())
    }

    pub fn get_metric(&self, id: &str) -> Result<&MetricDefinition> {
        self.metrics
            .get(id)
            .ok_or_else(|| AnalyticsError::UnknownMetric(id.to_string()))
    }

    pub fn get_group(&self, id: &str) -> Result<&GroupDefinition> {
        self.groups
            .get(id)
            .ok_or_else(|| AnalyticsError::UnknownGroup(id.to_string()))
    }

    pub fn metric_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.metrics.keys().copied()
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.groups.keys().copied()
    }
}

impl Default for AnalyticsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN: Lazy<AnalyticsRegistry> = Lazy::new(AnalyticsRegistry::builtin);

/// Shared built-in registry
pub fn builtin_registry() -> &'static AnalyticsRegistry {
    &BUILTIN
}
