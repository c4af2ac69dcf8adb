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

//! Store client boundary.
//!
//! The document store is consumed only through [`SearchClient`]; the
//! aggregation spec and the response tree are opaque JSON on both sides.

pub mod http;

pub use http::HttpSearchClient;

use async_trait::async_trait;
use serde_json::Value;
use tracepulse_core::Result;

/// Search boundary to the external document store.
///
/// Implementations map transport failures and timeouts to
/// `StoreUnavailable` and never retry internally; retries, if any, belong
/// to the caller.
#[async_trait]
pub trait SearchClient: Send + Sync {
    /// Execute one search request and return the raw response body
    async fn search(&self, index: &str, body: &Value) -> Result<Value>;
}
