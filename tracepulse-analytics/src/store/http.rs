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

//! HTTP implementation of the store boundary.

use crate::store::SearchClient;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracepulse_core::{AnalyticsError, Result};
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Search client POSTing to an HTTP `_search` endpoint
pub struct HttpSearchClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSearchClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalyticsError::StoreUnavailable(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SearchClient for HttpSearchClient {
    async fn search(&self, index: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}/_search", self.base_url, index);
        debug!(%url, "issuing search request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| AnalyticsError::StoreUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| AnalyticsError::StoreUnavailable(e.to_string()))?;
        response
            .json::<Value>()
            .await
            .map_err(|e| AnalyticsError::StoreUnavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_stripped() {
        let client = HttpSearchClient::new("http://localhost:9200/").unwrap();
        assert_eq!(client.base_url, "http://localhost:9200");
    }

    #[tokio::test]
    async fn test_unreachable_store_maps_to_store_unavailable() {
        // Reserved TEST-NET address, nothing listens there
        let client =
            HttpSearchClient::with_timeout("http://192.0.2.1:9200", Duration::from_millis(50))
                .unwrap();
        let err = client
            .search("traces-pivot", &serde_json::json!({"size": 0}))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
