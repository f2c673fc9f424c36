//! Insight fetcher: analyse a batch of URLs and append one record per URL.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::clients::InsightApiClient;
use crate::models::{iso_timestamp, InsightOutcome, InsightRecord};
use crate::repository::InsightStore;

/// Whole-request failures. Per-URL failures are reported in the results instead.
#[derive(Debug, Error)]
pub enum InsightRequestError {
    #[error("Request body is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("`urls` must be a list")]
    NotAList,
    #[error("`urls` must contain only strings")]
    NonStringUrl,
    #[error("INSIGHT_API_ENDPOINT is not configured")]
    EndpointNotConfigured,
}

/// Extract the URL list from a request event.
///
/// A non-object event counts as empty; a missing `urls` key is an empty list.
pub fn parse_urls(event: &Value) -> Result<Vec<String>, InsightRequestError> {
    let urls = match event.as_object().and_then(|obj| obj.get("urls")) {
        None => return Ok(Vec::new()),
        Some(urls) => urls.as_array().ok_or(InsightRequestError::NotAList)?,
    };

    urls.iter()
        .map(|url| {
            url.as_str()
                .map(str::to_string)
                .ok_or(InsightRequestError::NonStringUrl)
        })
        .collect()
}

/// Parse a raw request body into the URL list.
pub fn parse_body(body: &[u8]) -> Result<Vec<String>, InsightRequestError> {
    let event: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| InsightRequestError::InvalidJson(e.to_string()))?
    };
    parse_urls(&event)
}

/// Fetches insights and records them. Processing is strictly sequential.
#[derive(Clone)]
pub struct InsightService {
    client: Option<InsightApiClient>,
    store: Arc<dyn InsightStore>,
}

impl InsightService {
    pub fn new(client: Option<InsightApiClient>, store: Arc<dyn InsightStore>) -> Self {
        Self { client, store }
    }

    /// Analyse every URL in input order, returning one outcome per URL.
    pub async fn process(&self, urls: &[String]) -> Result<Vec<InsightOutcome>, InsightRequestError> {
        info!(count = urls.len(), "Processing URLs");
        if urls.is_empty() {
            return Ok(Vec::new());
        }
        let client = self
            .client
            .as_ref()
            .ok_or(InsightRequestError::EndpointNotConfigured)?;

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            results.push(self.fetch_one(client, url).await);
        }
        Ok(results)
    }

    async fn fetch_one(&self, client: &InsightApiClient, url: &str) -> InsightOutcome {
        let timestamp = iso_timestamp();

        match client.fetch(url).await {
            Ok(payload) => {
                self.save(InsightRecord::success(url, timestamp, &payload)).await;
                info!(url = %url, status = "ok", "Insight fetched");
                InsightOutcome::ok(url, payload)
            }
            Err(e) => {
                let detail = format!("Failed to call insight API: {}", e);
                self.save(InsightRecord::failure(url, timestamp, detail.clone()))
                    .await;
                warn!(url = %url, status = "error", detail = %detail, "Insight fetch failed");
                InsightOutcome::error(url, detail)
            }
        }
    }

    /// One write attempt. Failures are logged and never reach the caller.
    async fn save(&self, record: InsightRecord) {
        if let Err(e) = self.store.put(&record).await {
            error!(
                url = %record.url,
                timestamp = %record.timestamp,
                status = %record.status(),
                error = %e,
                "Failed to write insight record"
            );
        }
    }
}
