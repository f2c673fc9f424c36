//! PageSpeed Insights v5 client.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::http_client::{append_query, build_client};
use crate::extract::number_at;
use crate::models::{PerformanceMetrics, Strategy, StrategyReport};

/// Errors from one PageSpeed run. Any of them fails the whole report.
#[derive(Debug, Error)]
pub enum PageSpeedError {
    #[error("Failed to call PageSpeed Insights: {0}")]
    Transport(String),
    #[error("Failed to call PageSpeed Insights: HTTP Error {0}")]
    Status(reqwest::StatusCode),
    #[error("Invalid PageSpeed response: {0}")]
    Decode(String),
    #[error("Performance score missing from PageSpeed response")]
    MissingScore,
}

const SCORE_PATH: [&str; 4] = ["lighthouseResult", "categories", "performance", "score"];

/// Runs Lighthouse through the PageSpeed API, one strategy per call.
#[derive(Clone)]
pub struct PageSpeedClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl PageSpeedClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Request URL for one run. The API key is appended as given.
    pub fn request_url(&self, url: &str, strategy: Strategy) -> String {
        let request_url = append_query(&self.endpoint, "url", url);
        let request_url = append_query(&request_url, "strategy", strategy.as_str());
        match &self.api_key {
            Some(key) => format!("{}&key={}", request_url, key),
            None => request_url,
        }
    }

    /// Run one strategy against `url`.
    pub async fn run(&self, url: &str, strategy: Strategy) -> Result<StrategyReport, PageSpeedError> {
        debug!(url = %url, strategy = %strategy, "Calling PageSpeed Insights");

        let resp = self
            .client
            .get(self.request_url(url, strategy))
            .send()
            .await
            .map_err(|e| PageSpeedError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PageSpeedError::Status(resp.status()));
        }

        let payload: Value = resp
            .json()
            .await
            .map_err(|e| PageSpeedError::Decode(e.to_string()))?;

        parse_report(&payload, strategy)
    }
}

/// Pull the performance score and timing audits out of a Lighthouse payload.
///
/// The score is required; each audit is optional.
pub fn parse_report(payload: &Value, strategy: Strategy) -> Result<StrategyReport, PageSpeedError> {
    let score = number_at(payload, &SCORE_PATH).ok_or(PageSpeedError::MissingScore)?;
    let metric = |audit: &str| number_at(payload, &["lighthouseResult", "audits", audit, "numericValue"]);

    Ok(StrategyReport {
        strategy,
        score,
        metrics: PerformanceMetrics {
            first_contentful_paint_ms: metric("first-contentful-paint"),
            largest_contentful_paint_ms: metric("largest-contentful-paint"),
            speed_index_ms: metric("speed-index"),
            total_blocking_time_ms: metric("total-blocking-time"),
            time_to_interactive_ms: metric("interactive"),
            cumulative_layout_shift: metric("cumulative-layout-shift"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lighthouse(score: Value) -> Value {
        json!({
            "lighthouseResult": {
                "categories": {"performance": {"score": score}},
                "audits": {
                    "first-contentful-paint": {"numericValue": 1200.5},
                    "largest-contentful-paint": {"numericValue": 2500.0},
                    "speed-index": {"numericValue": 1800},
                    "total-blocking-time": {"numericValue": 150},
                    "interactive": {"numericValue": 3100.2},
                    "cumulative-layout-shift": {"numericValue": 0.02}
                }
            }
        })
    }

    #[test]
    fn test_parse_report_full() {
        let report = parse_report(&lighthouse(json!(0.87)), Strategy::Mobile).unwrap();
        assert_eq!(report.strategy, Strategy::Mobile);
        assert_eq!(report.score, 0.87);
        assert_eq!(report.metrics.first_contentful_paint_ms, Some(1200.5));
        assert_eq!(report.metrics.speed_index_ms, Some(1800.0));
        assert_eq!(report.metrics.time_to_interactive_ms, Some(3100.2));
        assert_eq!(report.metrics.cumulative_layout_shift, Some(0.02));
    }

    #[test]
    fn test_missing_score_is_fatal() {
        let mut payload = lighthouse(json!(0.5));
        payload["lighthouseResult"]["categories"] = json!({});
        assert!(matches!(
            parse_report(&payload, Strategy::Desktop),
            Err(PageSpeedError::MissingScore)
        ));
        assert!(matches!(
            parse_report(&lighthouse(Value::Null), Strategy::Desktop),
            Err(PageSpeedError::MissingScore)
        ));
        assert!(matches!(
            parse_report(&json!({}), Strategy::Desktop),
            Err(PageSpeedError::MissingScore)
        ));
    }

    #[test]
    fn test_missing_metric_is_null() {
        let mut payload = lighthouse(json!(0.5));
        payload["lighthouseResult"]["audits"]
            .as_object_mut()
            .unwrap()
            .remove("speed-index");
        let report = parse_report(&payload, Strategy::Mobile).unwrap();
        assert_eq!(report.metrics.speed_index_ms, None);
        assert_eq!(report.metrics.total_blocking_time_ms, Some(150.0));
    }

    #[test]
    fn test_request_url() {
        let client = PageSpeedClient::new(
            "https://psi.test/run",
            Some("abc".to_string()),
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            client.request_url("https://a.test/", Strategy::Desktop),
            "https://psi.test/run?url=https%3A%2F%2Fa.test%2F&strategy=desktop&key=abc"
        );

        let keyless = PageSpeedClient::new("https://psi.test/run", None, Duration::from_secs(1)).unwrap();
        assert!(!keyless.request_url("https://a.test/", Strategy::Mobile).contains("key="));
    }
}
