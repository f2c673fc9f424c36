//! Client for the configured insight analysis endpoint.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::http_client::{append_query, build_client};

/// Errors calling the insight endpoint. All of them are per-URL failures.
#[derive(Debug, Error)]
pub enum InsightApiError {
    #[error("{0}")]
    Transport(String),
    #[error("HTTP Error {status}")]
    Status { status: reqwest::StatusCode },
    #[error("invalid JSON in response: {0}")]
    Decode(String),
}

/// Calls `<endpoint>?url=<encoded>` and returns the decoded JSON payload.
#[derive(Clone)]
pub struct InsightApiClient {
    client: Client,
    endpoint: String,
}

impl InsightApiClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    /// Request URL for analysing `url`.
    pub fn request_url(&self, url: &str) -> String {
        append_query(&self.endpoint, "url", url)
    }

    /// Fetch the analysis payload for `url`.
    pub async fn fetch(&self, url: &str) -> Result<Value, InsightApiError> {
        let request_url = self.request_url(url);
        debug!(request_url = %request_url, "Calling insight API");

        let resp = self
            .client
            .get(&request_url)
            .send()
            .await
            .map_err(|e| InsightApiError::Transport(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(InsightApiError::Status {
                status: resp.status(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| InsightApiError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| InsightApiError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/insight"))
            .and(query_param("url", "https://a.test/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mobile": {"score": 0.8}})))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            InsightApiClient::new(format!("{}/insight", server.uri()), Duration::from_secs(5)).unwrap();
        let payload = client.fetch("https://a.test/").await.unwrap();
        assert_eq!(payload, json!({"mobile": {"score": 0.8}}));
    }

    #[tokio::test]
    async fn test_fetch_maps_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = InsightApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.fetch("https://a.test/").await.unwrap_err();
        assert!(matches!(err, InsightApiError::Status { .. }));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_json() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let client = InsightApiClient::new(server.uri(), Duration::from_secs(5)).unwrap();
        let err = client.fetch("https://a.test/").await.unwrap_err();
        assert!(matches!(err, InsightApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = InsightApiClient::new(server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.fetch("https://a.test/").await.unwrap_err();
        assert!(matches!(err, InsightApiError::Transport(_)));
    }
}
