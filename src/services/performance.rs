//! Performance fetcher: mobile and desktop PageSpeed runs for one URL.

use thiserror::Error;
use tracing::info;

use crate::clients::{PageSpeedClient, PageSpeedError};
use crate::config::Settings;
use crate::models::{PerformanceReport, Strategy};

#[derive(Debug, Error)]
pub enum PerformanceError {
    #[error("URL must start with http:// or https://")]
    InvalidUrl,
    #[error(transparent)]
    PageSpeed(#[from] PageSpeedError),
}

/// Trim `raw` (or fall back to `default_url`) and check the scheme.
pub fn normalize_url(raw: Option<&str>, default_url: &str) -> Result<String, PerformanceError> {
    let url = raw.unwrap_or(default_url).trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(PerformanceError::InvalidUrl)
    }
}

/// Produces combined mobile and desktop reports. All or nothing.
#[derive(Clone)]
pub struct PerformanceService {
    client: PageSpeedClient,
    default_url: String,
}

impl PerformanceService {
    pub fn new(client: PageSpeedClient, default_url: impl Into<String>) -> Self {
        Self {
            client,
            default_url: default_url.into(),
        }
    }

    /// Client and fallback URL taken from settings. Needs no store.
    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        let client = PageSpeedClient::new(
            settings.pagespeed_endpoint.clone(),
            settings.pagespeed_api_key.clone(),
            settings.pagespeed_timeout(),
        )?;
        Ok(Self::new(client, settings.target_url.clone()))
    }

    /// Run both strategies sequentially. Either failing fails the report.
    pub async fn report(&self, raw_url: Option<&str>) -> Result<PerformanceReport, PerformanceError> {
        let url = normalize_url(raw_url, &self.default_url)?;
        info!(url = %url, "Fetching PageSpeed Insights");

        let mobile = self.client.run(&url, Strategy::Mobile).await?;
        let desktop = self.client.run(&url, Strategy::Desktop).await?;

        info!(
            url = %url,
            mobile = mobile.score,
            desktop = desktop.score,
            "PageSpeed Insights fetched"
        );
        Ok(PerformanceReport { url, mobile, desktop })
    }
}
