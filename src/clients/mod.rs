//! Outbound API clients.

pub mod http_client;
pub mod insight;
pub mod pagespeed;

pub use insight::{InsightApiClient, InsightApiError};
pub use pagespeed::{PageSpeedClient, PageSpeedError};
