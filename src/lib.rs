//! pagepulse: record page-quality insights over time and chart them.
//!
//! Two fetchers feed the system: the insight fetcher calls a configured
//! analysis endpoint per URL and persists every outcome, while the
//! performance fetcher runs PageSpeed Insights for both strategies on
//! demand. The dashboard reads the stored history back as score series.

pub mod clients;
pub mod config;
pub mod extract;
pub mod models;
pub mod repository;
pub mod server;
pub mod services;

pub use config::{load_settings, Settings};
pub use models::{InsightOutcome, InsightRecord, PerformanceReport, ScoreSeries};
pub use repository::{open_store, InsightStore, StoreError};
