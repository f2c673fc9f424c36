//! Web server for the dashboard and the fetcher endpoints.
//!
//! Provides:
//! - URL listing and per-URL score charts
//! - A record table per URL
//! - The insight fetcher (`POST /insights`) and performance fetcher (`GET /run`)

mod handlers;
mod routes;
mod templates;

pub use handlers::ApiError;
pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::InsightApiClient;
use crate::config::Settings;
use crate::repository::InsightStore;
use crate::services::{DashboardService, InsightService, PerformanceService};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub insights: InsightService,
    pub performance: PerformanceService,
    pub dashboard: DashboardService,
}

impl AppState {
    pub fn new(
        insights: InsightService,
        performance: PerformanceService,
        dashboard: DashboardService,
    ) -> Self {
        Self {
            insights,
            performance,
            dashboard,
        }
    }

    /// Wire services from settings around an already opened store.
    pub fn from_settings(settings: &Settings, store: Arc<dyn InsightStore>) -> anyhow::Result<Self> {
        let insight_client = match &settings.insight_endpoint {
            Some(endpoint) => Some(InsightApiClient::new(
                endpoint.clone(),
                settings.insight_timeout(),
            )?),
            None => {
                tracing::warn!("INSIGHT_API_ENDPOINT is not set; insight fetching is disabled");
                None
            }
        };

        Ok(Self::new(
            InsightService::new(insight_client, store.clone()),
            PerformanceService::from_settings(settings)?,
            DashboardService::new(store),
        ))
    }
}

/// Start the web server.
pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
