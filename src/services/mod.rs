//! Service layer for pagepulse business logic.
//!
//! This module contains domain logic separated from transport concerns.
//! Services are shared by the CLI and the web server.

pub mod dashboard;
pub mod insight;
pub mod performance;

pub use dashboard::{DashboardService, ScoreScale};
pub use insight::{InsightRequestError, InsightService};
pub use performance::{PerformanceError, PerformanceService};
