//! Storage for insight records.
//!
//! The insights table is an append-only log keyed by `(url, timestamp)`.
//! Callers only see the [`InsightStore`] primitives: put, a paginated URL
//! scan, and a per-URL query ordered by timestamp.

pub mod diesel_insight;
pub mod diesel_models;
pub mod diesel_pool;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Settings, StorageBackend};
use crate::models::{InsightRecord, RecordKey};

pub use diesel_insight::DieselInsightRepository;
pub use memory::MemoryInsightStore;

/// Rows returned per scan page when the caller does not ask for a limit.
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 1000;

/// Errors raised by a store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("invalid table name {0:?}: use letters, digits and underscores")]
    InvalidTableName(String),
    #[error("corrupt record {url} @ {timestamp}: {reason}")]
    CorruptRecord {
        url: String,
        timestamp: String,
        reason: String,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Timestamp order for [`InsightStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    Descending,
}

/// One scan request: where to resume and how many rows to read.
#[derive(Debug, Clone, Default)]
pub struct ScanRequest {
    pub exclusive_start_key: Option<RecordKey>,
    pub limit: Option<usize>,
}

/// One page of a URL-projected scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    /// `Url` of every row on the page, duplicates included.
    pub urls: Vec<String>,
    /// Continuation token; `None` once the table is exhausted.
    pub last_evaluated_key: Option<RecordKey>,
}

/// Key-value access to the insights table.
#[async_trait]
pub trait InsightStore: Send + Sync {
    /// Append a record.
    async fn put(&self, record: &InsightRecord) -> Result<(), StoreError>;

    /// Read one page of the table, projected to the `Url` attribute.
    async fn scan_urls(&self, request: ScanRequest) -> Result<ScanPage, StoreError>;

    /// All records for `url` ordered by timestamp.
    async fn query(&self, url: &str, order: SortOrder) -> Result<Vec<InsightRecord>, StoreError>;
}

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_table_name(name: &str) -> Result<(), StoreError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}

/// Open the store selected by `settings`.
pub async fn open_store(settings: &Settings) -> Result<Arc<dyn InsightStore>, StoreError> {
    validate_table_name(&settings.table_name)?;
    match settings.storage {
        StorageBackend::Memory => {
            tracing::info!(table = %settings.table_name, "Using in-memory insight store");
            Ok(Arc::new(MemoryInsightStore::new()))
        }
        StorageBackend::Sqlite => {
            settings.ensure_directories()?;
            let path = settings.database_path();
            tracing::info!(path = %path.display(), table = %settings.table_name, "Opening SQLite insight store");
            let repo = DieselInsightRepository::open(&path, &settings.table_name).await?;
            Ok(Arc::new(repo))
        }
    }
}
