//! In-process insight store.
//!
//! Rows live in a `BTreeMap` keyed by `(url, timestamp)`, which gives scans
//! and queries the same ordering as the SQLite table.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{InsightStore, ScanPage, ScanRequest, SortOrder, StoreError, DEFAULT_SCAN_PAGE_SIZE};
use crate::models::{InsightRecord, RecordKey};

/// Insights table held in memory. Contents are lost when the process exits.
#[derive(Debug)]
pub struct MemoryInsightStore {
    rows: RwLock<BTreeMap<RecordKey, InsightRecord>>,
    page_size: usize,
}

impl Default for MemoryInsightStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryInsightStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_SCAN_PAGE_SIZE)
    }

    /// Cap every scan page at `page_size` rows, whatever the request asks for.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl InsightStore for MemoryInsightStore {
    async fn put(&self, record: &InsightRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        let key = record.key();
        if rows.contains_key(&key) {
            return Err(StoreError::Unavailable(format!(
                "record {} @ {} already exists",
                key.url, key.timestamp
            )));
        }
        rows.insert(key, record.clone());
        Ok(())
    }

    async fn scan_urls(&self, request: ScanRequest) -> Result<ScanPage, StoreError> {
        let limit = request
            .limit
            .unwrap_or(self.page_size)
            .clamp(1, self.page_size);
        let rows = self.rows.read().await;

        let lower = match request.exclusive_start_key {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let keys: Vec<&RecordKey> = rows
            .range((lower, Bound::Unbounded))
            .map(|(key, _)| key)
            .take(limit)
            .collect();

        let last_evaluated_key = if keys.len() == limit {
            keys.last().map(|key| (*key).clone())
        } else {
            None
        };

        Ok(ScanPage {
            urls: keys.iter().map(|key| key.url.clone()).collect(),
            last_evaluated_key,
        })
    }

    async fn query(&self, url: &str, order: SortOrder) -> Result<Vec<InsightRecord>, StoreError> {
        let rows = self.rows.read().await;
        let mut records: Vec<InsightRecord> = rows
            .values()
            .filter(|record| record.url == url)
            .cloned()
            .collect();
        if order == SortOrder::Descending {
            records.reverse();
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_respects_page_size() {
        let store = MemoryInsightStore::with_page_size(2);
        for (url, ts) in [("b", "1"), ("a", "2"), ("a", "1"), ("c", "1"), ("b", "2")] {
            store.put(&InsightRecord::failure(url, ts, "x")).await.unwrap();
        }
        assert_eq!(store.len().await, 5);

        let first = store.scan_urls(ScanRequest::default()).await.unwrap();
        assert_eq!(first.urls, vec!["a", "a"]);
        let key = first.last_evaluated_key.clone().unwrap();
        assert_eq!(key.url, "a");
        assert_eq!(key.timestamp, "2");

        let second = store
            .scan_urls(ScanRequest {
                exclusive_start_key: Some(key),
                limit: Some(100),
            })
            .await
            .unwrap();
        assert_eq!(second.urls, vec!["b", "b"]);

        let third = store
            .scan_urls(ScanRequest {
                exclusive_start_key: second.last_evaluated_key,
                limit: None,
            })
            .await
            .unwrap();
        assert_eq!(third.urls, vec!["c"]);
        assert!(third.last_evaluated_key.is_none());
    }

    #[tokio::test]
    async fn test_query_orders_by_timestamp() {
        let store = MemoryInsightStore::new();
        store.put(&InsightRecord::failure("a", "2024-02", "x")).await.unwrap();
        store.put(&InsightRecord::failure("a", "2024-01", "x")).await.unwrap();
        store.put(&InsightRecord::failure("b", "2024-03", "x")).await.unwrap();

        let asc = store.query("a", SortOrder::Ascending).await.unwrap();
        let stamps: Vec<_> = asc.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["2024-01", "2024-02"]);

        let desc = store.query("a", SortOrder::Descending).await.unwrap();
        let stamps: Vec<_> = desc.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["2024-02", "2024-01"]);
    }

    #[tokio::test]
    async fn test_duplicate_put_fails() {
        let store = MemoryInsightStore::new();
        let record = InsightRecord::failure("a", "1", "x");
        store.put(&record).await.unwrap();
        assert!(store.put(&record).await.is_err());
        assert_eq!(store.len().await, 1);
    }
}
