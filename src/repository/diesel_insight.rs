//! Diesel-based insight repository for SQLite.

use std::path::Path;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};

use super::diesel_models::{InsightRow, KeyRow, NewInsightRow};
use super::diesel_pool::{create_diesel_pool, run_blocking, SqlitePool};
use super::{
    validate_table_name, InsightStore, ScanPage, ScanRequest, SortOrder, StoreError,
    DEFAULT_SCAN_PAGE_SIZE,
};
use crate::models::{InsightRecord, RecordKey};

/// Insights table stored in SQLite.
#[derive(Clone)]
pub struct DieselInsightRepository {
    pool: SqlitePool,
    table: String,
}

impl DieselInsightRepository {
    /// Create a repository over an existing pool. Call [`Self::ensure_table`] before use.
    pub fn new(pool: SqlitePool, table: &str) -> Result<Self, StoreError> {
        validate_table_name(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Open (or create) the database file and the table.
    pub async fn open(db_path: &Path, table: &str) -> Result<Self, StoreError> {
        let db_path = db_path.to_path_buf();
        let pool = tokio::task::spawn_blocking(move || create_diesel_pool(&db_path))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))??;
        let repo = Self::new(pool, table)?;
        repo.ensure_table().await?;
        Ok(repo)
    }

    /// Table this repository reads and writes.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Create the table if missing. Safe to run on every start.
    pub async fn ensure_table(&self) -> Result<(), StoreError> {
        let sql = format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                url TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                status TEXT NOT NULL,
                result_json TEXT,
                error TEXT,
                PRIMARY KEY (url, timestamp),
                CHECK (
                    (status = 'ok' AND result_json IS NOT NULL AND error IS NULL)
                    OR (status = 'error' AND error IS NOT NULL AND result_json IS NULL)
                )
            )"#,
            table = self.table
        );

        run_blocking(self.pool.clone(), move |conn| {
            diesel::sql_query(sql).execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(())
    }
}

#[async_trait]
impl InsightStore for DieselInsightRepository {
    async fn put(&self, record: &InsightRecord) -> Result<(), StoreError> {
        let row = NewInsightRow::from(record);
        let sql = format!(
            r#"INSERT INTO "{}" (url, timestamp, status, result_json, error) VALUES (?, ?, ?, ?, ?)"#,
            self.table
        );
        let url = row.url.to_string();
        let timestamp = row.timestamp.to_string();
        let status = row.status;
        let result_json = row.result_json.map(str::to_string);
        let error = row.error.map(str::to_string);

        run_blocking(self.pool.clone(), move |conn| {
            diesel::sql_query(sql)
                .bind::<Text, _>(url)
                .bind::<Text, _>(timestamp)
                .bind::<Text, _>(status)
                .bind::<Nullable<Text>, _>(result_json)
                .bind::<Nullable<Text>, _>(error)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    async fn scan_urls(&self, request: ScanRequest) -> Result<ScanPage, StoreError> {
        let limit = request.limit.unwrap_or(DEFAULT_SCAN_PAGE_SIZE).max(1);
        let table = self.table.clone();

        let rows = run_blocking(self.pool.clone(), move |conn| match request.exclusive_start_key {
            None => diesel::sql_query(format!(
                r#"SELECT url, timestamp FROM "{}" ORDER BY url, timestamp LIMIT ?"#,
                table
            ))
            .bind::<BigInt, _>(limit as i64)
            .load::<KeyRow>(conn),
            Some(start) => diesel::sql_query(format!(
                r#"SELECT url, timestamp FROM "{}"
                   WHERE url > ? OR (url = ? AND timestamp > ?)
                   ORDER BY url, timestamp LIMIT ?"#,
                table
            ))
            .bind::<Text, _>(start.url.clone())
            .bind::<Text, _>(start.url)
            .bind::<Text, _>(start.timestamp)
            .bind::<BigInt, _>(limit as i64)
            .load::<KeyRow>(conn),
        })
        .await?;

        // A full page may have more behind it; a short page ends the scan.
        let last_evaluated_key = if rows.len() == limit {
            rows.last().cloned().map(RecordKey::from)
        } else {
            None
        };

        Ok(ScanPage {
            urls: rows.into_iter().map(|row| row.url).collect(),
            last_evaluated_key,
        })
    }

    async fn query(&self, url: &str, order: SortOrder) -> Result<Vec<InsightRecord>, StoreError> {
        let direction = match order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let sql = format!(
            r#"SELECT url, timestamp, status, result_json, error FROM "{}"
               WHERE url = ? ORDER BY timestamp {}"#,
            self.table, direction
        );
        let url = url.to_string();

        let rows = run_blocking(self.pool.clone(), move |conn| {
            diesel::sql_query(sql)
                .bind::<Text, _>(url)
                .load::<InsightRow>(conn)
        })
        .await?;

        rows.into_iter().map(InsightRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::{tempdir, TempDir};

    async fn setup_test_db(table: &str) -> (DieselInsightRepository, TempDir) {
        let dir = tempdir().unwrap();
        let repo = DieselInsightRepository::open(&dir.path().join("test.db"), table)
            .await
            .unwrap();
        (repo, dir)
    }

    fn ts(second: u32) -> String {
        format!("2024-01-01T00:00:{:02}.000000+00:00", second)
    }

    #[tokio::test]
    async fn test_put_and_query_ordering() {
        let (repo, _dir) = setup_test_db("Insights").await;

        repo.put(&InsightRecord::success("https://a.test", ts(2), &json!({"mobile": {"score": 0.5}})))
            .await
            .unwrap();
        repo.put(&InsightRecord::failure("https://a.test", ts(1), "timeout"))
            .await
            .unwrap();
        repo.put(&InsightRecord::success("https://b.test", ts(3), &json!({})))
            .await
            .unwrap();

        let asc = repo.query("https://a.test", SortOrder::Ascending).await.unwrap();
        assert_eq!(asc.len(), 2);
        assert_eq!(asc[0].timestamp, ts(1));
        assert_eq!(asc[0].error(), Some("timeout"));
        assert_eq!(asc[1].timestamp, ts(2));

        let desc = repo.query("https://a.test", SortOrder::Descending).await.unwrap();
        assert_eq!(desc[0].timestamp, ts(2));

        assert!(repo.query("https://none.test", SortOrder::Ascending).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_result_json_round_trip() {
        let (repo, _dir) = setup_test_db("Insights").await;
        let payload = json!({"mobile": {"score": 0.42}, "nested": [1, "two", null, {"k": true}]});

        repo.put(&InsightRecord::success("https://a.test", ts(1), &payload))
            .await
            .unwrap();

        let stored = repo.query("https://a.test", SortOrder::Ascending).await.unwrap();
        let reparsed: serde_json::Value =
            serde_json::from_str(stored[0].result_json().unwrap()).unwrap();
        assert_eq!(reparsed, payload);
    }

    #[tokio::test]
    async fn test_duplicate_key_is_rejected() {
        let (repo, _dir) = setup_test_db("Insights").await;
        let record = InsightRecord::failure("https://a.test", ts(1), "x");
        repo.put(&record).await.unwrap();
        assert!(repo.put(&record).await.is_err());
    }

    #[tokio::test]
    async fn test_scan_pages_follow_continuation_token() {
        let (repo, _dir) = setup_test_db("Insights").await;
        for (i, url) in ["https://c.test", "https://a.test", "https://b.test", "https://a.test"]
            .iter()
            .enumerate()
        {
            repo.put(&InsightRecord::failure(*url, ts(i as u32), "x"))
                .await
                .unwrap();
        }

        let mut urls = Vec::new();
        let mut pages = 0;
        let mut request = ScanRequest {
            exclusive_start_key: None,
            limit: Some(3),
        };
        loop {
            let page = repo.scan_urls(request.clone()).await.unwrap();
            pages += 1;
            urls.extend(page.urls);
            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        assert_eq!(pages, 2);
        assert_eq!(
            urls,
            vec!["https://a.test", "https://a.test", "https://b.test", "https://c.test"]
        );
    }

    #[tokio::test]
    async fn test_custom_table_name() {
        let (repo, _dir) = setup_test_db("Scores_v2").await;
        assert_eq!(repo.table(), "Scores_v2");
        repo.put(&InsightRecord::failure("https://a.test", ts(1), "x"))
            .await
            .unwrap();
        let page = repo.scan_urls(ScanRequest::default()).await.unwrap();
        assert_eq!(page.urls, vec!["https://a.test"]);
        assert!(page.last_evaluated_key.is_none());
    }
}
