//! Diesel row types for the insights table.
//!
//! The table name is configurable, so queries go through `sql_query` and the
//! rows are mapped by column name.

use diesel::prelude::*;
use diesel::sql_types::{Nullable, Text};

use super::StoreError;
use crate::models::{InsightRecord, RecordKey, RecordOutcome, RecordStatus};

/// Full insight row.
#[derive(QueryableByName, Debug, Clone)]
pub struct InsightRow {
    #[diesel(sql_type = Text)]
    pub url: String,
    #[diesel(sql_type = Text)]
    pub timestamp: String,
    #[diesel(sql_type = Text)]
    pub status: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub result_json: Option<String>,
    #[diesel(sql_type = Nullable<Text>)]
    pub error: Option<String>,
}

/// Key-only projection used by scans.
#[derive(QueryableByName, Debug, Clone)]
pub struct KeyRow {
    #[diesel(sql_type = Text)]
    pub url: String,
    #[diesel(sql_type = Text)]
    pub timestamp: String,
}

impl From<KeyRow> for RecordKey {
    fn from(row: KeyRow) -> Self {
        RecordKey {
            url: row.url,
            timestamp: row.timestamp,
        }
    }
}

/// Convert a database row to a domain record.
impl TryFrom<InsightRow> for InsightRecord {
    type Error = StoreError;

    fn try_from(row: InsightRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| StoreError::CorruptRecord {
            url: row.url.clone(),
            timestamp: row.timestamp.clone(),
            reason,
        };

        let status: RecordStatus = row.status.parse().map_err(corrupt)?;
        let outcome = match (status, row.result_json.clone(), row.error.clone()) {
            (RecordStatus::Ok, Some(result_json), None) => RecordOutcome::Ok { result_json },
            (RecordStatus::Error, None, Some(error)) => RecordOutcome::Error { error },
            (status, _, _) => {
                return Err(corrupt(format!(
                    "status {} does not match populated attributes",
                    status
                )))
            }
        };

        Ok(InsightRecord {
            url: row.url,
            timestamp: row.timestamp,
            outcome,
        })
    }
}

/// Column values for inserting a record.
#[derive(Debug)]
pub struct NewInsightRow<'a> {
    pub url: &'a str,
    pub timestamp: &'a str,
    pub status: &'static str,
    pub result_json: Option<&'a str>,
    pub error: Option<&'a str>,
}

impl<'a> From<&'a InsightRecord> for NewInsightRow<'a> {
    fn from(record: &'a InsightRecord) -> Self {
        NewInsightRow {
            url: &record.url,
            timestamp: &record.timestamp,
            status: record.status().as_str(),
            result_json: record.result_json(),
            error: record.error(),
        }
    }
}
