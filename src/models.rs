//! Domain models for stored insight records and the views derived from them.

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome status of a stored insight record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Ok,
    Error,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Ok => "ok",
            RecordStatus::Error => "error",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(RecordStatus::Ok),
            "error" => Ok(RecordStatus::Error),
            other => Err(format!("unknown record status: {}", other)),
        }
    }
}

/// Payload half of a record. The variant decides which attribute is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Status")]
pub enum RecordOutcome {
    #[serde(rename = "ok")]
    Ok {
        #[serde(rename = "ResultJson")]
        result_json: String,
    },
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "Error")]
        error: String,
    },
}

impl RecordOutcome {
    pub fn status(&self) -> RecordStatus {
        match self {
            RecordOutcome::Ok { .. } => RecordStatus::Ok,
            RecordOutcome::Error { .. } => RecordStatus::Error,
        }
    }
}

/// Primary key of a record: partition key `Url`, sort key `Timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
}

/// One row of the insights table. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightRecord {
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(flatten)]
    pub outcome: RecordOutcome,
}

impl InsightRecord {
    /// Record a successful analysis call. `payload` is re-serialized verbatim.
    pub fn success(url: impl Into<String>, timestamp: impl Into<String>, payload: &Value) -> Self {
        Self {
            url: url.into(),
            timestamp: timestamp.into(),
            outcome: RecordOutcome::Ok {
                result_json: payload.to_string(),
            },
        }
    }

    /// Record a failed analysis call.
    pub fn failure(
        url: impl Into<String>,
        timestamp: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            timestamp: timestamp.into(),
            outcome: RecordOutcome::Error {
                error: error.into(),
            },
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey {
            url: self.url.clone(),
            timestamp: self.timestamp.clone(),
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.outcome.status()
    }

    pub fn result_json(&self) -> Option<&str> {
        match &self.outcome {
            RecordOutcome::Ok { result_json } => Some(result_json),
            RecordOutcome::Error { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            RecordOutcome::Ok { .. } => None,
            RecordOutcome::Error { error } => Some(error),
        }
    }
}

/// Current time as the sort-key string, e.g. `2024-05-01T10:00:00.123456+00:00`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Per-URL result returned by the insight fetcher.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InsightOutcome {
    Ok {
        url: String,
        insight: Value,
        status: RecordStatus,
    },
    Error {
        url: String,
        error: String,
        status: RecordStatus,
    },
}

impl InsightOutcome {
    pub fn ok(url: impl Into<String>, insight: Value) -> Self {
        InsightOutcome::Ok {
            url: url.into(),
            insight,
            status: RecordStatus::Ok,
        }
    }

    pub fn error(url: impl Into<String>, error: impl Into<String>) -> Self {
        InsightOutcome::Error {
            url: url.into(),
            error: error.into(),
            status: RecordStatus::Error,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            InsightOutcome::Ok { url, .. } | InsightOutcome::Error { url, .. } => url,
        }
    }

    pub fn status(&self) -> RecordStatus {
        match self {
            InsightOutcome::Ok { .. } => RecordStatus::Ok,
            InsightOutcome::Error { .. } => RecordStatus::Error,
        }
    }
}

/// PageSpeed analysis mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Mobile,
    Desktop,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Mobile, Strategy::Desktop];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Mobile => "mobile",
            Strategy::Desktop => "desktop",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lighthouse timing metrics. Each is null when the audit is missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub first_contentful_paint_ms: Option<f64>,
    pub largest_contentful_paint_ms: Option<f64>,
    pub speed_index_ms: Option<f64>,
    pub total_blocking_time_ms: Option<f64>,
    pub time_to_interactive_ms: Option<f64>,
    pub cumulative_layout_shift: Option<f64>,
}

/// Result of one PageSpeed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub strategy: Strategy,
    pub score: f64,
    pub metrics: PerformanceMetrics,
}

/// Combined mobile and desktop result for a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub url: String,
    pub mobile: StrategyReport,
    pub desktop: StrategyReport,
}

/// A chart point: timestamp and score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub t: String,
    pub y: f64,
}

/// Chronological mobile and desktop score series for one URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSeries {
    pub url: String,
    pub mobile: Vec<SeriesPoint>,
    pub desktop: Vec<SeriesPoint>,
}

/// A stored record annotated with its extracted mobile score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: InsightRecord,
    #[serde(rename = "MobileScore")]
    pub mobile_score: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_with_table_attributes() {
        let record = InsightRecord::success("https://a.test", "2024-01-01T00:00:00+00:00", &json!({"x": 1}));
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "Url": "https://a.test",
                "Timestamp": "2024-01-01T00:00:00+00:00",
                "Status": "ok",
                "ResultJson": "{\"x\":1}"
            })
        );

        let failed = InsightRecord::failure("https://b.test", "2024-01-01T00:00:00+00:00", "boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["Status"], "error");
        assert_eq!(value["Error"], "boom");
        assert!(value.get("ResultJson").is_none());
    }

    #[test]
    fn test_record_accessors_follow_status() {
        let ok = InsightRecord::success("u", "t", &json!({}));
        assert_eq!(ok.status(), RecordStatus::Ok);
        assert_eq!(ok.result_json(), Some("{}"));
        assert_eq!(ok.error(), None);

        let err = InsightRecord::failure("u", "t", "nope");
        assert_eq!(err.status(), RecordStatus::Error);
        assert_eq!(err.result_json(), None);
        assert_eq!(err.error(), Some("nope"));
    }

    #[test]
    fn test_outcome_shapes() {
        let ok = serde_json::to_value(InsightOutcome::ok("https://a.test", json!({"s": 1}))).unwrap();
        assert_eq!(ok, json!({"url": "https://a.test", "insight": {"s": 1}, "status": "ok"}));

        let err = serde_json::to_value(InsightOutcome::error("https://b.test", "down")).unwrap();
        assert_eq!(err, json!({"url": "https://b.test", "error": "down", "status": "error"}));
    }

    #[test]
    fn test_iso_timestamp_is_utc_with_micros() {
        let ts = iso_timestamp();
        assert!(ts.ends_with("+00:00"));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
        // 2024-01-01T00:00:00.000000+00:00
        assert_eq!(ts.len(), 32);
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("ok".parse::<RecordStatus>(), Ok(RecordStatus::Ok));
        assert_eq!("error".parse::<RecordStatus>(), Ok(RecordStatus::Error));
        assert!("pending".parse::<RecordStatus>().is_err());
    }

    #[test]
    fn test_metrics_use_camel_case_names() {
        let value = serde_json::to_value(PerformanceMetrics {
            first_contentful_paint_ms: Some(1.5),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(value["firstContentfulPaintMs"], 1.5);
        assert!(value["timeToInteractiveMs"].is_null());
        assert!(value.get("cumulativeLayoutShift").is_some());
    }
}
