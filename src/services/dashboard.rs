//! Dashboard reads: URL listing, score series and annotated record lists.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::extract::{parse_object, score_from_raw, strategy_score, to_percent};
use crate::models::{RecordView, ScoreSeries, SeriesPoint, Strategy};
use crate::repository::{InsightStore, ScanRequest, SortOrder, StoreError};

/// How series scores are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreScale {
    /// `score * 100`, rounded to two decimals.
    #[default]
    Percent,
    /// Raw `[0, 1]` score.
    Fraction,
}

impl ScoreScale {
    pub fn apply(&self, score: f64) -> f64 {
        match self {
            ScoreScale::Percent => to_percent(score),
            ScoreScale::Fraction => score,
        }
    }
}

/// Read-side view over the insights table.
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn InsightStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn InsightStore>) -> Self {
        Self { store }
    }

    /// Every distinct URL in the table, sorted.
    pub async fn list_urls(&self) -> Result<Vec<String>, StoreError> {
        let mut urls = BTreeSet::new();
        let mut request = ScanRequest::default();
        let mut pages = 0usize;

        loop {
            let page = self.store.scan_urls(request.clone()).await?;
            pages += 1;
            urls.extend(page.urls.into_iter().filter(|url| !url.is_empty()));
            match page.last_evaluated_key {
                Some(key) => request.exclusive_start_key = Some(key),
                None => break,
            }
        }

        debug!(pages, count = urls.len(), "Scanned URLs");
        Ok(urls.into_iter().collect())
    }

    /// Oldest-first mobile and desktop score series for `url`.
    pub async fn series(&self, url: &str, scale: ScoreScale) -> Result<ScoreSeries, StoreError> {
        let records = self.store.query(url, SortOrder::Ascending).await?;
        let mut series = ScoreSeries {
            url: url.to_string(),
            ..Default::default()
        };

        for record in &records {
            let Some(payload) = record.result_json().and_then(parse_object) else {
                continue;
            };
            for strategy in Strategy::ALL {
                if let Some(score) = strategy_score(&payload, strategy) {
                    let point = SeriesPoint {
                        t: record.timestamp.clone(),
                        y: scale.apply(score),
                    };
                    match strategy {
                        Strategy::Mobile => series.mobile.push(point),
                        Strategy::Desktop => series.desktop.push(point),
                    }
                }
            }
        }

        debug!(
            url = %url,
            records = records.len(),
            mobile = series.mobile.len(),
            desktop = series.desktop.len(),
            "Built score series"
        );
        Ok(series)
    }

    /// Newest-first records for `url`, each with its raw mobile score.
    pub async fn records(&self, url: &str) -> Result<Vec<RecordView>, StoreError> {
        let records = self.store.query(url, SortOrder::Descending).await?;
        Ok(records
            .into_iter()
            .map(|record| {
                let mobile_score = record
                    .result_json()
                    .and_then(|raw| score_from_raw(raw, Strategy::Mobile));
                RecordView {
                    record,
                    mobile_score,
                }
            })
            .collect())
    }
}
