//! Analytics (GA4) row types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-page traffic metrics.
///
/// `sessions`, `total_users`, `new_users` and `page_views` are additive;
/// the remaining three are rates and are averaged, never summed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetrics {
    pub sessions: u64,
    pub total_users: u64,
    pub new_users: u64,
    pub page_views: u64,
    /// Seconds.
    pub avg_session_duration: f64,
    /// Percent, 0-100.
    pub bounce_rate: f64,
    /// Percent, 0-100.
    pub engagement_rate: f64,
}

/// One (page path, date, source, medium) row of an analytics report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRow {
    /// Site-relative path, e.g. `/politica/nota`.
    pub page_path: String,
    pub date: Option<NaiveDate>,
    pub session_source: Option<String>,
    pub session_medium: Option<String>,
    #[serde(flatten)]
    pub metrics: PageMetrics,
}

impl AnalyticsRow {
    /// Creates a row for `page_path` with zeroed metrics.
    pub fn new(page_path: impl Into<String>) -> Self {
        Self {
            page_path: page_path.into(),
            ..Default::default()
        }
    }

    pub fn with_page_views(mut self, page_views: u64) -> Self {
        self.metrics.page_views = page_views;
        self
    }

    pub fn with_sessions(mut self, sessions: u64) -> Self {
        self.metrics.sessions = sessions;
        self
    }

    pub fn with_bounce_rate(mut self, bounce_rate: f64) -> Self {
        self.metrics.bounce_rate = bounce_rate;
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>, medium: impl Into<String>) -> Self {
        self.session_source = Some(source.into());
        self.session_medium = Some(medium.into());
        self
    }
}

/// Traffic source / medium restriction applied before reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyticsFilter {
    pub sources: Vec<String>,
    pub mediums: Vec<String>,
}

impl AnalyticsFilter {
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty() && self.mediums.is_empty()
    }

    /// Whether a row passes the filter. Empty lists accept everything.
    pub fn matches(&self, row: &AnalyticsRow) -> bool {
        fn accepts(allowed: &[String], value: Option<&str>) -> bool {
            allowed.is_empty() || value.is_some_and(|v| allowed.iter().any(|a| a == v))
        }

        accepts(&self.sources, row.session_source.as_deref())
            && accepts(&self.mediums, row.session_medium.as_deref())
    }

    /// Returns the rows that pass the filter.
    pub fn apply(&self, rows: &[AnalyticsRow]) -> Vec<AnalyticsRow> {
        if self.is_empty() {
            return rows.to_vec();
        }
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// Distinct, sorted session sources present in the report.
pub fn distinct_sources(rows: &[AnalyticsRow]) -> Vec<String> {
    distinct(rows.iter().filter_map(|r| r.session_source.as_deref()))
}

/// Distinct, sorted session mediums present in the report.
pub fn distinct_mediums(rows: &[AnalyticsRow]) -> Vec<String> {
    distinct(rows.iter().filter_map(|r| r.session_medium.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = values.map(String::from).collect();
    out.sort();
    out.dedup();
    out
}
