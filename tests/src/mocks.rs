//! Mock sources for testing.

use async_trait::async_trait;
use dashboard_core::error::UpstreamErrorCode;
use dashboard_core::{AnalyticsRow, CatalogRow, DateRange, Error, Result};
use parking_lot::Mutex;
use sources::{AnalyticsSource, CatalogSource};
use std::collections::HashMap;
use std::sync::Arc;

/// Mock catalog serving rows from memory.
///
/// Implements the same `CatalogSource` trait as the spreadsheet client, so
/// the router runs its production pipeline without network access.
#[derive(Clone, Default)]
pub struct MockCatalog {
    rows: Arc<Mutex<Vec<CatalogRow>>>,
    should_fail: Arc<Mutex<bool>>,
    calls: Arc<Mutex<usize>>,
}

impl MockCatalog {
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        let mock = Self::default();
        mock.set_rows(rows);
        mock
    }

    pub fn set_rows(&self, rows: Vec<CatalogRow>) {
        *self.rows.lock() = rows;
    }

    /// Set failure mode for testing degradation.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl CatalogSource for MockCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>> {
        *self.calls.lock() += 1;
        if *self.should_fail.lock() {
            return Err(Error::upstream(
                UpstreamErrorCode::Catalog,
                "Mock catalog failure",
            ));
        }
        Ok(self.rows.lock().clone())
    }
}

/// One captured `fetch_report` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub property_id: String,
    pub account: String,
    pub range: DateRange,
}

/// Mock analytics serving a default report, or a specific one per range.
#[derive(Clone, Default)]
pub struct MockAnalytics {
    default_rows: Arc<Mutex<Vec<AnalyticsRow>>>,
    by_range: Arc<Mutex<HashMap<DateRange, Vec<AnalyticsRow>>>>,
    requests: Arc<Mutex<Vec<ReportRequest>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockAnalytics {
    pub fn new(rows: Vec<AnalyticsRow>) -> Self {
        let mock = Self::default();
        mock.set_rows(rows);
        mock
    }

    /// Report returned for any range without a specific one.
    pub fn set_rows(&self, rows: Vec<AnalyticsRow>) {
        *self.default_rows.lock() = rows;
    }

    pub fn set_rows_for(&self, range: DateRange, rows: Vec<AnalyticsRow>) {
        self.by_range.lock().insert(range, rows);
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    /// Every request made so far, in order.
    pub fn requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl AnalyticsSource for MockAnalytics {
    async fn fetch_report(
        &self,
        property_id: &str,
        account: &str,
        range: DateRange,
    ) -> Result<Vec<AnalyticsRow>> {
        self.requests.lock().push(ReportRequest {
            property_id: property_id.to_string(),
            account: account.to_string(),
            range,
        });

        if *self.should_fail.lock() {
            return Err(Error::upstream(
                UpstreamErrorCode::Analytics,
                "Mock analytics failure",
            ));
        }

        let specific = self.by_range.lock().get(&range).cloned();
        Ok(specific.unwrap_or_else(|| self.default_rows.lock().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn range(day: u32) -> DateRange {
        let d = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        DateRange::new(d, d).unwrap()
    }

    #[tokio::test]
    async fn test_mock_analytics_by_range() {
        let mock = MockAnalytics::new(vec![AnalyticsRow::new("/a").with_page_views(1)]);
        mock.set_rows_for(range(2), vec![AnalyticsRow::new("/b").with_page_views(2)]);

        let default = mock.fetch_report("1", "acc", range(1)).await.unwrap();
        assert_eq!(default[0].page_path, "/a");

        let specific = mock.fetch_report("1", "acc", range(2)).await.unwrap();
        assert_eq!(specific[0].page_path, "/b");

        assert_eq!(mock.requests().len(), 2);
        assert_eq!(mock.requests()[1].range, range(2));
    }

    #[tokio::test]
    async fn test_mock_failure_modes() {
        let catalog = MockCatalog::new(vec![CatalogRow::new("https://example.com/a")]);
        catalog.set_should_fail(true);
        assert!(catalog.fetch_catalog().await.is_err());
        assert_eq!(catalog.calls(), 1);

        let analytics = MockAnalytics::default();
        analytics.set_should_fail(true);
        let err = analytics.fetch_report("1", "acc", range(1)).await.unwrap_err();
        assert_eq!(err.error_code(), Some("UPSTREAM_002"));
    }
}
