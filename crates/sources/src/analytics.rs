//! Page-level traffic from the GA4 Data API (`runReport`).

use async_trait::async_trait;
use chrono::NaiveDate;
use dashboard_core::error::UpstreamErrorCode;
use dashboard_core::{AnalyticsRow, DateRange, Error, PageMetrics, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;
use crate::token::TokenProvider;

/// Report dimensions, in request order.
pub const DIMENSIONS: [&str; 4] = ["pagePath", "date", "sessionSource", "sessionMedium"];

/// Report metrics, in request order.
pub const METRICS: [&str; 7] = [
    "sessions",
    "totalUsers",
    "screenPageViews",
    "averageSessionDuration",
    "bounceRate",
    "newUsers",
    "engagementRate",
];

/// Anything that can produce a page-level traffic report.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Rows for one analytics property over an inclusive date range.
    async fn fetch_report(
        &self,
        property_id: &str,
        account: &str,
        range: DateRange,
    ) -> Result<Vec<AnalyticsRow>>;
}

// === Wire types ===

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReportRequest {
    date_ranges: Vec<WireDateRange>,
    dimensions: Vec<Named>,
    metrics: Vec<Named>,
    limit: u32,
    offset: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDateRange {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Named {
    name: String,
}

impl RunReportRequest {
    fn new(range: DateRange, limit: u32, offset: u64) -> Self {
        let named = |names: &[&str]| -> Vec<Named> {
            names
                .iter()
                .map(|n| Named {
                    name: n.to_string(),
                })
                .collect()
        };

        Self {
            date_ranges: vec![WireDateRange {
                start_date: range.start.format("%Y-%m-%d").to_string(),
                end_date: range.end.format("%Y-%m-%d").to_string(),
            }],
            dimensions: named(&DIMENSIONS),
            metrics: named(&METRICS),
            limit,
            offset,
        }
    }
}

/// `runReport` response body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportResponse {
    #[serde(default)]
    dimension_headers: Vec<Named>,
    #[serde(default)]
    metric_headers: Vec<Named>,
    #[serde(default)]
    rows: Vec<ReportRow>,
    #[serde(default)]
    row_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    dimension_values: Vec<Value>,
    #[serde(default)]
    metric_values: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Value {
    #[serde(default)]
    value: String,
}

impl RunReportResponse {
    /// Total rows in the report across all pages.
    pub fn row_count(&self) -> u64 {
        self.row_count.unwrap_or(self.rows.len() as u64)
    }
}

/// Converts a `runReport` page into analytics rows.
///
/// Columns are located by header name. Dates come as `YYYYMMDD`; rates come
/// as fractions and are converted to percent.
pub fn parse_run_report(response: &RunReportResponse) -> Result<Vec<AnalyticsRow>> {
    let dim = |name: &str| response.dimension_headers.iter().position(|h| h.name == name);
    let met = |name: &str| response.metric_headers.iter().position(|h| h.name == name);

    let page_path = dim("pagePath").ok_or_else(|| {
        Error::upstream(UpstreamErrorCode::Analytics, "Report has no pagePath dimension")
    })?;
    let date = dim("date");
    let source = dim("sessionSource");
    let medium = dim("sessionMedium");

    let sessions = met("sessions");
    let total_users = met("totalUsers");
    let page_views = met("screenPageViews");
    let avg_duration = met("averageSessionDuration");
    let bounce = met("bounceRate");
    let new_users = met("newUsers");
    let engagement = met("engagementRate");

    let rows = response
        .rows
        .iter()
        .map(|row| {
            let d = |idx: Option<usize>| {
                idx.and_then(|i| row.dimension_values.get(i))
                    .map(|v| v.value.as_str())
            };
            let count = |idx: Option<usize>| {
                idx.and_then(|i| row.metric_values.get(i))
                    .map(|v| parse_count(&v.value))
                    .unwrap_or(0)
            };
            let real = |idx: Option<usize>| {
                idx.and_then(|i| row.metric_values.get(i))
                    .and_then(|v| v.value.parse::<f64>().ok())
                    .filter(|v| v.is_finite())
                    .unwrap_or(0.0)
            };

            AnalyticsRow {
                page_path: d(Some(page_path)).unwrap_or_default().to_string(),
                date: d(date).and_then(|s| NaiveDate::parse_from_str(s, "%Y%m%d").ok()),
                session_source: d(source).map(String::from),
                session_medium: d(medium).map(String::from),
                metrics: PageMetrics {
                    sessions: count(sessions),
                    total_users: count(total_users),
                    new_users: count(new_users),
                    page_views: count(page_views),
                    avg_session_duration: real(avg_duration),
                    bounce_rate: real(bounce) * 100.0,
                    engagement_rate: real(engagement) * 100.0,
                },
            }
        })
        .collect();

    Ok(rows)
}

/// Integer metric; the API sometimes reports counts as `"12.0"`.
fn parse_count(value: &str) -> u64 {
    value
        .parse::<u64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64)
        })
        .unwrap_or(0)
}

/// GA4 Data API client.
pub struct Ga4Client {
    config: AnalyticsConfig,
    http_client: reqwest::Client,
    tokens: Arc<TokenProvider>,
}

impl Ga4Client {
    pub fn new(config: AnalyticsConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        let tokens = Arc::new(TokenProvider::new(
            config.token_uri.clone(),
            config.accounts.clone(),
            http_client.clone(),
        ));

        Ok(Self {
            config,
            http_client,
            tokens,
        })
    }

    pub fn tokens(&self) -> &Arc<TokenProvider> {
        &self.tokens
    }

    fn report_url(&self, property_id: &str) -> String {
        format!(
            "{}/v1beta/properties/{}:runReport",
            self.config.base_url.trim_end_matches('/'),
            property_id
        )
    }

    /// Fetches one page, retrying once with a fresh token on 401.
    async fn fetch_page(
        &self,
        property_id: &str,
        account: &str,
        request: &RunReportRequest,
    ) -> Result<RunReportResponse> {
        let url = self.report_url(property_id);

        for attempt in 0..2 {
            let token = self.tokens.access_token(account).await?;
            debug!(url = %url, offset = request.offset, attempt, "Calling runReport");

            let response = self
                .http_client
                .post(&url)
                .bearer_auth(&token)
                .json(request)
                .send()
                .await
                .map_err(|e| {
                    warn!(error = %e, "runReport request failed");
                    Error::upstream(
                        UpstreamErrorCode::Analytics,
                        format!("Analytics API unavailable: {e}"),
                    )
                })?;

            let status = response.status();
            if status == reqwest::StatusCode::UNAUTHORIZED && attempt == 0 {
                warn!(account = %account, "Access token rejected, refreshing");
                self.tokens.invalidate(account);
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %body, property_id = %property_id, "runReport returned error");
                return Err(Error::upstream(
                    UpstreamErrorCode::Analytics,
                    format!("Analytics API returned {status} for property {property_id}"),
                ));
            }

            return response.json::<RunReportResponse>().await.map_err(|e| {
                Error::upstream(
                    UpstreamErrorCode::Analytics,
                    format!("Invalid runReport response: {e}"),
                )
            });
        }

        Err(Error::upstream(
            UpstreamErrorCode::Analytics,
            format!("Analytics API rejected credentials for account {account:?}"),
        ))
    }

    async fn fetch_all(
        &self,
        property_id: &str,
        account: &str,
        range: DateRange,
    ) -> Result<Vec<AnalyticsRow>> {
        let page_size = self.config.page_size.max(1);
        let mut rows = Vec::new();
        let mut offset = 0u64;

        for page in 0..self.config.max_pages.max(1) {
            let request = RunReportRequest::new(range, page_size, offset);
            let response = self.fetch_page(property_id, account, &request).await?;

            let fetched = response.rows.len() as u64;
            let total = response.row_count();
            rows.extend(parse_run_report(&response)?);
            offset += fetched;

            debug!(page, fetched, total, "runReport page received");

            if fetched < u64::from(page_size) || offset >= total {
                return Ok(rows);
            }
        }

        warn!(
            property_id = %property_id,
            rows = rows.len(),
            max_pages = self.config.max_pages,
            "Report truncated at page limit"
        );
        Ok(rows)
    }
}

#[async_trait]
impl AnalyticsSource for Ga4Client {
    async fn fetch_report(
        &self,
        property_id: &str,
        account: &str,
        range: DateRange,
    ) -> Result<Vec<AnalyticsRow>> {
        let start = Instant::now();
        metrics().analytics_fetches.inc();

        let result = self.fetch_all(property_id, account, range).await;
        metrics()
            .analytics_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match &result {
            Ok(rows) => {
                metrics().analytics_rows_fetched.inc_by(rows.len() as u64);
                info!(property_id = %property_id, range = %range, rows = rows.len(), "Analytics report loaded");
            }
            Err(e) => {
                metrics().analytics_fetch_errors.inc();
                warn!(property_id = %property_id, error = %e, "Analytics fetch failed");
            }
        }
        result
    }
}
