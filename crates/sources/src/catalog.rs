//! Article catalog from a published spreadsheet's CSV export.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use dashboard_core::error::UpstreamErrorCode;
use dashboard_core::{CatalogRow, Error, Result};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;

/// Anything that can produce the article catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>>;
}

/// Catalog backed by a spreadsheet's CSV export.
pub struct SheetCatalog {
    config: CatalogConfig,
    http_client: reqwest::Client,
}

impl SheetCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn download(&self) -> Result<Vec<u8>> {
        let url = self.config.export_url();
        debug!(url = %url, "Fetching catalog export");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Catalog request failed");
            Error::upstream(UpstreamErrorCode::Catalog, format!("Catalog unavailable: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "Catalog export returned error");
            return Err(Error::upstream(
                UpstreamErrorCode::Catalog,
                format!("Catalog export returned {status}"),
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            Error::upstream(UpstreamErrorCode::Catalog, format!("Catalog body unreadable: {e}"))
        })?;
        Ok(body.to_vec())
    }
}

#[async_trait]
impl CatalogSource for SheetCatalog {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogRow>> {
        let start = Instant::now();
        metrics().catalog_fetches.inc();

        let result = match self.download().await {
            Ok(body) => parse_catalog_csv(&body),
            Err(e) => Err(e),
        };
        metrics()
            .catalog_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        match &result {
            Ok(rows) => {
                metrics().catalog_rows_fetched.inc_by(rows.len() as u64);
                info!(rows = rows.len(), "Catalog loaded");
            }
            Err(e) => {
                metrics().catalog_fetch_errors.inc();
                warn!(error = %e, "Catalog fetch failed");
            }
        }
        result
    }
}

/// Which CSV column feeds which catalog field.
#[derive(Debug, Default)]
struct ColumnMap {
    url: Option<usize>,
    title: Option<usize>,
    author: Option<usize>,
    published_at: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut map = Self::default();
        for (idx, header) in headers.iter().enumerate() {
            let slot = match header.trim().to_lowercase().as_str() {
                "url" => &mut map.url,
                "title" | "titulo" | "título" => &mut map.title,
                "author" | "autor" => &mut map.author,
                "publishedat" | "published_at" | "datepub" | "fecha" => &mut map.published_at,
                _ => continue,
            };
            // First matching column wins.
            slot.get_or_insert(idx);
        }
        map
    }

    fn is_known(&self, idx: usize) -> bool {
        [self.url, self.title, self.author, self.published_at].contains(&Some(idx))
    }
}

/// Parses a catalog CSV export.
///
/// Without a `url` header every row gets `url: None`, which the reconciler
/// reports as a schema error. Unrecognized columns land in `extra`.
pub fn parse_catalog_csv(data: &[u8]) -> Result<Vec<CatalogRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| Error::upstream(UpstreamErrorCode::Catalog, format!("Invalid catalog header: {e}")))?
        .clone();
    let columns = ColumnMap::from_headers(&headers);

    if columns.url.is_none() {
        warn!(headers = ?headers, "Catalog has no url column");
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            Error::upstream(
                UpstreamErrorCode::Catalog,
                format!("Invalid catalog record {}: {e}", line + 1),
            )
        })?;

        let text = |idx: Option<usize>| idx.and_then(|i| record.get(i)).map(str::to_string);
        let optional = |idx: Option<usize>| text(idx).filter(|s| !s.is_empty());

        let extra: BTreeMap<String, String> = headers
            .iter()
            .enumerate()
            .filter(|(idx, name)| !columns.is_known(*idx) && !name.is_empty())
            .filter_map(|(idx, name)| {
                record
                    .get(idx)
                    .filter(|v| !v.is_empty())
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        rows.push(CatalogRow {
            url: text(columns.url),
            title: optional(columns.title),
            author: optional(columns.author),
            published_at: optional(columns.published_at).and_then(|s| parse_catalog_date(&s)),
            extra,
        });
    }

    Ok(rows)
}

/// Parses the date formats seen in the catalog sheet.
pub fn parse_catalog_date(value: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
    const DATETIME_FORMATS: [&str; 4] = [
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];

    let value = value.trim();

    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
                .map(|dt| dt.date())
        })
}
