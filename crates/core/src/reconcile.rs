//! Catalog / analytics reconciliation.
//!
//! Analytics rows are grouped by normalized key (additive metrics summed,
//! rates averaged) and left-joined onto the catalog. Every catalog row
//! appears exactly once, in order; analytics rows with no catalog entry are
//! dropped; unmatched catalog rows get zeroed metrics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::analytics::{AnalyticsRow, PageMetrics};
use crate::catalog::CatalogRow;
use crate::error::{Error, Result};
use crate::normalize::NormalizedKey;

/// Analytics metrics aggregated over every row sharing a key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedAnalytics {
    #[serde(flatten)]
    pub metrics: PageMetrics,
    /// Number of analytics rows folded into this aggregate.
    pub rows: usize,
}

/// A catalog row extended with its (possibly zero) analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRow {
    #[serde(flatten)]
    pub catalog: CatalogRow,
    #[serde(flatten)]
    pub metrics: PageMetrics,
    /// Whether any analytics rows matched this article.
    pub matched: bool,
    #[serde(skip)]
    pub key: NormalizedKey,
}

#[derive(Default)]
struct Accumulator {
    sessions: u64,
    total_users: u64,
    new_users: u64,
    page_views: u64,
    avg_session_duration: f64,
    bounce_rate: f64,
    engagement_rate: f64,
    rows: usize,
}

impl Accumulator {
    fn add(&mut self, m: &PageMetrics) {
        self.sessions += m.sessions;
        self.total_users += m.total_users;
        self.new_users += m.new_users;
        self.page_views += m.page_views;
        self.avg_session_duration += m.avg_session_duration;
        self.bounce_rate += m.bounce_rate;
        self.engagement_rate += m.engagement_rate;
        self.rows += 1;
    }

    fn finish(self) -> AggregatedAnalytics {
        let n = self.rows.max(1) as f64;
        AggregatedAnalytics {
            metrics: PageMetrics {
                sessions: self.sessions,
                total_users: self.total_users,
                new_users: self.new_users,
                page_views: self.page_views,
                avg_session_duration: self.avg_session_duration / n,
                bounce_rate: self.bounce_rate / n,
                engagement_rate: self.engagement_rate / n,
            },
            rows: self.rows,
        }
    }
}

/// Groups analytics rows by `normalize(domain + pagePath)`.
pub fn aggregate(
    analytics: &[AnalyticsRow],
    domain: &str,
) -> HashMap<NormalizedKey, AggregatedAnalytics> {
    let mut groups: HashMap<NormalizedKey, Accumulator> = HashMap::new();

    for row in analytics {
        let key = NormalizedKey::from_page_path(domain, &row.page_path);
        groups.entry(key).or_default().add(&row.metrics);
    }

    groups
        .into_iter()
        .map(|(key, acc)| (key, acc.finish()))
        .collect()
}

/// Left-joins the aggregated analytics onto the catalog.
///
/// Returns an empty result when either input is empty. Fails with
/// [`Error::MissingJoinColumn`] if a catalog row has no url field.
pub fn reconcile(
    catalog: &[CatalogRow],
    analytics: &[AnalyticsRow],
    domain: &str,
) -> Result<Vec<ReconciledRow>> {
    if catalog.is_empty() || analytics.is_empty() {
        debug!(
            catalog_rows = catalog.len(),
            analytics_rows = analytics.len(),
            "Nothing to reconcile"
        );
        return Ok(Vec::new());
    }

    let keys = catalog
        .iter()
        .enumerate()
        .map(|(row, c)| match c.url.as_deref() {
            Some(url) => Ok(NormalizedKey::from_url(Some(url))),
            None => Err(Error::MissingJoinColumn { row }),
        })
        .collect::<Result<Vec<_>>>()?;

    let grouped = aggregate(analytics, domain);

    let reconciled: Vec<ReconciledRow> = catalog
        .iter()
        .zip(keys)
        .map(|(row, key)| {
            // The empty key means "no URL" and never matches anything.
            let hit = if key.is_empty() { None } else { grouped.get(&key) };
            ReconciledRow {
                catalog: row.clone(),
                metrics: hit.map(|a| a.metrics).unwrap_or_default(),
                matched: hit.is_some(),
                key,
            }
        })
        .collect();

    let matched = reconciled.iter().filter(|r| r.matched).count();
    debug!(
        domain = %domain,
        catalog_rows = catalog.len(),
        analytics_rows = analytics.len(),
        analytics_keys = grouped.len(),
        matched = matched,
        unmatched = reconciled.len() - matched,
        "Reconciled catalog with analytics"
    );

    Ok(reconciled)
}
