//! The per-publisher data pipeline.
//!
//! One parameterized flow for every publisher: fetch the catalog and the
//! analytics report, restrict them to the publisher and the requested
//! filters, then reconcile. Upstream failures degrade to empty tables plus a
//! warning; only schema errors in the catalog abort the request.

use chrono::{Datelike, NaiveDate};
use dashboard_core::{
    daily_progression, distinct_mediums, distinct_sources, filter_by_authors,
    filter_catalog_by_domain, reconcile, AnalyticsFilter, AnalyticsRow, CatalogRow, DateRange,
    MonthlyProgress, NormalizedKey, PublisherConfig, ReconciledRow, Result,
};
use std::collections::HashSet;
use std::time::Instant;
use telemetry::{health, metrics};
use tracing::{debug, warn};

use crate::state::AppState;

/// What a dashboard request asks for.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub range: DateRange,
    pub filter: AnalyticsFilter,
    /// Restrict the catalog to these authors; empty keeps everyone.
    pub authors: Vec<String>,
}

impl PipelineInput {
    pub fn new(range: DateRange) -> Self {
        Self {
            range,
            filter: AnalyticsFilter::default(),
            authors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// The publisher's catalog, before the author filter.
    pub catalog: Vec<CatalogRow>,
    /// Analytics rows that passed the source/medium filter.
    pub analytics: Vec<AnalyticsRow>,
    /// Sources and mediums present in the unfiltered report.
    pub sources: Vec<String>,
    pub mediums: Vec<String>,
    pub reconciled: Vec<ReconciledRow>,
    pub warnings: Vec<String>,
}

/// Runs the pipeline for one publisher.
pub struct Pipeline<'a> {
    state: &'a AppState,
    publisher: &'a PublisherConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(state: &'a AppState, publisher: &'a PublisherConfig) -> Self {
        Self { state, publisher }
    }

    /// The publisher's catalog rows, or nothing if the catalog is down.
    pub async fn load_catalog(&self, warnings: &mut Vec<String>) -> Vec<CatalogRow> {
        match self.state.catalog.fetch_catalog().await {
            Ok(rows) => {
                health().catalog.set_healthy();
                let rows = filter_catalog_by_domain(&rows, &self.publisher.domain);
                if rows.is_empty() {
                    warnings.push(format!(
                        "No catalog articles found for {}",
                        self.publisher.domain
                    ));
                }
                rows
            }
            Err(e) => {
                warn!(publisher = %self.publisher.slug, error = %e, "Catalog unavailable, continuing without it");
                health().catalog.set_unhealthy(e.to_string());
                metrics().degraded_responses.inc();
                warnings.push(format!("Catalog unavailable: {e}"));
                Vec::new()
            }
        }
    }

    /// The analytics report for `range`, or nothing if analytics is down.
    pub async fn load_analytics(
        &self,
        range: DateRange,
        warnings: &mut Vec<String>,
    ) -> Vec<AnalyticsRow> {
        let result = self
            .state
            .analytics
            .fetch_report(&self.publisher.property_id, &self.publisher.account, range)
            .await;

        match result {
            Ok(rows) => {
                health().analytics.set_healthy();
                if rows.is_empty() {
                    warnings.push(format!("No analytics data for {range}"));
                }
                rows
            }
            Err(e) => {
                warn!(
                    publisher = %self.publisher.slug,
                    range = %range,
                    error = %e,
                    "Analytics unavailable, continuing without it"
                );
                health().analytics.set_unhealthy(e.to_string());
                metrics().degraded_responses.inc();
                warnings.push(format!("Analytics unavailable for {range}: {e}"));
                Vec::new()
            }
        }
    }

    /// Fetch, filter and reconcile.
    pub async fn run(&self, input: &PipelineInput) -> Result<PipelineOutput> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        let catalog = self.load_catalog(&mut warnings).await;
        let report = self.load_analytics(input.range, &mut warnings).await;

        let sources = distinct_sources(&report);
        let mediums = distinct_mediums(&report);
        let analytics = input.filter.apply(&report);

        let selected = filter_by_authors(catalog.clone(), &input.authors);
        let reconciled = self.reconcile(&selected, &analytics)?;

        metrics()
            .pipeline_latency_ms
            .observe(start.elapsed().as_millis() as u64);

        Ok(PipelineOutput {
            catalog,
            analytics,
            sources,
            mediums,
            reconciled,
            warnings,
        })
    }

    /// Month-to-date progress of the catalog articles towards the
    /// publisher's goal, with the day-by-day series.
    pub async fn monthly_progress(
        &self,
        catalog: &[CatalogRow],
        today: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> Result<MonthlyProgress> {
        let first = today.with_day(1).unwrap_or(today);
        let range = DateRange::new(first, today)?;

        let report = self.load_analytics(range, warnings).await;
        let reconciled = self.reconcile(catalog, &report)?;
        let page_views: u64 = reconciled.iter().map(|r| r.metrics.page_views).sum();

        let keys: HashSet<NormalizedKey> = reconciled
            .into_iter()
            .map(|r| r.key)
            .filter(|k| !k.is_empty())
            .collect();
        let goal = self.publisher.monthly_goal;
        let daily = daily_progression(&report, &keys, &self.publisher.domain, goal, today);

        Ok(MonthlyProgress::compute(page_views, goal, today).with_daily(daily))
    }

    /// Reconcile and count the outcome.
    pub fn reconcile(
        &self,
        catalog: &[CatalogRow],
        analytics: &[AnalyticsRow],
    ) -> Result<Vec<ReconciledRow>> {
        let reconciled = reconcile(catalog, analytics, &self.publisher.domain)?;
        let matched = reconciled.iter().filter(|r| r.matched).count();

        metrics().rows_reconciled.inc_by(reconciled.len() as u64);
        metrics().rows_matched.inc_by(matched as u64);
        debug!(
            publisher = %self.publisher.slug,
            rows = reconciled.len(),
            matched = matched,
            "Pipeline reconciled"
        );

        Ok(reconciled)
    }
}
