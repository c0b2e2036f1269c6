//! Dashboard endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use dashboard_core::error::ValidationErrorCode;
use dashboard_core::limits::{DEFAULT_END_DATE, DEFAULT_START_DATE, DEFAULT_TOP_N, MAX_TOP_N};
use dashboard_core::{
    author_performance, authors, top_pages, AnalyticsFilter, AuthorStats, DashboardView,
    DateRange, DomainComparison, Error, MetricSummary, MonthlyProgress, ReconciledRow,
};
use serde::{Deserialize, Serialize};
use telemetry::metrics;
use tracing::info;

use super::{authorized_publisher, split_list, PublisherInfo};
use crate::extractors::SessionContext;
use crate::pipeline::{Pipeline, PipelineInput};
use crate::response::ApiError;
use crate::state::AppState;

/// Query string of `GET /publishers/:slug/dashboard`.
///
/// `source`, `medium` and `author` take comma-separated lists.
/// `authorStart` / `authorEnd` bound the publication dates of the author
/// ranking and default to the current calendar month.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub source: Option<String>,
    pub medium: Option<String>,
    pub author: Option<String>,
    pub top: Option<usize>,
    #[serde(rename = "authorStart")]
    pub author_start: Option<String>,
    #[serde(rename = "authorEnd")]
    pub author_end: Option<String>,
}

/// Values the filter pickers can offer.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    pub sources: Vec<String>,
    pub mediums: Vec<String>,
    pub authors: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub publisher: PublisherInfo,
    pub view: DashboardView,
    pub range: DateRange,
    /// KPIs over the publisher's catalog articles.
    pub kpis: MetricSummary,
    /// KPIs over every page of the site.
    pub site_kpis: MetricSummary,
    pub articles: Vec<ReconciledRow>,
    pub top_pages: Vec<ReconciledRow>,
    /// Author ranking over articles published in `authorsPublished`;
    /// newsroom view only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors_published: Option<DateRange>,
    pub domain_comparison: DomainComparison,
    pub monthly_progress: MonthlyProgress,
    pub filters: FilterOptions,
    pub warnings: Vec<String>,
}

/// GET /publishers/:slug/dashboard
pub async fn dashboard_handler(
    State(state): State<AppState>,
    SessionContext(session): SessionContext,
    Path(slug): Path<String>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardResponse>, ApiError> {
    metrics().dashboard_requests.inc();
    let publisher = authorized_publisher(&state, &session, &slug)?;

    let today = state.today();
    let range = DateRange::resolve(
        params.start.as_deref().unwrap_or(DEFAULT_START_DATE),
        params.end.as_deref().unwrap_or(DEFAULT_END_DATE),
        today,
    )?;

    let month = DateRange::calendar_month(today);
    let published = DateRange::resolve(
        params
            .author_start
            .as_deref()
            .unwrap_or(&month.start.to_string()),
        params.author_end.as_deref().unwrap_or(&month.end.to_string()),
        today,
    )?;

    let top = params.top.unwrap_or(DEFAULT_TOP_N);
    if top == 0 || top > MAX_TOP_N {
        return Err(Error::validation_code(
            ValidationErrorCode::InvalidParameter,
            format!("top must be between 1 and {MAX_TOP_N}"),
        )
        .into());
    }

    let input = PipelineInput {
        range,
        filter: AnalyticsFilter {
            sources: split_list(params.source.as_deref()),
            mediums: split_list(params.medium.as_deref()),
        },
        authors: split_list(params.author.as_deref()),
    };

    let pipeline = Pipeline::new(&state, publisher);
    let output = pipeline.run(&input).await?;
    let mut warnings = output.warnings;

    let site_kpis = MetricSummary::from_analytics(&output.analytics);
    let kpis = if output.catalog.is_empty() && !output.analytics.is_empty() {
        warnings.push("Showing site-wide analytics: the catalog has no articles".to_string());
        site_kpis
    } else {
        MetricSummary::from_reconciled(&output.reconciled)
    };

    let monthly_progress = pipeline
        .monthly_progress(&output.catalog, today, &mut warnings)
        .await?;

    let shows_authors = session.view.shows_authors();
    let author_stats =
        shows_authors.then(|| author_performance(&output.reconciled, Some(published)));

    info!(
        publisher = %publisher.slug,
        view = %session.view,
        range = %range,
        articles = output.reconciled.len(),
        warnings = warnings.len(),
        "Dashboard served"
    );

    Ok(Json(DashboardResponse {
        publisher: PublisherInfo::from(publisher),
        view: session.view,
        range,
        kpis,
        site_kpis,
        top_pages: top_pages(&output.reconciled, top),
        authors: author_stats,
        authors_published: shows_authors.then_some(published),
        domain_comparison: DomainComparison::compute(&output.analytics, &output.reconciled),
        monthly_progress,
        filters: FilterOptions {
            sources: output.sources,
            mediums: output.mediums,
            authors: authors(&output.catalog),
        },
        articles: output.reconciled,
        warnings,
    }))
}
