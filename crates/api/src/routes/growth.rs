//! Growth comparison endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use dashboard_core::error::ValidationErrorCode;
use dashboard_core::{
    compare, format_growth, ComparisonPeriod, DateRange, Error, GrowthReport, Metric,
    MetricSummary,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use telemetry::metrics;
use tracing::info;

use super::{authorized_publisher, PublisherInfo};
use crate::extractors::SessionContext;
use crate::pipeline::Pipeline;
use crate::response::ApiError;
use crate::state::AppState;

/// Query string of `GET /publishers/:slug/growth`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthParams {
    /// `day`, `week`, `month`, `90days` or `custom`; defaults to `day`.
    pub period: Option<String>,
    pub current_start: Option<String>,
    pub current_end: Option<String>,
    pub previous_start: Option<String>,
    pub previous_end: Option<String>,
}

impl GrowthParams {
    fn ranges(&self, period: ComparisonPeriod, today: chrono::NaiveDate) -> Result<(DateRange, DateRange), Error> {
        if period != ComparisonPeriod::Custom {
            return period.ranges(today);
        }

        match (
            self.current_start.as_deref(),
            self.current_end.as_deref(),
            self.previous_start.as_deref(),
            self.previous_end.as_deref(),
        ) {
            (Some(cs), Some(ce), Some(ps), Some(pe)) => ComparisonPeriod::custom((cs, ce), (ps, pe), today),
            _ => Err(Error::validation_code(
                ValidationErrorCode::InvalidParameter,
                "period=custom requires currentStart, currentEnd, previousStart and previousEnd",
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthResponse {
    pub publisher: PublisherInfo,
    pub period: ComparisonPeriod,
    pub current: DateRange,
    pub previous: DateRange,
    pub metrics: GrowthReport,
    /// Display strings such as `+50.0% (+25)`.
    pub labels: BTreeMap<Metric, String>,
    pub warnings: Vec<String>,
}

/// GET /publishers/:slug/growth
///
/// Compares the publisher's catalog articles across two periods. Falls back
/// to site-wide traffic when the catalog has no articles.
pub async fn growth_handler(
    State(state): State<AppState>,
    SessionContext(session): SessionContext,
    Path(slug): Path<String>,
    Query(params): Query<GrowthParams>,
) -> Result<Json<GrowthResponse>, ApiError> {
    metrics().growth_requests.inc();
    let publisher = authorized_publisher(&state, &session, &slug)?;

    let period: ComparisonPeriod = params.period.as_deref().unwrap_or("day").parse()?;
    let (current_range, previous_range) = params.ranges(period, state.today())?;

    let pipeline = Pipeline::new(&state, publisher);
    let mut warnings = Vec::new();

    let catalog = pipeline.load_catalog(&mut warnings).await;
    let current_rows = pipeline.load_analytics(current_range, &mut warnings).await;
    let previous_rows = pipeline.load_analytics(previous_range, &mut warnings).await;

    let (current, previous) = if catalog.is_empty() {
        (
            MetricSummary::from_analytics(&current_rows),
            MetricSummary::from_analytics(&previous_rows),
        )
    } else {
        (
            MetricSummary::from_reconciled(&pipeline.reconcile(&catalog, &current_rows)?),
            MetricSummary::from_reconciled(&pipeline.reconcile(&catalog, &previous_rows)?),
        )
    };

    let report = compare(&current, &previous);
    let labels = report
        .iter()
        .map(|(metric, growth)| (*metric, format_growth(growth)))
        .collect();

    info!(
        publisher = %publisher.slug,
        period = period.as_str(),
        current = %current_range,
        previous = %previous_range,
        "Growth served"
    );

    Ok(Json(GrowthResponse {
        publisher: PublisherInfo::from(publisher),
        period,
        current: current_range,
        previous: previous_range,
        metrics: report,
        labels,
        warnings,
    }))
}
