//! Dashboard summaries: KPI totals, top pages, author performance,
//! domain comparison and monthly goal progress.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::analytics::{AnalyticsRow, PageMetrics};
use crate::limits::HOME_PATHS;
use crate::normalize::NormalizedKey;
use crate::period::DateRange;
use crate::reconcile::ReconciledRow;

/// The seven dashboard metrics over a set of rows.
///
/// Additive metrics are totals; rate metrics are plain means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSummary {
    pub page_views: f64,
    pub sessions: f64,
    pub total_users: f64,
    pub new_users: f64,
    pub avg_session_duration: f64,
    pub bounce_rate: f64,
    pub engagement_rate: f64,
}

impl MetricSummary {
    /// Sums and averages over every metric record given.
    pub fn from_metrics<'a>(metrics: impl IntoIterator<Item = &'a PageMetrics>) -> Self {
        let mut summary = Self::default();
        let mut count = 0usize;

        for m in metrics {
            summary.page_views += m.page_views as f64;
            summary.sessions += m.sessions as f64;
            summary.total_users += m.total_users as f64;
            summary.new_users += m.new_users as f64;
            summary.avg_session_duration += m.avg_session_duration;
            summary.bounce_rate += m.bounce_rate;
            summary.engagement_rate += m.engagement_rate;
            count += 1;
        }

        if count > 0 {
            let n = count as f64;
            summary.avg_session_duration /= n;
            summary.bounce_rate /= n;
            summary.engagement_rate /= n;
        }
        summary
    }

    /// KPI block over a raw analytics report.
    pub fn from_analytics(rows: &[AnalyticsRow]) -> Self {
        Self::from_metrics(rows.iter().map(|r| &r.metrics))
    }

    /// Totals over reconciled rows; rates averaged over matched rows only,
    /// so zero-filled articles don't drag the averages down.
    pub fn from_reconciled(rows: &[ReconciledRow]) -> Self {
        let mut summary = Self::from_metrics(rows.iter().filter(|r| r.matched).map(|r| &r.metrics));
        // Unmatched rows are all zero, so the additive totals are unaffected.
        summary.page_views = rows.iter().map(|r| r.metrics.page_views as f64).sum();
        summary
    }
}

/// The `n` articles with the most page views, highest first.
///
/// Ties keep catalog order.
pub fn top_pages(rows: &[ReconciledRow], n: usize) -> Vec<ReconciledRow> {
    let mut sorted: Vec<&ReconciledRow> = rows.iter().collect();
    sorted.sort_by(|a, b| b.metrics.page_views.cmp(&a.metrics.page_views));
    sorted.into_iter().take(n).cloned().collect()
}

/// Page views per author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorStats {
    pub author: String,
    pub page_views: u64,
    pub articles: usize,
    pub avg_per_article: f64,
}

/// Aggregates page views by author, optionally restricted to articles
/// published within `published`. Undated articles are dropped by the filter.
///
/// Sorted by page views descending, then author name.
pub fn author_performance(
    rows: &[ReconciledRow],
    published: Option<DateRange>,
) -> Vec<AuthorStats> {
    let mut by_author: BTreeMap<&str, (u64, usize)> = BTreeMap::new();

    for row in rows {
        let Some(author) = row.catalog.author.as_deref().map(str::trim) else {
            continue;
        };
        if author.is_empty() {
            continue;
        }

        if let Some(range) = published {
            match row.catalog.published_at {
                Some(date) if range.contains(date) => {}
                _ => continue,
            }
        }

        let entry = by_author.entry(author).or_default();
        entry.0 += row.metrics.page_views;
        entry.1 += 1;
    }

    let mut stats: Vec<AuthorStats> = by_author
        .into_iter()
        .map(|(author, (page_views, articles))| AuthorStats {
            author: author.to_string(),
            page_views,
            articles,
            avg_per_article: page_views as f64 / articles as f64,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.page_views
            .cmp(&a.page_views)
            .then_with(|| a.author.cmp(&b.author))
    });
    stats
}

/// Catalog traffic relative to the whole domain (home page excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainComparison {
    pub domain_page_views: u64,
    pub domain_non_home_page_views: u64,
    pub domain_non_home_pages: usize,
    pub domain_avg_per_page: f64,
    pub catalog_page_views: u64,
    pub catalog_pages: usize,
    pub catalog_avg_per_page: f64,
    /// Catalog share of non-home domain traffic, percent.
    pub catalog_share: Option<f64>,
}

impl DomainComparison {
    pub fn compute(analytics: &[AnalyticsRow], reconciled: &[ReconciledRow]) -> Self {
        let domain_page_views: u64 = analytics.iter().map(|r| r.metrics.page_views).sum();

        let non_home: Vec<&AnalyticsRow> = analytics
            .iter()
            .filter(|r| !HOME_PATHS.contains(&r.page_path.as_str()))
            .collect();
        let domain_non_home_page_views: u64 = non_home.iter().map(|r| r.metrics.page_views).sum();
        let domain_non_home_pages = non_home
            .iter()
            .map(|r| r.page_path.as_str())
            .collect::<HashSet<_>>()
            .len();

        let catalog_page_views: u64 = reconciled.iter().map(|r| r.metrics.page_views).sum();
        let catalog_pages = reconciled.len();

        Self {
            domain_page_views,
            domain_non_home_page_views,
            domain_non_home_pages,
            domain_avg_per_page: ratio(domain_non_home_page_views, domain_non_home_pages),
            catalog_page_views,
            catalog_pages,
            catalog_avg_per_page: ratio(catalog_page_views, catalog_pages),
            catalog_share: (domain_non_home_page_views > 0).then(|| {
                catalog_page_views as f64 / domain_non_home_page_views as f64 * 100.0
            }),
        }
    }
}

fn ratio(total: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

/// Month-to-date progress towards a page view goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyProgress {
    pub goal: u64,
    pub page_views: u64,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub daily_average: f64,
    pub projected: f64,
    /// Percent of the goal reached so far.
    pub goal_percentage: f64,
    /// Percent of the goal the projection would reach.
    pub projected_percentage: f64,
    /// Day-by-day series from the 1st of the month to today.
    pub daily: Vec<DailyProgress>,
}

impl MonthlyProgress {
    pub fn compute(page_views: u64, goal: u64, today: NaiveDate) -> Self {
        let days_elapsed = today.day();
        let days_in_month = days_in_month(today.year(), today.month());
        let daily_average = page_views as f64 / days_elapsed as f64;
        let projected = daily_average * days_in_month as f64;

        let pct = |value: f64| {
            if goal == 0 {
                0.0
            } else {
                value / goal as f64 * 100.0
            }
        };

        Self {
            goal,
            page_views,
            days_elapsed,
            days_in_month,
            daily_average,
            projected,
            goal_percentage: pct(page_views as f64),
            projected_percentage: pct(projected),
            daily: Vec::new(),
        }
    }

    pub fn with_daily(mut self, daily: Vec<DailyProgress>) -> Self {
        self.daily = daily;
        self
    }
}

/// One day of the month-to-date series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub page_views: u64,
    /// Page views from the 1st of the month through this day.
    pub cumulative: u64,
    /// Where a linear path to the goal would be by the end of this day.
    pub goal_line: f64,
}

/// Daily page views of catalog articles from the 1st of the month to
/// `today`, with the running total and a linear goal line.
///
/// Every day appears once, zero when there was no traffic. Report rows
/// without a date, outside the month, or not in `catalog_keys` are ignored.
pub fn daily_progression(
    report: &[AnalyticsRow],
    catalog_keys: &HashSet<NormalizedKey>,
    domain: &str,
    goal: u64,
    today: NaiveDate,
) -> Vec<DailyProgress> {
    let month = DateRange::calendar_month(today);
    let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();

    for row in report {
        let Some(date) = row.date else {
            continue;
        };
        if date > today || !month.contains(date) {
            continue;
        }
        let key = NormalizedKey::from_page_path(domain, &row.page_path);
        if key.is_empty() || !catalog_keys.contains(&key) {
            continue;
        }
        *by_day.entry(date).or_default() += row.metrics.page_views;
    }

    let per_day_goal = goal as f64 / days_in_month(today.year(), today.month()) as f64;
    let mut cumulative = 0;

    month
        .start
        .iter_days()
        .take_while(|d| *d <= today)
        .enumerate()
        .map(|(i, date)| {
            let page_views = by_day.get(&date).copied().unwrap_or(0);
            cumulative += page_views;
            DailyProgress {
                date,
                page_views,
                cumulative,
                goal_line: per_day_goal * (i + 1) as f64,
            }
        })
        .collect()
}

/// Number of days in the given month.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}
