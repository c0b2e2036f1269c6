//! Period-over-period growth.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::summary::MetricSummary;

/// The seven dashboard metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    PageViews,
    Sessions,
    TotalUsers,
    NewUsers,
    AvgSessionDuration,
    BounceRate,
    EngagementRate,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::PageViews,
        Metric::Sessions,
        Metric::TotalUsers,
        Metric::NewUsers,
        Metric::AvgSessionDuration,
        Metric::BounceRate,
        Metric::EngagementRate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageViews => "pageViews",
            Self::Sessions => "sessions",
            Self::TotalUsers => "totalUsers",
            Self::NewUsers => "newUsers",
            Self::AvgSessionDuration => "avgSessionDuration",
            Self::BounceRate => "bounceRate",
            Self::EngagementRate => "engagementRate",
        }
    }

    /// Reads this metric out of a summary.
    pub fn value(&self, summary: &MetricSummary) -> f64 {
        match self {
            Self::PageViews => summary.page_views,
            Self::Sessions => summary.sessions,
            Self::TotalUsers => summary.total_users,
            Self::NewUsers => summary.new_users,
            Self::AvgSessionDuration => summary.avg_session_duration,
            Self::BounceRate => summary.bounce_rate,
            Self::EngagementRate => summary.engagement_rate,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Growth of a single metric between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricGrowth {
    pub current: f64,
    pub previous: f64,
    pub growth_absolute: f64,
    /// `+inf` when the metric went from zero to something.
    #[serde(with = "percentage")]
    pub growth_percentage: f64,
}

impl MetricGrowth {
    pub fn new(current: f64, previous: f64) -> Self {
        Self {
            current,
            previous,
            growth_absolute: current - previous,
            growth_percentage: growth_percentage(current, previous),
        }
    }

    /// Whether the metric had no baseline and now has traffic.
    pub fn is_new(&self) -> bool {
        self.growth_percentage.is_infinite()
    }
}

/// Growth per metric, ordered as [`Metric::ALL`].
pub type GrowthReport = BTreeMap<Metric, MetricGrowth>;

/// Percentage change from `previous` to `current`.
///
/// | previous | current | result |
/// |---|---|---|
/// | > 0 | any | `(current - previous) / previous * 100` |
/// | 0 | > 0 | `+inf` |
/// | 0 | 0 | `0` |
pub fn growth_percentage(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Compares two period summaries metric by metric.
pub fn compare(current: &MetricSummary, previous: &MetricSummary) -> GrowthReport {
    Metric::ALL
        .iter()
        .map(|m| (*m, MetricGrowth::new(m.value(current), m.value(previous))))
        .collect()
}

/// Human-readable label such as `+50.0% (+25)` or `new (+50)`.
pub fn format_growth(growth: &MetricGrowth) -> String {
    let absolute = format_signed(growth.growth_absolute);

    if growth.is_new() {
        return format!("new ({absolute})");
    }

    let pct = growth.growth_percentage;
    if pct > 0.0 {
        format!("+{pct:.1}% ({absolute})")
    } else {
        format!("{pct:.1}% ({absolute})")
    }
}

fn format_signed(value: f64) -> String {
    let rounded = if value.fract() == 0.0 {
        format!("{}", value.abs() as i64)
    } else {
        format!("{:.2}", value.abs())
    };

    if value > 0.0 {
        format!("+{rounded}")
    } else if value < 0.0 {
        format!("-{rounded}")
    } else {
        rounded
    }
}

/// JSON has no infinity; an infinite growth percentage is written as `"new"`.
mod percentage {
    use super::*;

    const NEW: &str = "new";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() {
            serializer.serialize_str(NEW)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Label(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Label(s) if s == NEW => Ok(f64::INFINITY),
            Repr::Label(s) => Err(serde::de::Error::custom(format!(
                "invalid growth percentage: {s}"
            ))),
        }
    }
}
