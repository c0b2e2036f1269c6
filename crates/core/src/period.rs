//! Date ranges and comparison periods.
//!
//! Dates come in as analytics-style expressions (`today`, `yesterday`,
//! `30daysAgo`, `2024-03-01`) and are always resolved against an explicit
//! "today" so the arithmetic stays pure.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::summary::days_in_month;

static DAYS_AGO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})daysAgo$").expect("invalid daysAgo pattern"));

/// A date expression as accepted by the analytics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateExpr {
    Today,
    Yesterday,
    DaysAgo(u32),
    Date(NaiveDate),
}

impl DateExpr {
    pub fn resolve(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Today => today,
            Self::Yesterday => today - Duration::days(1),
            Self::DaysAgo(n) => today - Duration::days(i64::from(*n)),
            Self::Date(date) => *date,
        }
    }
}

impl FromStr for DateExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "today" => return Ok(Self::Today),
            "yesterday" => return Ok(Self::Yesterday),
            _ => {}
        }

        if let Some(caps) = DAYS_AGO_REGEX.captures(s) {
            let days = caps[1].parse().map_err(|_| invalid_date(s))?;
            return Ok(Self::DaysAgo(days));
        }

        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Self::Date)
            .map_err(|_| invalid_date(s))
    }
}

fn invalid_date(s: &str) -> Error {
    Error::validation_code(
        ValidationErrorCode::InvalidDateRange,
        format!("Invalid date expression: {s:?}"),
    )
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::validation_code(
                ValidationErrorCode::InvalidDateRange,
                format!("Start date {start} is after end date {end}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parses and resolves two date expressions.
    pub fn resolve(start: &str, end: &str, today: NaiveDate) -> Result<Self> {
        let start = start.parse::<DateExpr>()?.resolve(today);
        let end = end.parse::<DateExpr>()?.resolve(today);
        Self::new(start, end)
    }

    /// The `days` days ending on `end`, inclusive.
    pub fn last_days(end: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: end - Duration::days(span),
            end,
        }
    }

    /// Number of days covered, inclusive.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range of equal length immediately before this one.
    pub fn preceding(&self) -> Self {
        let end = self.start - Duration::days(1);
        Self {
            start: end - Duration::days(self.days() - 1),
            end,
        }
    }

    /// The whole calendar month containing `date`.
    pub fn calendar_month(date: NaiveDate) -> Self {
        let start = date.with_day(1).unwrap_or(date);
        let end = date
            .with_day(days_in_month(date.year(), date.month()))
            .unwrap_or(date);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Which two periods a growth report compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonPeriod {
    #[serde(rename = "day")]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
    #[serde(rename = "90days")]
    NinetyDays,
    #[serde(rename = "custom")]
    Custom,
}

impl ComparisonPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::NinetyDays => "90days",
            Self::Custom => "custom",
        }
    }

    /// Resolves `(current, previous)` for the preset periods.
    ///
    /// `Custom` has no preset and must be built with [`ComparisonPeriod::custom`].
    pub fn ranges(&self, today: NaiveDate) -> Result<(DateRange, DateRange)> {
        let current = match self {
            Self::Day => DateRange::last_days(today, 1),
            Self::Week => DateRange::last_days(today, 7),
            Self::NinetyDays => DateRange::last_days(today, 90),
            Self::Month => return Ok(month_to_date(today)),
            Self::Custom => {
                return Err(Error::validation_code(
                    ValidationErrorCode::InvalidDateRange,
                    "Custom comparison requires explicit current and previous ranges",
                ))
            }
        };
        Ok((current, current.preceding()))
    }

    /// Resolves an explicit pair of ranges.
    pub fn custom(
        current: (&str, &str),
        previous: (&str, &str),
        today: NaiveDate,
    ) -> Result<(DateRange, DateRange)> {
        Ok((
            DateRange::resolve(current.0, current.1, today)?,
            DateRange::resolve(previous.0, previous.1, today)?,
        ))
    }
}

impl FromStr for ComparisonPeriod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "90days" => Ok(Self::NinetyDays),
            "custom" => Ok(Self::Custom),
            other => Err(Error::validation_code(
                ValidationErrorCode::InvalidParameter,
                format!("Unknown comparison period: {other:?}"),
            )),
        }
    }
}

/// Month to date vs the same stretch of the previous month.
fn month_to_date(today: NaiveDate) -> (DateRange, DateRange) {
    let current = DateRange {
        start: today.with_day(1).unwrap_or(today),
        end: today,
    };

    let (year, month) = if today.month() == 1 {
        (today.year() - 1, 12)
    } else {
        (today.year(), today.month() - 1)
    };
    let last_day = days_in_month(year, month);
    let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(current.start);
    let end = NaiveDate::from_ymd_opt(year, month, today.day().min(last_day)).unwrap_or(start);

    (current, DateRange { start, end })
}
