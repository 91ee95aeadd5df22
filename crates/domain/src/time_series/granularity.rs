//! Reporting granularity for time series.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::TimeSeriesError;

/// Size of the calendar bucket a series is reported at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Daily,
    Monthly,
    Quarterly,
    Yearly,
}

impl Granularity {
    /// All granularities, finest first.
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Monthly,
        Granularity::Quarterly,
        Granularity::Yearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Monthly => "monthly",
            Granularity::Quarterly => "quarterly",
            Granularity::Yearly => "yearly",
        }
    }

    /// First day of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        let first_month = match self {
            Granularity::Daily => return date,
            Granularity::Monthly => date.month(),
            Granularity::Quarterly => (date.month() - 1) / 3 * 3 + 1,
            Granularity::Yearly => 1,
        };
        // Day 1 exists in every month.
        date.with_day(1)
            .and_then(|d| d.with_month(first_month))
            .unwrap_or(date)
    }

    /// Start of the period following the one that starts at `period_start`.
    ///
    /// Returns `None` once the calendar range of `NaiveDate` is exhausted.
    pub fn successor(&self, period_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Daily => period_start.succ_opt(),
            Granularity::Monthly => period_start.checked_add_months(Months::new(1)),
            Granularity::Quarterly => period_start.checked_add_months(Months::new(3)),
            Granularity::Yearly => period_start.checked_add_months(Months::new(12)),
        }
    }

    /// Number of periods from the one starting at `from` through the one
    /// containing `to`, inclusive. Zero when `from` is after `to`.
    pub(crate) fn periods_between(&self, from: NaiveDate, to: NaiveDate) -> usize {
        if from > to {
            return 0;
        }
        let months = |d: NaiveDate| d.year() as i64 * 12 + d.month0() as i64;
        let count = match self {
            Granularity::Daily => (to - from).num_days() + 1,
            Granularity::Monthly => months(to) - months(from) + 1,
            Granularity::Quarterly => months(to).div_euclid(3) - months(from).div_euclid(3) + 1,
            Granularity::Yearly => (to.year() - from.year()) as i64 + 1,
        };
        count.max(0) as usize
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = TimeSeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "monthly" => Ok(Granularity::Monthly),
            "quarterly" => Ok(Granularity::Quarterly),
            "yearly" => Ok(Granularity::Yearly),
            other => Err(TimeSeriesError::InvalidGranularity(other.to_string())),
        }
    }
}
