//! Calendar bucket identifiers.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Granularity, TimeSeriesError};

/// Identifier of one calendar bucket, tagged by its granularity.
///
/// Equality is structural: a month key never equals a quarter key even when
/// their numbers coincide. The derived ordering is chronological among keys
/// of the same granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "RawPeriodKey", try_from = "RawPeriodKey")]
pub enum PeriodKey {
    Day { year: i32, month: u32, day: u32 },
    Month { year: i32, month: u32 },
    Quarter { year: i32, quarter: u32 },
    Year { year: i32 },
}

impl PeriodKey {
    /// Key of the period at `granularity` that contains `date`.
    pub fn containing(date: NaiveDate, granularity: Granularity) -> Self {
        let year = date.year();
        match granularity {
            Granularity::Daily => PeriodKey::Day {
                year,
                month: date.month(),
                day: date.day(),
            },
            Granularity::Monthly => PeriodKey::Month {
                year,
                month: date.month(),
            },
            Granularity::Quarterly => PeriodKey::Quarter {
                year,
                quarter: quarter_of(date.month()),
            },
            Granularity::Yearly => PeriodKey::Year { year },
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self {
            PeriodKey::Day { .. } => Granularity::Daily,
            PeriodKey::Month { .. } => Granularity::Monthly,
            PeriodKey::Quarter { .. } => Granularity::Quarterly,
            PeriodKey::Year { .. } => Granularity::Yearly,
        }
    }

    /// First calendar day of the period.
    pub fn start_date(&self) -> Option<NaiveDate> {
        match *self {
            PeriodKey::Day { year, month, day } => NaiveDate::from_ymd_opt(year, month, day),
            PeriodKey::Month { year, month } => NaiveDate::from_ymd_opt(year, month, 1),
            PeriodKey::Quarter { year, quarter } => {
                NaiveDate::from_ymd_opt(year, (quarter.checked_sub(1)?) * 3 + 1, 1)
            }
            PeriodKey::Year { year } => NaiveDate::from_ymd_opt(year, 1, 1),
        }
    }

    /// The calendar successor of this key at its own granularity.
    pub fn successor(&self) -> Option<Self> {
        let granularity = self.granularity();
        let next = granularity.successor(self.start_date()?)?;
        Some(PeriodKey::containing(next, granularity))
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day { year, month, day } => write!(f, "{year:04}-{month:02}-{day:02}"),
            PeriodKey::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            PeriodKey::Quarter { year, quarter } => write!(f, "{year:04}-Q{quarter}"),
            PeriodKey::Year { year } => write!(f, "{year:04}"),
        }
    }
}

/// Quarter (1-4) containing a month (1-12). Out-of-range months clamp to
/// the nearest quarter.
pub(crate) fn quarter_of(month: u32) -> u32 {
    month.clamp(1, 12).saturating_sub(1) / 3 + 1
}

/// Grouping key as returned by an aggregation source: every field but the
/// year is optional, and nothing guarantees the fields fit a granularity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPeriodKey {
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quarter: Option<u32>,
}

impl RawPeriodKey {
    pub fn year(year: i32) -> Self {
        Self {
            year,
            ..Default::default()
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
            ..Default::default()
        }
    }

    pub fn day(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month: Some(month),
            day: Some(day),
            quarter: None,
        }
    }

    pub fn quarter(year: i32, quarter: u32) -> Self {
        Self {
            year,
            quarter: Some(quarter),
            ..Default::default()
        }
    }

    /// Granularity implied by which fields are populated, if any.
    pub fn inferred_granularity(&self) -> Option<Granularity> {
        match (self.month, self.day, self.quarter) {
            (Some(_), Some(_), None) => Some(Granularity::Daily),
            (Some(_), None, None) => Some(Granularity::Monthly),
            (None, None, Some(_)) => Some(Granularity::Quarterly),
            (None, None, None) => Some(Granularity::Yearly),
            _ => None,
        }
    }

    /// Convert into a [`PeriodKey`] for `granularity`.
    ///
    /// Fails when the populated fields are not exactly the ones the
    /// granularity uses, or when a field is out of calendar range.
    pub fn normalize(&self, granularity: Granularity) -> Result<PeriodKey, TimeSeriesError> {
        let malformed = || TimeSeriesError::MalformedObservationKey {
            granularity,
            key: *self,
        };

        let key = match (granularity, self.month, self.day, self.quarter) {
            (Granularity::Daily, Some(month), Some(day), None) => {
                NaiveDate::from_ymd_opt(self.year, month, day).ok_or_else(malformed)?;
                PeriodKey::Day {
                    year: self.year,
                    month,
                    day,
                }
            }
            (Granularity::Monthly, Some(month), None, None) if (1..=12).contains(&month) => {
                PeriodKey::Month {
                    year: self.year,
                    month,
                }
            }
            (Granularity::Quarterly, None, None, Some(quarter)) if (1..=4).contains(&quarter) => {
                PeriodKey::Quarter {
                    year: self.year,
                    quarter,
                }
            }
            (Granularity::Yearly, None, None, None) => PeriodKey::Year { year: self.year },
            _ => return Err(malformed()),
        };
        Ok(key)
    }
}

impl fmt::Display for RawPeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{year: {}", self.year)?;
        if let Some(month) = self.month {
            write!(f, ", month: {month}")?;
        }
        if let Some(day) = self.day {
            write!(f, ", day: {day}")?;
        }
        if let Some(quarter) = self.quarter {
            write!(f, ", quarter: {quarter}")?;
        }
        f.write_str("}")
    }
}

impl From<PeriodKey> for RawPeriodKey {
    fn from(key: PeriodKey) -> Self {
        match key {
            PeriodKey::Day { year, month, day } => RawPeriodKey::day(year, month, day),
            PeriodKey::Month { year, month } => RawPeriodKey::month(year, month),
            PeriodKey::Quarter { year, quarter } => RawPeriodKey::quarter(year, quarter),
            PeriodKey::Year { year } => RawPeriodKey::year(year),
        }
    }
}

impl TryFrom<RawPeriodKey> for PeriodKey {
    type Error = TimeSeriesError;

    fn try_from(raw: RawPeriodKey) -> Result<Self, Self::Error> {
        let granularity = raw
            .inferred_granularity()
            .ok_or(TimeSeriesError::UnrecognizedKeyShape(raw))?;
        raw.normalize(granularity)
    }
}
