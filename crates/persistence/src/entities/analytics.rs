//! Analytics database entities.

use chrono::{DateTime, Utc};
use domain::models::{CityCount, DateRange};
use domain::time_series::{Observation, RawObservation, RawPeriodKey};
use sqlx::FromRow;

/// One grouped aggregate row: period fields plus the aggregated value.
///
/// Period fields the grouping does not use come back as NULL.
#[derive(Debug, Clone, FromRow)]
pub struct PeriodAggregateEntity {
    pub year: i32,
    pub month: Option<i32>,
    pub day: Option<i32>,
    pub quarter: Option<i32>,
    pub value: Option<f64>,
}

impl From<PeriodAggregateEntity> for RawObservation<f64> {
    fn from(row: PeriodAggregateEntity) -> Self {
        let field = |v: Option<i32>| v.and_then(|v| u32::try_from(v).ok());
        let key = RawPeriodKey {
            year: row.year,
            month: field(row.month),
            day: field(row.day),
            quarter: field(row.quarter),
        };
        Observation::new(key, row.value.unwrap_or(0.0))
    }
}

/// Creation timestamp bounds of a table; both NULL when it is empty.
#[derive(Debug, Clone, FromRow)]
pub struct DateRangeEntity {
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

impl DateRangeEntity {
    pub fn into_range(self) -> Option<DateRange> {
        match (self.min_date, self.max_date) {
            (Some(min), Some(max)) => Some(DateRange { min, max }),
            _ => None,
        }
    }
}

/// Customer count per city entity.
#[derive(Debug, Clone, FromRow)]
pub struct CityCountEntity {
    pub city: Option<String>,
    pub customer_count: i64,
}

impl From<CityCountEntity> for CityCount {
    fn from(row: CityCountEntity) -> Self {
        CityCount {
            city: row.city,
            customer_count: row.customer_count,
        }
    }
}
