//! Database entity definitions (row mappings).

pub mod analytics;

pub use analytics::{CityCountEntity, DateRangeEntity, PeriodAggregateEntity};
