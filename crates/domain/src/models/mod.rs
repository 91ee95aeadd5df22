//! Domain models for storefront analytics.

pub mod analytics;

pub use analytics::{
    AggregateSpec, CityCount, Collection, DateRange, Metric, RepeatCustomersReport,
    SalesGrowthPoint, TrendQuery,
};
