//! Aggregation source abstraction.
//!
//! The analytics service never computes aggregates itself; it asks an
//! [`AnalyticsSource`] for grouped values and dataset ranges.

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{AggregateSpec, CityCount, Collection, DateRange};
use crate::time_series::RawObservation;

/// Errors reported by an aggregation source.
#[derive(Debug, Clone, Error)]
pub enum DataSourceError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Data source unavailable: {0}")]
    Unavailable(String),
}

/// Read-only access to grouped aggregates over orders and customers.
#[async_trait::async_trait]
pub trait AnalyticsSource: Send + Sync {
    /// Earliest and latest creation timestamps of a collection, or `None`
    /// when the collection is empty.
    async fn date_range(&self, collection: Collection) -> Result<Option<DateRange>, DataSourceError>;

    /// Values of `spec.metric` grouped by `spec.granularity` periods.
    ///
    /// Periods without data are absent; order is unspecified.
    async fn grouped_aggregate(
        &self,
        spec: AggregateSpec,
    ) -> Result<Vec<RawObservation<f64>>, DataSourceError>;

    /// Customer counts per default-address city, largest first.
    async fn customers_by_city(&self, limit: Option<i64>) -> Result<Vec<CityCount>, DataSourceError>;

    /// Check the source is reachable.
    async fn ping(&self) -> Result<(), DataSourceError> {
        Ok(())
    }
}

/// In-memory source with preloaded results.
///
/// Used by tests and for running the API without a database.
#[derive(Debug, Clone, Default)]
pub struct StaticAnalyticsSource {
    ranges: HashMap<Collection, DateRange>,
    aggregates: HashMap<AggregateSpec, Vec<RawObservation<f64>>>,
    cities: Vec<CityCount>,
    /// Whether every call fails, for testing error paths.
    pub simulate_failure: bool,
}

impl StaticAnalyticsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// A source whose every call fails.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, collection: Collection, range: DateRange) -> Self {
        self.ranges.insert(collection, range);
        self
    }

    pub fn with_aggregate(mut self, spec: AggregateSpec, observations: Vec<RawObservation<f64>>) -> Self {
        self.aggregates.insert(spec, observations);
        self
    }

    pub fn with_cities(mut self, cities: Vec<CityCount>) -> Self {
        self.cities = cities;
        self
    }

    fn check(&self) -> Result<(), DataSourceError> {
        if self.simulate_failure {
            tracing::warn!("Static analytics source simulating failure");
            return Err(DataSourceError::Unavailable("Simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AnalyticsSource for StaticAnalyticsSource {
    async fn date_range(&self, collection: Collection) -> Result<Option<DateRange>, DataSourceError> {
        self.check()?;
        Ok(self.ranges.get(&collection).copied())
    }

    async fn grouped_aggregate(
        &self,
        spec: AggregateSpec,
    ) -> Result<Vec<RawObservation<f64>>, DataSourceError> {
        self.check()?;
        Ok(self.aggregates.get(&spec).cloned().unwrap_or_default())
    }

    async fn customers_by_city(&self, limit: Option<i64>) -> Result<Vec<CityCount>, DataSourceError> {
        self.check()?;
        let mut cities = self.cities.clone();
        cities.sort_by(|a, b| b.customer_count.cmp(&a.customer_count));
        if let Some(limit) = limit {
            cities.truncate(limit.max(0) as usize);
        }
        Ok(cities)
    }

    async fn ping(&self) -> Result<(), DataSourceError> {
        self.check()
    }
}
