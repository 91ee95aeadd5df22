//! Analytics service: turns source aggregates into response series.

use std::sync::Arc;

use crate::models::{
    AggregateSpec, CityCount, DateRange, Metric, RepeatCustomersReport, SalesGrowthPoint,
};
use crate::services::growth::derive_growth;
use crate::services::source::{AnalyticsSource, DataSourceError};
use crate::time_series::{
    densify, generate, DenseSeries, Granularity, MetricSeries, Observation, SeriesPoint,
    SparseSeries,
};

/// Builds analytics series on top of an [`AnalyticsSource`].
#[derive(Clone)]
pub struct AnalyticsService {
    source: Arc<dyn AnalyticsSource>,
}

impl AnalyticsService {
    pub fn new(source: Arc<dyn AnalyticsSource>) -> Self {
        Self { source }
    }

    /// Sum of order totals per period.
    pub async fn sales_over_time(
        &self,
        granularity: Granularity,
        fill: bool,
    ) -> Result<MetricSeries<f64>, DataSourceError> {
        let points = self.amount_series(Metric::TotalSales, granularity, fill).await?;
        Ok(MetricSeries::new(Metric::TotalSales.field_name(), points))
    }

    /// Sales per period with the percentage change from the previous entry.
    pub async fn sales_growth_rate(
        &self,
        granularity: Granularity,
        fill: bool,
    ) -> Result<Vec<SalesGrowthPoint>, DataSourceError> {
        let points = self.amount_series(Metric::TotalSales, granularity, fill).await?;

        Ok(derive_growth(points)
            .into_iter()
            .map(|g| SalesGrowthPoint {
                period: g.period,
                total_sales: g.value,
                growth_rate: g.growth_rate,
            })
            .collect())
    }

    /// Customers created per period.
    pub async fn new_customers_over_time(
        &self,
        granularity: Granularity,
        fill: bool,
    ) -> Result<MetricSeries<i64>, DataSourceError> {
        let spec = AggregateSpec::new(Metric::NewCustomers, granularity);
        let sparse = self.count_observations(spec).await?;
        let range = if fill {
            self.source.date_range(Metric::NewCustomers.collection()).await?
        } else {
            None
        };

        Ok(MetricSeries::new(
            Metric::NewCustomers.field_name(),
            complete(sparse, range, 0),
        ))
    }

    /// Average customer lifetime value by the period of the first order.
    pub async fn customer_lifetime_value(
        &self,
        granularity: Granularity,
        fill: bool,
    ) -> Result<MetricSeries<f64>, DataSourceError> {
        let points = self
            .amount_series(Metric::AvgLifetimeValue, granularity, fill)
            .await?;
        Ok(MetricSeries::new(Metric::AvgLifetimeValue.field_name(), points))
    }

    /// Customer counts per city, largest first.
    pub async fn geographical_distribution(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<CityCount>, DataSourceError> {
        self.source.customers_by_city(limit).await
    }

    /// Dense repeat-customer series at every granularity over the order range.
    pub async fn repeat_customers(&self) -> Result<RepeatCustomersReport, DataSourceError> {
        let spec = |g| AggregateSpec::new(Metric::RepeatCustomers, g);

        let (range, daily, monthly, quarterly, yearly) = tokio::try_join!(
            self.source.date_range(Metric::RepeatCustomers.collection()),
            self.count_observations(spec(Granularity::Daily)),
            self.count_observations(spec(Granularity::Monthly)),
            self.count_observations(spec(Granularity::Quarterly)),
            self.count_observations(spec(Granularity::Yearly)),
        )?;

        let name = Metric::RepeatCustomers.field_name();
        // An empty order collection has no range and yields empty series.
        let dense = |sparse: SparseSeries<i64>| match range {
            Some(range) => fill_range(&sparse, range, 0),
            None => DenseSeries::default(),
        };

        Ok(RepeatCustomersReport {
            daily: dense(daily).named(name),
            monthly: dense(monthly).named(name),
            quarterly: dense(quarterly).named(name),
            yearly: dense(yearly).named(name),
        })
    }

    async fn amount_series(
        &self,
        metric: Metric,
        granularity: Granularity,
        fill: bool,
    ) -> Result<Vec<SeriesPoint<f64>>, DataSourceError> {
        let raw = self
            .source
            .grouped_aggregate(AggregateSpec::new(metric, granularity))
            .await?;
        let sparse = SparseSeries::from_raw(granularity, raw);
        let range = if fill {
            self.source.date_range(metric.collection()).await?
        } else {
            None
        };

        Ok(complete(sparse, range, 0.0))
    }

    async fn count_observations(
        &self,
        spec: AggregateSpec,
    ) -> Result<SparseSeries<i64>, DataSourceError> {
        let raw = self.source.grouped_aggregate(spec).await?;
        let counts = raw
            .into_iter()
            .map(|o| Observation::new(o.key, o.value.round() as i64));
        Ok(SparseSeries::from_raw(spec.granularity, counts))
    }
}

/// Densify over `range` when given, otherwise return the observed periods in
/// calendar order.
fn complete<V: Clone>(
    sparse: SparseSeries<V>,
    range: Option<DateRange>,
    default: V,
) -> Vec<SeriesPoint<V>> {
    match range {
        Some(range) => fill_range(&sparse, range, default).into_points(),
        None => sparse.into_sorted_points(),
    }
}

fn fill_range<V: Clone>(sparse: &SparseSeries<V>, range: DateRange, default: V) -> DenseSeries<V> {
    let periods = generate(range.min, range.max, sparse.granularity());
    let series = densify(sparse.values(), periods, default);

    tracing::debug!(
        granularity = %sparse.granularity(),
        periods = series.len(),
        observed = sparse.len(),
        dropped = sparse.dropped(),
        "Completed time series"
    );

    series
}
