//! Analytics repository.
//!
//! PostgreSQL implementation of [`AnalyticsSource`]: every aggregate is
//! computed by the database, grouped by calendar periods in UTC.

use domain::models::{AggregateSpec, CityCount, Collection, DateRange, Metric};
use domain::services::{AnalyticsSource, DataSourceError};
use domain::time_series::{Granularity, RawObservation};
use sqlx::PgPool;

use crate::entities::{CityCountEntity, DateRangeEntity, PeriodAggregateEntity};
use crate::metrics::QueryTimer;

/// Repository for analytics queries over `orders` and `customers`.
#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AnalyticsSource for AnalyticsRepository {
    async fn date_range(&self, collection: Collection) -> Result<Option<DateRange>, DataSourceError> {
        let timer = QueryTimer::new(format!("{}_date_range", collection.as_str()));
        let row = sqlx::query_as::<_, DateRangeEntity>(&date_range_sql(collection))
            .fetch_one(&self.pool)
            .await;
        timer.record();

        Ok(row.map_err(source_error)?.into_range())
    }

    async fn grouped_aggregate(
        &self,
        spec: AggregateSpec,
    ) -> Result<Vec<RawObservation<f64>>, DataSourceError> {
        let timer = QueryTimer::new(format!(
            "grouped_{}_{}",
            spec.metric.field_name(),
            spec.granularity
        ));
        let rows = sqlx::query_as::<_, PeriodAggregateEntity>(&aggregate_sql(spec))
            .fetch_all(&self.pool)
            .await;
        timer.record();

        let rows = rows.map_err(source_error)?;
        tracing::debug!(
            metric = spec.metric.field_name(),
            granularity = %spec.granularity,
            rows = rows.len(),
            "Fetched grouped aggregate"
        );

        Ok(rows.into_iter().map(RawObservation::from).collect())
    }

    async fn customers_by_city(&self, limit: Option<i64>) -> Result<Vec<CityCount>, DataSourceError> {
        let timer = QueryTimer::new("customers_by_city");
        // LIMIT NULL means no limit
        let rows = sqlx::query_as::<_, CityCountEntity>(
            r#"
            SELECT default_city AS city, COUNT(*)::bigint AS customer_count
            FROM customers
            GROUP BY default_city
            ORDER BY customer_count DESC, city ASC NULLS LAST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        Ok(rows
            .map_err(source_error)?
            .into_iter()
            .map(CityCount::from)
            .collect())
    }

    async fn ping(&self) -> Result<(), DataSourceError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(source_error)
    }
}

/// Map a sqlx error onto the source error taxonomy.
fn source_error(err: sqlx::Error) -> DataSourceError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            tracing::error!(error = %err, "Database unavailable");
            DataSourceError::Unavailable(err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "Analytics query failed");
            DataSourceError::Query(err.to_string())
        }
    }
}

fn table(collection: Collection) -> &'static str {
    match collection {
        Collection::Orders => "orders",
        Collection::Customers => "customers",
    }
}

fn date_range_sql(collection: Collection) -> String {
    format!(
        "SELECT MIN(created_at) AS min_date, MAX(created_at) AS max_date FROM {}",
        table(collection)
    )
}

/// Select list producing `year, month, day, quarter` for `granularity`,
/// with unused fields as NULL.
fn period_columns(granularity: Granularity, column: &str) -> String {
    let part = |field: &str| format!("EXTRACT({field} FROM ({column} AT TIME ZONE 'UTC'))::int4");
    let null = "NULL::int4".to_string();

    let (month, day, quarter) = match granularity {
        Granularity::Daily => (part("MONTH"), part("DAY"), null),
        Granularity::Monthly => (part("MONTH"), null.clone(), null),
        Granularity::Quarterly => (null.clone(), null, part("QUARTER")),
        Granularity::Yearly => (null.clone(), null.clone(), null),
    };

    format!(
        "{} AS year, {month} AS month, {day} AS day, {quarter} AS quarter",
        part("YEAR")
    )
}

fn aggregate_sql(spec: AggregateSpec) -> String {
    match spec.metric {
        Metric::TotalSales => format!(
            "SELECT {}, SUM(total_price)::float8 AS value \
             FROM orders GROUP BY 1, 2, 3, 4",
            period_columns(spec.granularity, "created_at")
        ),
        Metric::NewCustomers => format!(
            "SELECT {}, COUNT(*)::float8 AS value \
             FROM customers GROUP BY 1, 2, 3, 4",
            period_columns(spec.granularity, "created_at")
        ),
        Metric::AvgLifetimeValue => format!(
            "WITH lifetime AS ( \
                 SELECT customer_id, MIN(created_at) AS first_order_at, \
                        SUM(total_price) AS lifetime_value \
                 FROM orders WHERE customer_id IS NOT NULL GROUP BY customer_id \
             ) \
             SELECT {}, AVG(lifetime_value)::float8 AS value \
             FROM lifetime GROUP BY 1, 2, 3, 4",
            period_columns(spec.granularity, "first_order_at")
        ),
        // Customer-days with more than one order, counted per period.
        Metric::RepeatCustomers => format!(
            "WITH repeat_days AS ( \
                 SELECT {}, customer_id, MIN(created_at) AS order_day_at \
                 FROM orders WHERE customer_id IS NOT NULL \
                 GROUP BY 1, 2, 3, 4, customer_id HAVING COUNT(*) > 1 \
             ) \
             SELECT {}, COUNT(*)::float8 AS value \
             FROM repeat_days GROUP BY 1, 2, 3, 4",
            period_columns(Granularity::Daily, "created_at"),
            period_columns(spec.granularity, "order_day_at")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_columns_monthly() {
        let sql = period_columns(Granularity::Monthly, "created_at");
        assert!(sql.contains("EXTRACT(YEAR FROM (created_at AT TIME ZONE 'UTC'))::int4 AS year"));
        assert!(sql.contains("EXTRACT(MONTH FROM (created_at AT TIME ZONE 'UTC'))::int4 AS month"));
        assert!(sql.contains("NULL::int4 AS day"));
        assert!(sql.contains("NULL::int4 AS quarter"));
    }

    #[test]
    fn test_period_columns_quarterly_omits_month() {
        let sql = period_columns(Granularity::Quarterly, "created_at");
        assert!(sql.contains("NULL::int4 AS month"));
        assert!(sql.contains("EXTRACT(QUARTER FROM (created_at AT TIME ZONE 'UTC'))::int4 AS quarter"));
    }

    #[test]
    fn test_period_columns_yearly() {
        let sql = period_columns(Granularity::Yearly, "first_order_at");
        assert_eq!(sql.matches("NULL::int4").count(), 3);
        assert!(sql.contains("first_order_at"));
    }

    #[test]
    fn test_aggregate_sql_targets_right_table() {
        let sales = aggregate_sql(AggregateSpec::new(Metric::TotalSales, Granularity::Daily));
        assert!(sales.contains("FROM orders"));
        assert!(sales.contains("SUM(total_price)"));

        let customers = aggregate_sql(AggregateSpec::new(Metric::NewCustomers, Granularity::Monthly));
        assert!(customers.contains("FROM customers"));
    }

    #[test]
    fn test_repeat_customers_sql_requires_multiple_orders() {
        let sql = aggregate_sql(AggregateSpec::new(Metric::RepeatCustomers, Granularity::Quarterly));
        assert!(sql.contains("HAVING COUNT(*) > 1"));
        assert!(sql.contains("customer_id IS NOT NULL"));
    }

    #[test]
    fn test_repeat_customers_groups_orders_per_day() {
        for granularity in Granularity::ALL {
            let sql = aggregate_sql(AggregateSpec::new(Metric::RepeatCustomers, granularity));
            let (inner, outer) = sql.split_once(") SELECT").unwrap();

            // Orders are bucketed by customer and calendar day first
            assert!(inner.contains(&period_columns(Granularity::Daily, "created_at")));
            assert!(inner.contains("EXTRACT(DAY FROM (created_at AT TIME ZONE 'UTC'))"));
            assert!(inner.contains("GROUP BY 1, 2, 3, 4, customer_id"));

            // then each repeat day is counted in its reporting period
            assert!(outer.contains(&period_columns(granularity, "order_day_at")));
            assert!(outer.contains("COUNT(*)::float8 AS value"));
        }
    }

    #[test]
    fn test_lifetime_value_groups_by_first_order() {
        let sql = aggregate_sql(AggregateSpec::new(Metric::AvgLifetimeValue, Granularity::Monthly));
        assert!(sql.contains("MIN(created_at) AS first_order_at"));
        assert!(sql.contains("(first_order_at AT TIME ZONE 'UTC')"));
    }

    #[test]
    fn test_date_range_sql() {
        assert_eq!(
            date_range_sql(Collection::Customers),
            "SELECT MIN(created_at) AS min_date, MAX(created_at) AS max_date FROM customers"
        );
    }

    #[test]
    fn test_source_error_mapping() {
        assert!(matches!(
            source_error(sqlx::Error::PoolTimedOut),
            DataSourceError::Unavailable(_)
        ));
        assert!(matches!(
            source_error(sqlx::Error::RowNotFound),
            DataSourceError::Query(_)
        ));
    }
}
