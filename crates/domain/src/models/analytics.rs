//! Storefront analytics domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_series::{Granularity, MetricSeries, PeriodKey};

/// Dataset a metric is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Orders,
    Customers,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Customers => "customers",
        }
    }
}

/// Per-period metrics the aggregation source can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Sum of order totals.
    TotalSales,
    /// Customers created in the period.
    NewCustomers,
    /// Average lifetime value of customers whose first order falls in the period.
    AvgLifetimeValue,
    /// Customer-days with more than one order, counted per period.
    RepeatCustomers,
}

impl Metric {
    /// Field name used for the value in serialized series.
    pub fn field_name(&self) -> &'static str {
        match self {
            Metric::TotalSales => "total_sales",
            Metric::NewCustomers => "new_customers",
            Metric::AvgLifetimeValue => "avg_lifetime_value",
            Metric::RepeatCustomers => "repeat_customers",
        }
    }

    /// Collection whose date range bounds the metric's series.
    pub fn collection(&self) -> Collection {
        match self {
            Metric::NewCustomers => Collection::Customers,
            Metric::TotalSales | Metric::AvgLifetimeValue | Metric::RepeatCustomers => {
                Collection::Orders
            }
        }
    }
}

/// What to aggregate and at which granularity to group it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AggregateSpec {
    pub metric: Metric,
    pub granularity: Granularity,
}

impl AggregateSpec {
    pub fn new(metric: Metric, granularity: Granularity) -> Self {
        Self {
            metric,
            granularity,
        }
    }
}

/// Earliest and latest timestamps of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub min: DateTime<Utc>,
    pub max: DateTime<Utc>,
}

/// Query parameters for period trend endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendQuery {
    /// daily, monthly, quarterly or yearly
    #[serde(default)]
    pub granularity: Option<String>,
    /// Zero-fill periods without data across the dataset range
    #[serde(default)]
    pub fill: bool,
}

/// Customer count for one default-address city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityCount {
    #[serde(rename = "_id")]
    pub city: Option<String>,
    pub customer_count: i64,
}

/// Sales total with its change from the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesGrowthPoint {
    #[serde(rename = "_id")]
    pub period: PeriodKey,
    pub total_sales: f64,
    /// Percentage change; `null` for the first period or after a zero total.
    pub growth_rate: Option<f64>,
}

/// Repeat customer series at every granularity.
#[derive(Debug, Clone, Serialize)]
pub struct RepeatCustomersReport {
    pub daily: MetricSeries<i64>,
    pub monthly: MetricSeries<i64>,
    pub quarterly: MetricSeries<i64>,
    pub yearly: MetricSeries<i64>,
}
