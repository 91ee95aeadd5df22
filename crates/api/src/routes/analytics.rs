//! Storefront analytics routes.
//!
//! Period trends over orders and customers, the customer city distribution
//! and the repeat customer report.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::record_series_points;
use domain::models::{CityCount, RepeatCustomersReport, SalesGrowthPoint, TrendQuery};
use domain::services::AnalyticsService;
use domain::time_series::{Granularity, MetricSeries};

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales-over-time", get(sales_over_time))
        .route("/sales-growth-rate", get(sales_growth_rate))
        .route("/new-customers-over-time", get(new_customers_over_time))
        .route("/geographical-distribution", get(geographical_distribution))
        .route("/customer-lifetime-value", get(customer_lifetime_value))
        .route("/repeat-customers", get(repeat_customers))
}

/// Requested granularity, or the configured default when absent.
fn resolve_granularity(state: &AppState, query: &TrendQuery) -> Result<Granularity, ApiError> {
    match query.granularity.as_deref() {
        Some(name) => Ok(name.parse::<Granularity>()?),
        None => Ok(state.config.analytics.default_granularity),
    }
}

fn service(state: &AppState) -> AnalyticsService {
    AnalyticsService::new(state.source.clone())
}

async fn sales_over_time(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<MetricSeries<f64>>, ApiError> {
    let granularity = resolve_granularity(&state, &query)?;
    let series = service(&state).sales_over_time(granularity, query.fill).await?;

    record_series_points("sales-over-time", granularity.as_str(), series.len());
    Ok(Json(series))
}

async fn sales_growth_rate(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<Vec<SalesGrowthPoint>>, ApiError> {
    let granularity = resolve_granularity(&state, &query)?;
    let growth = service(&state).sales_growth_rate(granularity, query.fill).await?;

    record_series_points("sales-growth-rate", granularity.as_str(), growth.len());
    Ok(Json(growth))
}

async fn new_customers_over_time(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<MetricSeries<i64>>, ApiError> {
    let granularity = resolve_granularity(&state, &query)?;
    let series = service(&state)
        .new_customers_over_time(granularity, query.fill)
        .await?;

    record_series_points("new-customers-over-time", granularity.as_str(), series.len());
    Ok(Json(series))
}

async fn geographical_distribution(
    State(state): State<AppState>,
) -> Result<Json<Vec<CityCount>>, ApiError> {
    let cities = service(&state)
        .geographical_distribution(state.config.analytics.top_cities_limit)
        .await?;

    tracing::debug!(cities = cities.len(), "Computed geographical distribution");
    Ok(Json(cities))
}

async fn customer_lifetime_value(
    State(state): State<AppState>,
    Query(query): Query<TrendQuery>,
) -> Result<Json<MetricSeries<f64>>, ApiError> {
    let granularity = resolve_granularity(&state, &query)?;
    let series = service(&state)
        .customer_lifetime_value(granularity, query.fill)
        .await?;

    record_series_points("customer-lifetime-value", granularity.as_str(), series.len());
    Ok(Json(series))
}

async fn repeat_customers(
    State(state): State<AppState>,
) -> Result<Json<RepeatCustomersReport>, ApiError> {
    let report = service(&state).repeat_customers().await?;

    for (granularity, series) in [
        (Granularity::Daily, &report.daily),
        (Granularity::Monthly, &report.monthly),
        (Granularity::Quarterly, &report.quarterly),
        (Granularity::Yearly, &report.yearly),
    ] {
        record_series_points("repeat-customers", granularity.as_str(), series.len());
    }

    Ok(Json(report))
}
