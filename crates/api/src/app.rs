use axum::{middleware, routing::get, Router};
use domain::services::AnalyticsSource;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{analytics, health};

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AnalyticsSource>,
    pub config: Arc<Config>,
}

pub fn create_app(config: Config, source: Arc<dyn AnalyticsSource>) -> Router {
    let config = Arc::new(config);

    let state = AppState {
        source,
        config: config.clone(),
    };

    // Read-only dashboard API, open to any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1/analytics", analytics::router())
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> ApiError {
    ApiError::NotFound("No such route".to_string())
}
