use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::services::DataSourceError;
use domain::time_series::TimeSeriesError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::warn!("Service unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service_unavailable",
                    "Analytics data is temporarily unavailable".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<TimeSeriesError> for ApiError {
    fn from(err: TimeSeriesError) -> Self {
        match err {
            TimeSeriesError::InvalidGranularity(_) => ApiError::Validation(err.to_string()),
            TimeSeriesError::MalformedObservationKey { .. }
            | TimeSeriesError::UnrecognizedKeyShape(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<DataSourceError> for ApiError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            DataSourceError::Query(msg) => ApiError::Internal(format!("Query failed: {}", msg)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use domain::time_series::{Granularity, RawPeriodKey};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_not_found() {
        let response = ApiError::NotFound("missing".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_api_error_validation_body() {
        let response = ApiError::Validation("bad granularity".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["message"], "bad granularity");
    }

    #[tokio::test]
    async fn test_api_error_internal_hides_details() {
        let response = ApiError::Internal("relation \"orders\" does not exist".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[test]
    fn test_api_error_service_unavailable() {
        let response = ApiError::ServiceUnavailable("pool timed out".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::Validation("test".to_string())),
            "Validation error: test"
        );
        assert_eq!(
            format!("{}", ApiError::Internal("test".to_string())),
            "Internal error: test"
        );
    }

    #[test]
    fn test_from_invalid_granularity() {
        let error: ApiError = TimeSeriesError::InvalidGranularity("weekly".to_string()).into();
        match error {
            ApiError::Validation(msg) => assert!(msg.contains("weekly")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[test]
    fn test_from_malformed_key() {
        let error: ApiError = TimeSeriesError::MalformedObservationKey {
            granularity: Granularity::Monthly,
            key: RawPeriodKey::year(2024),
        }
        .into();
        assert!(matches!(error, ApiError::Internal(_)));
    }

    #[test]
    fn test_from_data_source_error() {
        let unavailable: ApiError = DataSourceError::Unavailable("down".to_string()).into();
        assert!(matches!(unavailable, ApiError::ServiceUnavailable(_)));

        let query: ApiError = DataSourceError::Query("syntax".to_string()).into();
        assert!(matches!(query, ApiError::Internal(_)));
    }
}
