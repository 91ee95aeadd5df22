//! Request tracing middleware.
//!
//! Every request runs inside a span carrying its request id, so log lines
//! emitted while computing a series can be correlated.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for request ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest client-supplied request id that is reused as is.
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuses a sane client `X-Request-ID`, otherwise generates a UUID v4.
fn resolve_request_id(header: Option<&HeaderValue>) -> String {
    header
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware that extracts or generates a request ID, runs the request in
/// a span tagged with it and echoes it in the response headers.
pub async fn trace_id(req: Request<Body>, next: Next) -> Response {
    let request_id = resolve_request_id(req.headers().get(REQUEST_ID_HEADER));

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    let start = std::time::Instant::now();
    let mut response = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = response.status().as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );
    });

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-request-id"), header_value);
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_keeps_client_id() {
        let header = HeaderValue::from_static("req-123_abc.xyz");
        assert_eq!(resolve_request_id(Some(&header)), "req-123_abc.xyz");
    }

    #[test]
    fn test_resolve_generates_uuid() {
        let generated = resolve_request_id(None);
        assert!(Uuid::parse_str(&generated).is_ok());

        let empty = HeaderValue::from_static("");
        assert!(Uuid::parse_str(&resolve_request_id(Some(&empty))).is_ok());
    }

    #[test]
    fn test_resolve_rejects_oversized_id() {
        let long = "a".repeat(MAX_REQUEST_ID_LEN + 1);
        let header = HeaderValue::from_str(&long).unwrap();
        assert_ne!(resolve_request_id(Some(&header)), long);
    }
}
