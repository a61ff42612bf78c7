/// Request logging middleware
///
/// Each request runs inside an `info_span!("request")` carrying its request
/// ID, method and path. A client-supplied `X-Request-Id` is reused when it is
/// short and made of safe characters; otherwise a UUID is generated. The ID
/// and the elapsed time are echoed in `X-Request-Id` and
/// `X-Response-Time-Ms`.

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");
pub const RESPONSE_TIME_HEADER: HeaderName = HeaderName::from_static("x-response-time-ms");

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request ID, stored in request extensions for handlers that want it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

#[derive(Debug, Clone, Copy)]
pub struct RequestLogConfig {
    pub slow_request_threshold: Duration,
}

impl RequestLogConfig {
    pub fn from_millis(threshold_ms: u64) -> Self {
        Self {
            slow_request_threshold: Duration::from_millis(threshold_ms),
        }
    }
}

fn is_valid_request_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_REQUEST_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Use with `axum::middleware::from_fn_with_state`
pub async fn log_requests(
    State(config): State<RequestLogConfig>,
    mut request: Request,
    next: Next,
) -> Response {
    let request_id = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| is_valid_request_id(v))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let span = info_span!("request", request_id = %request_id, method = %method, uri = %path);
    let start = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let elapsed = start.elapsed();
    let elapsed_ms = elapsed.as_millis() as u64;
    let status = response.status().as_u16();

    span.in_scope(|| {
        if elapsed > config.slow_request_threshold {
            warn!(%method, %path, status, elapsed_ms, "Slow request");
        } else {
            info!(%method, %path, status, elapsed_ms, "Request completed");
        }
    });

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
    headers.insert(RESPONSE_TIME_HEADER, HeaderValue::from(elapsed_ms));

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware::from_fn_with_state, routing::get, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(from_fn_with_state(
                RequestLogConfig::from_millis(1000),
                log_requests,
            ))
    }

    #[test]
    fn test_request_id_validation() {
        assert!(is_valid_request_id("abc-123_DEF"));
        assert!(!is_valid_request_id(""));
        assert!(!is_valid_request_id("has space"));
        assert!(!is_valid_request_id("semi;colon"));
        assert!(!is_valid_request_id(&"a".repeat(129)));
        assert!(is_valid_request_id(&"a".repeat(128)));
    }

    #[tokio::test]
    async fn test_propagates_client_request_id() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "client-id-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers().get("x-request-id").unwrap(), "client-id-42");
        assert!(response.headers().get("x-response-time-ms").is_some());
    }

    #[tokio::test]
    async fn test_generates_request_id_for_bad_input() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("x-request-id", "bad id!")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let id = response
            .headers()
            .get("x-request-id")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }
}
