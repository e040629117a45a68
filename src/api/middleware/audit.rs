//! Audit logging middleware.
//!
//! Tags every request with a UUID, echoes it as `X-Request-Id` and logs
//! method, path, status and latency once the handler returns.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4();
    let method = req.method().to_string();
    // Paths may carry an access token; log only the route prefix for those.
    let path = redact_path(req.uri().path());
    let started = Instant::now();

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    let latency_ms = started.elapsed().as_millis() as u64;
    if status >= 500 {
        tracing::warn!(%request_id, %method, %path, status, latency_ms, "API request failed");
    } else {
        tracing::info!(%request_id, %method, %path, status, latency_ms, "API request");
    }

    if let Ok(val) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    response
}

fn redact_path(path: &str) -> String {
    match path.strip_prefix("/api/encounters/") {
        Some(rest) if !rest.is_empty() => "/api/encounters/:identifier".to_string(),
        _ => path.to_string(),
    }
}
