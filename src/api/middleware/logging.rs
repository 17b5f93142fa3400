//! Request/response logging middleware with sensitive data redaction

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{Request, Uri},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};

/// Query parameters that grant access and must not reach the logs
const SENSITIVE_QUERY_PARAMS: &[&str] = &["signature"];

/// Logs each request and its completion.
///
/// Does not open a span of its own; `TraceLayer` already does, and nesting
/// a second one per request duplicates every event.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = redact_uri(request.uri());
    let path = extract_path(&request);
    let request_id = extract_request_id(&request);
    let headers_log = redact_headers(&request);

    info!(
        method = %method,
        path = %path,
        uri = %uri,
        request_id = %request_id,
        headers = %headers_log,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}

fn extract_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}

fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Path and query with signing material replaced
fn redact_uri(uri: &Uri) -> String {
    let Some(query) = uri.query() else {
        return uri.path().to_string();
    };

    let redacted: Vec<String> = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((name, _)) if SENSITIVE_QUERY_PARAMS.contains(&name) => {
                format!("{}=[REDACTED]", name)
            }
            _ => pair.to_string(),
        })
        .collect();

    format!("{}?{}", uri.path(), redacted.join("&"))
}

fn redact_headers(request: &Request<Body>) -> String {
    request
        .headers()
        .iter()
        .filter(|(name, _)| should_log_header(name.as_str()))
        .map(|(name, value)| {
            let value = if is_sensitive_header(name.as_str()) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[invalid]")
            };
            format!("{}={}", name.as_str(), value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "x-api-key" | "cookie" | "set-cookie" | "proxy-authorization"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "authorization"
            | "x-api-key"
    )
}

/// Cuts long raw inputs (article bodies, phrases) down for log fields
pub fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let total = s.chars().count();

    if total <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars).collect();
        format!("{}...[truncated {} chars]", kept, total - max_chars)
    }
}
