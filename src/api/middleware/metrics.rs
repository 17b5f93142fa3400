//! HTTP metrics middleware

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::infrastructure::observability::record_http_request;

/// Label for requests that matched no route
const UNMATCHED_ROUTE: &str = "unmatched";

/// Records count, latency and 5xx rate per route template
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let route = route_label(&request);

    let response = next.run(request).await;

    record_http_request(
        method.as_str(),
        &route,
        response.status().as_u16(),
        start.elapsed(),
    );

    response
}

/// Route template, so `/objects/{*path}` is one series however many objects exist
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ROUTE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_route_label() {
        let request = Request::builder()
            .uri("/objects/speech/0123456789abcdef.mp3")
            .body(Body::empty())
            .unwrap();

        assert_eq!(route_label(&request), UNMATCHED_ROUTE);
    }
}
