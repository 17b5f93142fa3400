//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

use super::config::MetricsConfig;
use crate::domain::cache::GenerationStatus;

const GENERATION_DURATION: &str = "content_generation_duration_seconds";

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
    path: String,
}

impl PrometheusMetrics {
    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    let builder = match PrometheusBuilder::new().set_buckets_for_metric(
        Matcher::Full(GENERATION_DURATION.to_string()),
        &config.generation_buckets,
    ) {
        Ok(builder) => builder,
        Err(e) => {
            tracing::warn!("Ignoring generation histogram buckets: {}", e);
            PrometheusBuilder::new()
        }
    };

    match builder.install_recorder() {
        Ok(handle) => {
            gauge!("content_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
                path: config.path.clone(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    let path = metrics.path.clone();

    Router::new()
        .route(&path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Lookup outcome: `hit`, `miss`, `expired`, `undecodable` or `error`
pub fn record_cache_lookup(namespace: &str, outcome: &'static str) {
    counter!(
        "content_cache_lookups_total",
        "namespace" => namespace.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// A failed store read or write; `operation` is `get`, `upsert` or `get_recent`
pub fn record_store_error(namespace: &str, backend: &'static str, operation: &'static str) {
    counter!(
        "content_cache_store_errors_total",
        "namespace" => namespace.to_string(),
        "backend" => backend,
        "operation" => operation
    )
    .increment(1);
}

/// A completed generation attempt, successful or fallen back
pub fn record_generation(namespace: &str, status: GenerationStatus, duration: Duration) {
    let labels = [
        ("namespace", namespace.to_string()),
        ("status", status.as_str().to_string()),
    ];

    counter!("content_generations_total", &labels).increment(1);
    histogram!(GENERATION_DURATION, &labels).record(duration.as_secs_f64());
}

/// A generator failure by error class
pub fn record_provider_failure(namespace: &str, error_kind: &'static str) {
    counter!(
        "provider_requests_total",
        "namespace" => namespace.to_string(),
        "result" => "error",
        "error_kind" => error_kind
    )
    .increment(1);
}

pub fn record_provider_success(namespace: &str) {
    counter!(
        "provider_requests_total",
        "namespace" => namespace.to_string(),
        "result" => "success",
        "error_kind" => "none"
    )
    .increment(1);
}

static HEX_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/[0-9a-f]{16,64}(\.[a-z0-9]+)?(/|$)").expect("valid regex"));
static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").expect("valid regex"));

/// Sanitize URL path for metric labels (remove keys and IDs, limit cardinality)
fn sanitize_path(path: &str) -> String {
    let path = HEX_KEY.replace_all(path, "/{key}$2");
    let path = NUMERIC_ID.replace_all(&path, "/{id}$1");

    path.chars().take(50).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_cache_key() {
        assert_eq!(
            sanitize_path("/objects/speech/0123456789abcdef.mp3"),
            "/objects/speech/{key}"
        );
    }

    #[test]
    fn test_sanitize_path_numeric_id() {
        assert_eq!(sanitize_path("/api/users/123/orders"), "/api/users/{id}/orders");
    }

    #[test]
    fn test_sanitize_path_no_id() {
        assert_eq!(sanitize_path("/v1/speech"), "/v1/speech");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert!(sanitize_path(path).len() <= 50);
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_cache_lookup("speech", "hit");
        record_store_error("speech", "redis", "get");
        record_generation("speech", GenerationStatus::AiGenerated, Duration::from_millis(5));
        record_provider_failure("speech", "timeout");
        record_provider_success("speech");
    }
}
