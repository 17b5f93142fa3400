//! Observability infrastructure - Tracing, Metrics, and Logging

mod config;
pub mod metrics;
mod tracing_setup;

pub use self::config::{MetricsConfig, ObservabilityConfig, TracingConfig};
pub use self::metrics::{create_metrics_router, init_metrics, record_http_request, PrometheusMetrics};
pub use tracing_setup::{init_tracing, shutdown_tracing};
