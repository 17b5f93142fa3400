//! `observability` config section

use serde::Deserialize;

/// Generation latency buckets in seconds. Provider calls take from a few
/// hundred milliseconds (speech) to tens of seconds (two-pass summaries).
pub const DEFAULT_GENERATION_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 45.0, 90.0];

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

/// OTLP span export
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    /// Reported as the `deployment.environment` resource attribute
    pub environment: Option<String>,
    /// Clamped to 0.0..=1.0
    pub sampling_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: "pmp-content-gateway".to_string(),
            environment: None,
            sampling_ratio: 1.0,
        }
    }
}

/// Prometheus scrape endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
    /// Histogram buckets for `content_generation_duration_seconds`
    pub generation_buckets: Vec<f64>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
            generation_buckets: DEFAULT_GENERATION_BUCKETS.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ObservabilityConfig::default();

        assert!(!config.tracing.enabled);
        assert_eq!(config.tracing.service_name, "pmp-content-gateway");
        assert!(config.tracing.environment.is_none());
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.generation_buckets.last(), Some(&90.0));
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: ObservabilityConfig = serde_json::from_value(serde_json::json!({
            "tracing": { "enabled": true, "sampling_ratio": 0.25, "environment": "staging" },
            "metrics": { "path": "/internal/metrics" }
        }))
        .unwrap();

        assert!(config.tracing.enabled);
        assert_eq!(config.tracing.sampling_ratio, 0.25);
        assert_eq!(config.tracing.environment.as_deref(), Some("staging"));
        assert_eq!(config.tracing.otlp_endpoint, "http://localhost:4317");
        assert_eq!(config.metrics.path, "/internal/metrics");
        assert_eq!(config.metrics.generation_buckets, DEFAULT_GENERATION_BUCKETS);
    }
}
