//! Tracing subscriber setup with optional OpenTelemetry export

use opentelemetry::{trace::TracerProvider as _, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use super::config::TracingConfig;
use crate::infrastructure::logging::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing with optional OpenTelemetry export.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(logging_config: &LoggingConfig, tracing_config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging_config.level));

    let mut layers: Vec<BoxedLayer> = vec![fmt_layer(&logging_config.format)];
    let mut otel_error = None;

    if tracing_config.enabled {
        match init_otel_tracing(tracing_config) {
            Ok(provider) => {
                let tracer = provider.tracer(tracing_config.service_name.clone());
                opentelemetry::global::set_tracer_provider(provider);
                layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
            }
            Err(e) => otel_error = Some(e),
        }
    }

    let initialized = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();

    if initialized.is_err() {
        // A subscriber is already installed (tests, embedding)
        return;
    }

    match otel_error {
        Some(e) => tracing::warn!("Failed to initialize OpenTelemetry: {}. Tracing export disabled.", e),
        None if tracing_config.enabled => tracing::info!(
            "Tracing initialized with OpenTelemetry export to {}",
            tracing_config.otlp_endpoint
        ),
        None => tracing::info!(level = %logging_config.level, "Tracing initialized (OpenTelemetry disabled)"),
    }
}

fn fmt_layer(format: &LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    }
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

fn init_otel_tracing(
    config: &TracingConfig,
) -> Result<TracerProvider, opentelemetry::trace::TraceError> {
    let mut attributes = vec![KeyValue::new("service.name", config.service_name.clone())];
    if let Some(environment) = &config.environment {
        attributes.push(KeyValue::new("deployment.environment", environment.clone()));
    }
    let resource = Resource::new(attributes);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let provider = TracerProvider::builder()
        .with_sampler(sampler(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .with_batch_exporter(exporter, runtime::Tokio)
        .build();

    Ok(provider)
}

/// Shutdown tracing and flush pending spans
pub fn shutdown_tracing() {
    opentelemetry::global::shutdown_tracer_provider();
    tracing::info!("Tracing shutdown complete");
}
