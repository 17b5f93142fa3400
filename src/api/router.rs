use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::objects;
use super::state::AppState;
use super::v1;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};
use crate::infrastructure::storage::OBJECTS_ROUTE_PREFIX;

/// Health probes, content endpoints and signed object downloads
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .nest("/v1", v1::create_v1_router())
        .route(
            &format!("{}/{{*path}}", OBJECTS_ROUTE_PREFIX),
            get(objects::get_object),
        )
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}

/// [`create_router`] plus the Prometheus scrape endpoint when enabled
pub fn create_router_with_metrics(state: AppState, metrics: Option<PrometheusMetrics>) -> Router {
    let router = create_router(state);

    match metrics {
        Some(m) => router.merge(create_metrics_router(m)),
        None => router,
    }
}
