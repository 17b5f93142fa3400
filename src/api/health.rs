//! Health check endpoints for Kubernetes probes

use std::future::Future;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;
use crate::domain::DomainError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// One cache store probe
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub backend: &'static str,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Returns 200 while the process is up
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Probes every namespace's cache store.
///
/// A failing store degrades the service but does not take it out of
/// rotation: lookups fall through to generation.
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();

    let checks = vec![
        probe(state.speech.namespace(), state.speech.backend(), state.speech.probe()).await,
        probe(state.articles.namespace(), state.articles.backend(), state.articles.probe()).await,
        probe(
            state.vocabulary.namespace(),
            state.vocabulary.backend(),
            state.vocabulary.probe(),
        )
        .await,
        probe(state.images.namespace(), state.images.backend(), state.images.probe()).await,
    ];

    let status = if checks.iter().all(|c| c.status == HealthStatus::Healthy) {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    (StatusCode::OK, Json(response))
}

/// Liveness probe
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn probe(
    name: &str,
    backend: &'static str,
    check: impl Future<Output = Result<(), DomainError>>,
) -> HealthCheck {
    let start = Instant::now();
    let result = check.await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthCheck {
            name: name.to_string(),
            backend,
            status: HealthStatus::Healthy,
            message: None,
            latency_ms,
        },
        Err(e) => HealthCheck {
            name: name.to_string(),
            backend,
            status: HealthStatus::Unhealthy,
            message: Some(e.to_string()),
            latency_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
    }

    #[tokio::test]
    async fn test_probe_reports_store_error() {
        let check = probe("speech", "redis", async {
            Err(DomainError::cache("connection refused"))
        })
        .await;

        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.backend, "redis");
        assert!(check.message.unwrap().contains("connection refused"));
    }

    #[test]
    fn test_health_response_omits_empty_checks() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "0.1.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }
}
