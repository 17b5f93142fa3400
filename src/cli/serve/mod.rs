//! Serve command - runs the HTTP API

use std::net::SocketAddr;

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router_with_metrics;
use crate::config::AppConfig;
use crate::infrastructure::observability::{init_metrics, init_tracing, shutdown_tracing};

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Override `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Override `server.port`
    #[arg(long, short)]
    pub port: Option<u16>,
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    apply_overrides(&mut config, &args);

    init_tracing(&config.logging, &config.observability.tracing);
    if let Some(e) = load_error {
        warn!("Failed to load configuration, using defaults: {}", e);
    }

    let state = crate::create_app_state_with_config(&config).await?;
    let metrics = init_metrics(&config.observability.metrics);
    let app = create_router_with_metrics(state, metrics);

    let addr = build_socket_addr(&config)?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_tracing();
    info!("API server shutdown complete");

    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let mut config = AppConfig::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9001),
        };

        apply_overrides(&mut config, &args);

        let addr = build_socket_addr(&config).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:9001");
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let mut config = AppConfig::default();
        config.server.host = "not-an-ip".to_string();

        assert!(build_socket_addr(&config).is_err());
    }
}
