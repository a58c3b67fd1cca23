//! Process bootstrap: configuration to listening server.
//!
//! Startup runs strictly in order and stops at the first failure:
//!
//! 1. validate the configuration and build the credential validator
//! 2. register every interface onto a fresh mux
//! 3. wrap the combined handler with the auth gate
//! 4. bind `host:port` and serve until a shutdown signal arrives
//!
//! A registration failure is returned before anything is bound.

use std::future::Future;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use super::routes::create_router;
use crate::auth::TokenValidator;
use crate::config::Config;
use crate::error::GatewayError;
use crate::gateway::{GatewayMux, InterfaceRegistry};

/// Build the complete gateway router without binding anything.
pub fn build_gateway(
    config: &Config,
    registry: &InterfaceRegistry,
) -> Result<Router, GatewayError> {
    config.validate()?;

    let validator = TokenValidator::from_secret(&config.jwt_secret)?;

    let mut mux = GatewayMux::new();
    registry.register_all(&mut mux, &config.cuebot_endpoint, &config.dial_options())?;

    Ok(create_router(mux, validator, &config.router_config()))
}

/// Run the gateway with the OpenCue interfaces until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<(), GatewayError> {
    run_with(config, &InterfaceRegistry::opencue(), shutdown_signal()).await
}

/// Run the gateway with a custom registry and shutdown trigger.
pub async fn run_with<F>(
    config: Config,
    registry: &InterfaceRegistry,
    shutdown: F,
) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = build_gateway(&config, registry)?;

    info!("Configuration:");
    info!("  Cuebot endpoint: {}", config.cuebot_endpoint);
    info!("  Interfaces: {}", registry.len());
    info!(
        "  Bearer scheme: {}",
        if config.require_bearer { "required" } else { "optional" }
    );
    match config.cors_origins {
        Some(ref origins) if !origins.is_empty() => info!("  CORS origins: {}", origins.join(", ")),
        _ => info!("  CORS: disabled"),
    }

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| GatewayError::Bind {
            address: address.clone(),
            source,
        })?;

    serve(listener, router, shutdown).await
}

/// Serve `router` on an already-bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    router: Router,
    shutdown: F,
) -> Result<(), GatewayError>
where
    F: Future<Output = ()> + Send + 'static,
{
    match listener.local_addr() {
        Ok(addr) => info!("Gateway listening on: http://{}", addr),
        Err(e) => error!("Gateway listening on unknown address: {}", e),
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(GatewayError::Serve)?;

    info!("Gateway stopped");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
///
/// If a handler cannot be installed, that signal is never awaited and the
/// failure is logged.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
