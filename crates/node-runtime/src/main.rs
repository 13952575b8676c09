//! # Dataspace Connector
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (TOML file, then `DC_*` environment overrides)
//! 2. Initialise logging and metrics
//! 3. Open storage and wire subsystems (dc-02 .. dc-04)
//! 4. Serve the HTTP gateway (dc-05) until Ctrl+C

use anyhow::{Context, Result};
use std::time::Duration;
use dc_05_api_gateway::ApiGatewayService;
use node_runtime::{config_path, load_config, telemetry_config, ConnectorContainer};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path(std::env::args().skip(1), std::env::var("DC_CONFIG").ok());
    let config = load_config(path.clone())?;

    connector_telemetry::init_telemetry(&telemetry_config(&config))
        .context("Failed to initialise telemetry")?;

    info!("===========================================");
    info!("  Dataspace Connector v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");
    match &path {
        Some(path) => info!("Configuration: {:?}", path),
        None => info!("Configuration: defaults and environment"),
    }
    if config.connector.private_token.is_none() {
        warn!("No private API token configured; /private routes are open");
    }

    let container = ConnectorContainer::new(config.clone())?;
    let gateway = ApiGatewayService::new(config.gateway_config(), container.app_state())
        .context("Failed to create API gateway")?;

    let housekeeping = container.spawn_lock_housekeeping(Duration::from_secs(60));

    info!("Self endpoint: {}", config.connector.self_endpoint);
    info!("HTTP: {}", config.gateway_config().http_addr());

    gateway
        .serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await
        .context("HTTP gateway failed")?;

    housekeeping.abort();
    let pending = container.exchanges.dispatcher().pending_retries();
    if pending > 0 {
        warn!("{} peer sync retries abandoned at shutdown", pending);
    }
    info!("Shutdown complete");
    Ok(())
}
