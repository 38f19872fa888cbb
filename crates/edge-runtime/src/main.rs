//! # Edge Bridge Runtime
//!
//! Connects the configured capabilities (twin, input, output, method) to one
//! shared edge client.
//!
//! ```text
//!  env ──▶ EdgeConfig ──▶ EdgeRuntime ──spawn──▶ capabilities
//!                              │                     │ resolve slots
//!                              ▼                     ▼
//!                     ClientInitializer ──publish──▶ EdgeContext
//! ```
//!
//! No cloud transport SDK is linked: the runtime connects through the
//! loopback provider, and host bus traffic is written to the log.

use std::sync::Arc;

use anyhow::{Context, Result};
use edge_runtime::{spawn_event_log, EdgeRuntime};
use edge_telemetry::{init_telemetry, TelemetryConfig};
use ie_03_edge_client::{EdgeConfig, LoopbackProvider};
use shared_bus::InMemoryEventBus;
use shared_types::ClientKind;
use tracing::{error, info, warn};

/// Load and validate the edge configuration, loading device credentials
/// up front so a bad certificate path fails at startup.
fn load_config() -> Result<EdgeConfig> {
    let config = EdgeConfig::from_env().context("Failed to load edge configuration")?;
    config.validate().context("Invalid edge configuration")?;

    match (&config.client_kind, &config.device) {
        (ClientKind::Device, Some(device)) => {
            let credentials = device
                .load_credentials()
                .context("Failed to load x509 credentials")?;
            info!(
                connection_string = %device.identity.connection_string(),
                credentials = ?credentials,
                "Using device client"
            );
        }
        _ => info!(
            module_id = config.module_id.as_deref().unwrap_or("<unset>"),
            "Using module client"
        ),
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = load_config()?;

    info!("===========================================");
    info!("  Edge Bridge Runtime v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let bus = Arc::new(InMemoryEventBus::new());
    let event_log = spawn_event_log(&bus);

    let provider = Arc::new(LoopbackProvider::new(config.client_kind));
    let mut runtime = EdgeRuntime::new(config, Arc::clone(&bus));
    if let Err(e) = runtime.start(provider).await {
        error!(error = %e, "Edge client unavailable, capabilities will stay disconnected");
    }

    info!("Edge bridge is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.stop().await;
    event_log.abort();

    for (node_id, status) in bus.status_snapshot() {
        info!(node_id = %node_id, status = status.text(), "Final node status");
    }

    match telemetry.metrics().gather() {
        Ok(metrics) => info!(metrics = %metrics, "Final metrics"),
        Err(e) => warn!(error = %e, "Failed to gather metrics"),
    }

    Ok(())
}
