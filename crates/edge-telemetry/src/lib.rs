//! # Edge Telemetry
//!
//! Logging and metrics for the edge bridge.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use edge_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EDGE_SERVICE_NAME` | `edge-bridge` | Service name in logs |
//! | `IOTEDGE_MODULEID` | (empty) | Module identifier |
//! | `EDGE_LOG_LEVEL` | `info` | Log level filter |
//! | `EDGE_JSON_LOGS` | `true` in the edge runtime | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{register_metrics, MetricsHandle};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard that must be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard { metrics })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}
