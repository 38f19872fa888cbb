//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Edge module identifier (empty for device clients)
    pub module_id: String,

    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "edge-bridge".to_string(),
            module_id: String::new(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `EDGE_SERVICE_NAME`: Service name (default: edge-bridge)
    /// - `IOTEDGE_MODULEID`: Module ID set by the edge runtime (default: empty)
    /// - `EDGE_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `EDGE_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `EDGE_JSON_LOGS`: Enable JSON logs (default: true inside the edge runtime)
    pub fn from_env() -> Self {
        // The edge runtime always injects IOTEDGE_MODULEID into module containers.
        let in_edge_runtime = env::var("IOTEDGE_MODULEID").is_ok();

        Self {
            service_name: env::var("EDGE_SERVICE_NAME")
                .unwrap_or_else(|_| "edge-bridge".to_string()),

            module_id: env::var("IOTEDGE_MODULEID").unwrap_or_default(),

            log_level: env::var("EDGE_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("EDGE_CONSOLE_OUTPUT")
                .map(|v| parse_flag(&v))
                .unwrap_or(true),

            json_logs: env::var("EDGE_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(in_edge_runtime),
        }
    }

    /// Service name qualified with the module ID, when there is one.
    pub fn full_service_name(&self) -> String {
        if self.module_id.is_empty() {
            self.service_name.clone()
        } else {
            format!("{}/{}", self.service_name, self.module_id)
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
