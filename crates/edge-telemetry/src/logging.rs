//! Structured logging setup.
//!
//! Pretty console output for development, JSON lines inside the edge runtime
//! where the log driver ships container stdout.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global tracing subscriber.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match (config.console_output, config.json_logs) {
        (false, _) => registry.try_init(),
        (true, true) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        (true, false) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .try_init(),
    };
    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))?;

    tracing::info!(
        service = %config.full_service_name(),
        json_logs = config.json_logs,
        "Logging initialized"
    );

    Ok(())
}

/// Log a capability-node event with the standard `node_id` field.
///
/// ```rust,ignore
/// log_node_event!(info, node_id, "Direct method called", method = %name);
/// ```
#[macro_export]
macro_rules! log_node_event {
    ($level:ident, $node_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            node_id = %$node_id,
            $($($field)*,)?
            $msg
        )
    };
}
