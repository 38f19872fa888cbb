//! Prometheus metrics for the edge bridge.
//!
//! All metrics follow the naming convention: `edge_<area>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // RENDEZVOUS
    // =========================================================================

    /// Probe attempts spent resolving shared resources
    pub static ref RESOLVE_ATTEMPTS: CounterVec = CounterVec::new(
        Opts::new("edge_resolve_attempts_total", "Probe attempts spent resolving shared resources"),
        &["resource"]  // resource: client/twin/method_response
    ).expect("metric creation failed");

    /// Resolutions that exhausted their attempt budget or were cancelled
    pub static ref RESOLVE_FAILURES: CounterVec = CounterVec::new(
        Opts::new("edge_resolve_failures_total", "Resolutions that did not produce a value"),
        &["resource", "reason"]  // reason: exhausted/cancelled
    ).expect("metric creation failed");

    // =========================================================================
    // METHOD CORRELATION
    // =========================================================================

    /// Method responses waiting in the correlation queue
    pub static ref PENDING_RESPONSES: Gauge = Gauge::new(
        "edge_method_pending_responses",
        "Method responses waiting in the correlation queue"
    ).expect("metric creation failed");

    /// Invocations that never received a response
    pub static ref CORRELATION_MISSES: Counter = Counter::new(
        "edge_method_correlation_misses_total",
        "Method invocations that received no response within budget"
    ).expect("metric creation failed");

    /// Method responses sent back to the caller
    pub static ref METHOD_RESPONSES_SENT: CounterVec = CounterVec::new(
        Opts::new("edge_method_responses_sent_total", "Method responses sent"),
        &["method", "status"]
    ).expect("metric creation failed");

    // =========================================================================
    // MESSAGING
    // =========================================================================

    /// Messages sent to module outputs
    pub static ref MESSAGES_SENT: CounterVec = CounterVec::new(
        Opts::new("edge_messages_sent_total", "Messages sent to module outputs"),
        &["output", "outcome"]  // outcome: ok/error
    ).expect("metric creation failed");

    /// Messages forwarded from module inputs
    pub static ref MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("edge_messages_received_total", "Messages forwarded from module inputs"),
        &["input"]
    ).expect("metric creation failed");

    /// Host inputs rejected as malformed
    pub static ref INPUT_REJECTIONS: CounterVec = CounterVec::new(
        Opts::new("edge_input_rejections_total", "Host inputs rejected by capabilities"),
        &["capability"]
    ).expect("metric creation failed");
}

/// Handle over the global registry.
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Encode all metrics as Prometheus text format.
    pub fn gather(&self) -> Result<String, TelemetryError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
    }
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; already-registered collectors are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(RESOLVE_ATTEMPTS.clone()),
        Box::new(RESOLVE_FAILURES.clone()),
        Box::new(PENDING_RESPONSES.clone()),
        Box::new(CORRELATION_MISSES.clone()),
        Box::new(METHOD_RESPONSES_SENT.clone()),
        Box::new(MESSAGES_SENT.clone()),
        Box::new(MESSAGES_RECEIVED.clone()),
        Box::new(INPUT_REJECTIONS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}
