//! # Runtime Flows
//!
//! The full runtime: capabilities from configuration, host inputs routed by
//! node id, host events on the shared bus.

use super::fixtures::{next_event, until, EVENT_TIMEOUT};
use edge_runtime::EdgeRuntime;
use ie_03_edge_client::{EdgeConfig, LoopbackProvider};
use serde_json::json;
use shared_bus::{EventFilter, EventTopic, HostEvent, InMemoryEventBus};
use shared_types::{CapabilityConfig, CapabilityKind, ClientKind, HostInput, MessageTopic};
use std::sync::Arc;
use tokio::time::timeout;

fn config() -> EdgeConfig {
    EdgeConfig {
        capabilities: vec![
            CapabilityConfig::new(
                "twin",
                CapabilityKind::Twin {
                    name: "Module Twin".into(),
                },
            ),
            CapabilityConfig::new(
                "reboot",
                CapabilityKind::Method {
                    method: "reboot".into(),
                },
            ),
        ],
        ..EdgeConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_runtime_lifecycle_events() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut lifecycle = bus.subscribe(EventFilter::topics(vec![EventTopic::Lifecycle]));
    let mut runtime = EdgeRuntime::new(config(), Arc::clone(&bus));

    runtime
        .start(Arc::new(LoopbackProvider::new(ClientKind::Module)))
        .await
        .unwrap();
    runtime.stop().await;

    let mut states = Vec::new();
    while let Ok(Some(HostEvent::ClientLifecycle { state })) = lifecycle.try_recv() {
        states.push(state);
    }
    assert_eq!(states, vec!["connecting", "fetching_state", "ready", "closed"]);
}

#[tokio::test(start_paused = true)]
async fn test_method_round_trip_through_runtime() {
    let bus = Arc::new(InMemoryEventBus::new());
    let mut outputs = bus.subscribe(EventFilter::node("reboot").with_topics(vec![EventTopic::Output]));
    let provider = Arc::new(LoopbackProvider::new(ClientKind::Module));
    let connectivity = Arc::clone(provider.connectivity());
    let mut runtime = EdgeRuntime::new(config(), Arc::clone(&bus));
    runtime.start(provider).await.unwrap();
    until(|| connectivity.has_method_handler("reboot")).await;

    let response = connectivity
        .invoke_method("reboot", Some(json!({"delay": 0})))
        .await
        .unwrap();

    let HostEvent::NodeOutput { message, .. } = next_event(&mut outputs).await else {
        panic!("expected node output");
    };
    assert_eq!(message.topic, MessageTopic::Method);
    let correlation_id = message.correlation_id.unwrap();

    runtime
        .deliver(
            "reboot",
            HostInput::new(json!({"rebooting": true}))
                .with_status(200)
                .with_correlation_id(correlation_id),
        )
        .await
        .unwrap();

    let response = timeout(EVENT_TIMEOUT, response).await.unwrap().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"rebooting":true}"#);

    runtime.stop().await;
    assert!(!connectivity.has_method_handler("reboot"));
}

#[tokio::test(start_paused = true)]
async fn test_twin_report_through_runtime() {
    let bus = Arc::new(InMemoryEventBus::new());
    let provider = Arc::new(LoopbackProvider::new(ClientKind::Module));
    let twin = Arc::clone(provider.connectivity().twin());
    let mut runtime = EdgeRuntime::new(config(), Arc::clone(&bus));
    runtime.start(provider).await.unwrap();
    until(|| twin.listener_count() > 0).await;

    runtime
        .deliver("twin", HostInput::new(r#"{"firmware": "1.2.0"}"#))
        .await
        .unwrap();
    until(|| twin.reported().get("firmware").is_some()).await;
    assert_eq!(twin.reported()["firmware"], json!("1.2.0"));

    runtime.stop().await;
    assert_eq!(twin.listener_count(), 0);
}
