//! # Rendezvous Flows
//!
//! The initializer publishes the client and twin while capabilities are
//! already polling the slots. Nothing signals the capabilities directly.

use super::fixtures::{next_output, until, wait_status, Edge};
use ie_03_edge_client::{ClientInitializer, LoopbackProvider, ResolverSettings};
use shared_bus::HostEvent;
use serde_json::json;
use shared_types::{CapabilityKind, ClientKind, HostInput, NodeMessage, NodeStatus};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn output() -> CapabilityKind {
    CapabilityKind::Output {
        output: "output1".into(),
    }
}

fn late_provider(edge: &Edge, delay: Duration) -> LoopbackProvider {
    LoopbackProvider::with_connectivity(ClientKind::Module, Arc::clone(&edge.connectivity))
        .with_create_delay(delay)
}

#[tokio::test(start_paused = true)]
async fn test_capability_resolves_client_published_late() {
    let edge = Edge::empty(ResolverSettings {
        client_attempts: 5,
        ..ResolverSettings::default()
    });
    let (handle, mut events) = edge.spawn("out", output());
    wait_status(&mut events, NodeStatus::Disconnected).await;
    let started = Instant::now();

    let initializer = ClientInitializer::new(
        Arc::new(late_provider(&edge, Duration::from_millis(2500))),
        Arc::clone(&edge.context),
    );
    let init = tokio::spawn(async move { initializer.initialize().await });

    wait_status(&mut events, NodeStatus::Connected).await;
    // Probes run at 0s, 1s and 3s; the third sees the client.
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "resolved too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3100), "resolved too late: {elapsed:?}");

    let session = init.await.unwrap().unwrap();
    handle.close().await;
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_client_published_after_budget_is_missed() {
    let edge = Edge::empty(ResolverSettings {
        client_attempts: 3,
        ..ResolverSettings::default()
    });
    let (handle, mut events) = edge.spawn("out", output());
    wait_status(&mut events, NodeStatus::Disconnected).await;

    let session = ClientInitializer::new(
        Arc::new(late_provider(&edge, Duration::from_secs(5))),
        Arc::clone(&edge.context),
    )
    .initialize()
    .await
    .unwrap();
    assert!(edge.context.client_slot().is_published());

    // The capability gave up at 3s and now rejects every host input.
    handle.send(HostInput::new("{}")).await.unwrap();
    loop {
        match super::fixtures::next_event(&mut events).await {
            HostEvent::InputRejected { reason, .. } => {
                assert_eq!(reason, "edge client unavailable");
                break;
            }
            HostEvent::StatusChanged { status, .. } => {
                assert_ne!(status, NodeStatus::Connected)
            }
            _ => {}
        }
    }
    assert!(edge.connectivity.sent_messages().is_empty());

    handle.close().await;
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_close_cancels_pending_resolve() {
    let edge = Edge::empty(ResolverSettings::default());
    let (handle, mut events) = edge.spawn("out", output());
    wait_status(&mut events, NodeStatus::Disconnected).await;
    let started = Instant::now();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.close().await;

    // The 20-attempt budget would run for minutes; close ends it at once.
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_root_shutdown_stops_every_capability() {
    let edge = Edge::empty(ResolverSettings::default());
    let (first, mut first_events) = edge.spawn("out", output());
    let (second, mut second_events) = edge.spawn(
        "in",
        CapabilityKind::Input {
            input: "input1".into(),
        },
    );
    wait_status(&mut first_events, NodeStatus::Disconnected).await;
    wait_status(&mut second_events, NodeStatus::Disconnected).await;

    edge.context.shutdown();
    until(|| first.is_finished() && second.is_finished()).await;
}

#[tokio::test(start_paused = true)]
async fn test_redeploy_republishes_client() {
    let edge = Edge::connected(ResolverSettings::default()).await;
    let first_generation = edge.context.client_slot().generation();
    let session = edge.session.as_ref().unwrap();
    session.close().await;
    assert!(!edge.context.client_slot().is_published());

    let provider = LoopbackProvider::new(ClientKind::Module);
    let session = ClientInitializer::new(Arc::new(provider), Arc::clone(&edge.context))
        .initialize()
        .await
        .unwrap();
    assert!(edge.context.client_slot().generation() > first_generation);

    let (handle, mut events) = edge.spawn("out", output());
    wait_status(&mut events, NodeStatus::Connected).await;

    handle.close().await;
    session.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_redeploy_same_provider_delivers_desired_patches() {
    let mut edge = Edge::connected(ResolverSettings::default()).await;
    let twin = Arc::clone(edge.connectivity.twin());
    let twin_kind = || CapabilityKind::Twin {
        name: "Module Twin".into(),
    };

    let (handle, mut events) = edge.spawn("twin", twin_kind());
    wait_status(&mut events, NodeStatus::Connected).await;
    until(|| twin.listener_count() > 0).await;
    handle.close().await;
    edge.session.take().unwrap().close().await;
    assert_eq!(twin.listener_count(), 0);

    // Same provider, same shared client and twin.
    let provider =
        LoopbackProvider::with_connectivity(ClientKind::Module, Arc::clone(&edge.connectivity));
    let session = ClientInitializer::new(Arc::new(provider), Arc::clone(&edge.context))
        .initialize()
        .await
        .unwrap();

    let (handle, mut events) = edge.spawn("twin", twin_kind());
    wait_status(&mut events, NodeStatus::Connected).await;
    until(|| twin.listener_count() > 0).await;

    assert_eq!(twin.push_desired(json!({"interval": 30})), 1);
    let message = next_output(&mut events).await;
    assert_eq!(message, NodeMessage::desired(json!({"interval": 30})));

    handle.close().await;
    session.close().await;
}
