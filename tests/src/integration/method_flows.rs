//! # Method Flows
//!
//! A direct method is emitted to the host flow, and the response arrives
//! later as a host input. The method capability waits for it through the
//! correlation queue on the method-response schedule.

use super::fixtures::{method, next_output, until, wait_status, Edge, EVENT_TIMEOUT};
use ie_03_edge_client::ResolverSettings;
use serde_json::json;
use shared_types::{HostInput, MessageTopic, NodeStatus};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::{timeout, Instant};

#[tokio::test(start_paused = true)]
async fn test_unanswered_method_times_out_without_response() {
    let edge = Edge::connected(ResolverSettings::default()).await;
    let (handle, mut events) = edge.spawn("m", method("reboot"));
    wait_status(&mut events, NodeStatus::Connected).await;
    until(|| edge.connectivity.has_method_handler("reboot")).await;
    let started = Instant::now();

    let response = edge
        .connectivity
        .invoke_method("reboot", None)
        .await
        .unwrap();

    let message = next_output(&mut events).await;
    assert_eq!(message.topic, MessageTopic::Method);
    assert_eq!(message.method.as_deref(), Some("reboot"));
    assert_eq!(message.payload, serde_json::Value::Null);
    assert!(message.correlation_id.is_some());

    // The responder is dropped once all 20 attempts miss.
    let outcome = timeout(EVENT_TIMEOUT, response).await.unwrap();
    assert!(outcome.is_err());
    // Cyclic 1s schedule: 1+..+10 then 1+..+9 seconds between 20 probes.
    assert!(started.elapsed() >= Duration::from_secs(100));
    wait_status(&mut events, NodeStatus::Connected).await;

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_response_supplied_later_is_sent_back() {
    let edge = Edge::connected(ResolverSettings::default()).await;
    let (handle, mut events) = edge.spawn("m", method("reboot"));
    wait_status(&mut events, NodeStatus::Connected).await;
    until(|| edge.connectivity.has_method_handler("reboot")).await;

    let response = edge
        .connectivity
        .invoke_method("reboot", None)
        .await
        .unwrap();
    next_output(&mut events).await;
    let invoked = Instant::now();

    tokio::time::sleep(Duration::from_secs(2)).await;
    handle
        .send(HostInput::new("{}").with_status(200))
        .await
        .unwrap();

    let response = timeout(EVENT_TIMEOUT, response).await.unwrap().unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "{}");
    // Probes at 0s, 1s and 3s: the third one finds the response.
    let elapsed = invoked.elapsed();
    assert!(elapsed >= Duration::from_secs(3), "answered too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(3100), "answered too late: {elapsed:?}");
    assert!(edge.context.responses().is_empty());

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_invocations_answered_by_correlation_id() {
    let edge = Edge::connected(ResolverSettings::default()).await;
    let (handle, mut events) = edge.spawn("m", method("reboot"));
    wait_status(&mut events, NodeStatus::Connected).await;
    until(|| edge.connectivity.has_method_handler("reboot")).await;

    let first = edge
        .connectivity
        .invoke_method("reboot", Some(json!({"n": 1})))
        .await
        .unwrap();
    let first_id = next_output(&mut events).await.correlation_id.unwrap();
    let second = edge
        .connectivity
        .invoke_method("reboot", Some(json!({"n": 2})))
        .await
        .unwrap();
    let second_id = next_output(&mut events).await.correlation_id.unwrap();
    assert_ne!(first_id, second_id);

    // Answer in reverse order.
    handle
        .send(
            HostInput::new(json!({"answer": 2}))
                .with_status(202)
                .with_correlation_id(second_id),
        )
        .await
        .unwrap();
    handle
        .send(
            HostInput::new(json!({"answer": 1}))
                .with_status(201)
                .with_correlation_id(first_id),
        )
        .await
        .unwrap();

    let first = timeout(EVENT_TIMEOUT, first).await.unwrap().unwrap();
    let second = timeout(EVENT_TIMEOUT, second).await.unwrap().unwrap();
    assert_eq!((first.status, first.body.as_str()), (201, r#"{"answer":1}"#));
    assert_eq!((second.status, second.body.as_str()), (202, r#"{"answer":2}"#));

    handle.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_method_capabilities_do_not_take_each_others_responses() {
    let edge = Edge::connected(ResolverSettings::default()).await;
    let (reboot, mut reboot_events) = edge.spawn("m1", method("reboot"));
    let (reset, mut reset_events) = edge.spawn("m2", method("reset"));
    wait_status(&mut reboot_events, NodeStatus::Connected).await;
    wait_status(&mut reset_events, NodeStatus::Connected).await;
    until(|| {
        edge.connectivity.has_method_handler("reboot")
            && edge.connectivity.has_method_handler("reset")
    })
    .await;

    let reboot_response = edge
        .connectivity
        .invoke_method("reboot", None)
        .await
        .unwrap();
    let reset_response = edge
        .connectivity
        .invoke_method("reset", None)
        .await
        .unwrap();
    next_output(&mut reboot_events).await;
    next_output(&mut reset_events).await;

    // No correlation ids: each response is keyed by its capability's method.
    reset
        .send(HostInput::new("reset done").with_status(200))
        .await
        .unwrap();
    reboot
        .send(HostInput::new("reboot done").with_status(500))
        .await
        .unwrap();

    let reboot_response = timeout(EVENT_TIMEOUT, reboot_response).await.unwrap().unwrap();
    let reset_response = timeout(EVENT_TIMEOUT, reset_response).await.unwrap().unwrap();
    assert_eq!((reboot_response.status, reboot_response.body.as_str()), (500, "reboot done"));
    assert_eq!((reset_response.status, reset_response.body.as_str()), (200, "reset done"));

    reboot.close().await;
    reset.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_orphaned_responses_expire() {
    let edge = Edge::connected(ResolverSettings {
        response_ttl: Duration::from_secs(4),
        ..ResolverSettings::default()
    })
    .await;
    let cleanup = edge.context.spawn_response_cleanup();
    let (handle, mut events) = edge.spawn("m", method("reboot"));
    wait_status(&mut events, NodeStatus::Connected).await;

    // A response nobody asked for.
    handle
        .send(HostInput::new("late").with_status(200))
        .await
        .unwrap();
    until(|| edge.context.responses().len() == 1).await;

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(edge.context.responses().is_empty());
    assert!(edge.context.responses().stats().total_expired.load(Ordering::Relaxed) >= 1);

    handle.close().await;
    edge.context.shutdown();
    cleanup.await.unwrap();
}
