//! Operation polling.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use nodefleet_cli::application::services::poller::await_operation;
use nodefleet_cli::domain::backoff::FIRST_RETRY_DELAY;
use nodefleet_cli::domain::operation::OperationStatus;
use tokio::time::Instant;

use crate::fakes::{FakeGateway, InstanceBehaviour, PROJECT, ZONE, done_op, running_op};

const INTERVAL: Duration = Duration::from_secs(1);

#[tokio::test]
async fn test_done_operation_returns_without_polling() {
    let gateway = FakeGateway::default();

    let op = await_operation(&gateway, PROJECT, done_op("op-1"), INTERVAL)
        .await
        .unwrap();

    assert!(op.is_done());
    assert!(gateway.calls.borrow().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_zonal_operation_is_polled_through_its_zone() {
    let gateway = FakeGateway::default();
    gateway.pending_polls.set(2);
    let start = Instant::now();

    let op = await_operation(&gateway, PROJECT, running_op("op-1"), INTERVAL)
        .await
        .unwrap();

    assert_eq!(op.status, OperationStatus::Done);
    assert_eq!(op.zone_name(), Some(ZONE));
    assert_eq!(gateway.calls_to("get_operation"), vec!["op-1", "op-1"]);

    // Only the fixed delay separates the first and second fetch.
    let elapsed = start.elapsed();
    assert!(elapsed >= FIRST_RETRY_DELAY);
    assert!(elapsed < FIRST_RETRY_DELAY + Duration::from_millis(5));
}

#[tokio::test(start_paused = true)]
async fn test_operation_done_on_first_fetch_does_not_sleep() {
    let gateway = FakeGateway::default();
    gateway.pending_polls.set(1);
    let start = Instant::now();

    let op = await_operation(&gateway, PROJECT, running_op("op-1"), INTERVAL)
        .await
        .unwrap();

    assert!(op.is_done());
    assert_eq!(gateway.calls_to("get_operation"), vec!["op-1"]);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_third_fetch_waits_for_jittered_backoff() {
    let gateway = FakeGateway::default();
    gateway.pending_polls.set(3);
    let start = Instant::now();

    await_operation(&gateway, PROJECT, running_op("op-1"), INTERVAL)
        .await
        .unwrap();

    assert_eq!(gateway.calls_to("get_operation").len(), 3);
    // 10s fixed delay, then between 1s and 2s of jittered backoff.
    let elapsed = start.elapsed();
    assert!(elapsed >= FIRST_RETRY_DELAY + Duration::from_secs(1));
    assert!(elapsed <= FIRST_RETRY_DELAY + Duration::from_millis(2005));
}

#[tokio::test(start_paused = true)]
async fn test_global_operation_is_polled_without_zone() {
    let gateway = FakeGateway::default();
    let mut op = running_op("op-global");
    op.zone = None;

    let op = await_operation(&gateway, PROJECT, op, INTERVAL).await.unwrap();

    assert!(op.is_done());
    assert!(op.zone.is_none());
    assert_eq!(gateway.calls_to("get_operation").len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_error_payload_is_returned_not_raised() {
    let gateway = FakeGateway::default().with_behaviour(
        "compute-01",
        InstanceBehaviour::OperationError("ZONE_RESOURCE_POOL_EXHAUSTED".to_string()),
    );

    let op = await_operation(&gateway, PROJECT, running_op("op-insert-compute-01"), INTERVAL)
        .await
        .unwrap();

    assert!(op.is_done());
    assert!(op.error_summary().unwrap().contains("ZONE_RESOURCE_POOL_EXHAUSTED"));
}
