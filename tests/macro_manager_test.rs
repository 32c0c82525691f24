//! Concurrency tests for the repeating macro manager

use std::sync::Arc;
use std::time::Duration;

use macrobot::macros::MacroManager;
use macrobot::transport::mock::MockTransport;

fn manager_with_mock() -> (Arc<MockTransport>, MacroManager) {
    let transport = Arc::new(MockTransport::new());
    let manager = MacroManager::new(transport.clone());
    (transport, manager)
}

/// Let any in-flight tick finish, then a settle window to observe
/// whether further sends happen
async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn test_macro_sends_then_waits() {
    let (transport, manager) = manager_with_mock();

    manager
        .start(10, "banana", "50ms", Duration::from_millis(50))
        .await;

    // First send is immediate; subsequent sends follow full waits
    tokio::time::sleep(Duration::from_millis(230)).await;
    let sends = transport.sent_to(10);
    assert!(
        sends.len() >= 2,
        "expected repeated sends, got {}",
        sends.len()
    );
    assert!(sends.iter().all(|text| text == "banana"));

    manager.stop(10).await;
}

#[tokio::test]
async fn test_replaced_macro_never_sends_again() {
    let (transport, manager) = manager_with_mock();

    manager
        .start(10, "banana", "50ms", Duration::from_millis(50))
        .await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    manager
        .start(10, "apple", "50ms", Duration::from_millis(50))
        .await;
    settle().await;

    let banana_count = transport
        .sent_to(10)
        .iter()
        .filter(|text| *text == "banana")
        .count();
    assert!(banana_count >= 1, "old macro should have ticked first");

    tokio::time::sleep(Duration::from_millis(250)).await;

    let sends = transport.sent_to(10);
    let banana_after = sends.iter().filter(|text| *text == "banana").count();
    let apple_after = sends.iter().filter(|text| *text == "apple").count();

    assert_eq!(
        banana_after, banana_count,
        "superseded macro must not send after replacement"
    );
    assert!(apple_after >= 2, "replacement macro should keep ticking");

    let statuses = manager.list().await;
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].item, "apple");

    manager.stop(10).await;
}

#[tokio::test]
async fn test_stop_mid_wait_performs_no_further_sends() {
    let (transport, manager) = manager_with_mock();

    manager
        .start(10, "banana", "80ms", Duration::from_millis(80))
        .await;

    // The task has sent once and is inside its interval wait
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(manager.stop(10).await);
    settle().await;

    let count_after_stop = transport.sent_to(10).len();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        transport.sent_to(10).len(),
        count_after_stop,
        "canceled macro must perform zero further sends"
    );
}

#[tokio::test]
async fn test_stop_mid_send_performs_no_further_sends() {
    let (transport, manager) = manager_with_mock();

    // Slow sends down so the stop lands while a tick is mid-send
    transport.set_send_delay(Some(Duration::from_millis(120)));

    manager
        .start(10, "banana", "40ms", Duration::from_millis(40))
        .await;

    // The first tick is still inside its delayed send
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(manager.stop(10).await);

    // The in-flight send may complete or abort; give it room to do
    // either before taking the baseline
    tokio::time::sleep(Duration::from_millis(200)).await;
    let count_after_stop = transport.sent_to(10).len();
    assert!(
        count_after_stop <= 1,
        "at most the in-flight send may land, got {}",
        count_after_stop
    );

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        transport.sent_to(10).len(),
        count_after_stop,
        "macro canceled mid-send must perform zero subsequent sends"
    );
}

#[tokio::test]
async fn test_stop_all_silences_every_channel() {
    let (transport, manager) = manager_with_mock();

    for channel_id in [10, 20, 30] {
        manager
            .start(channel_id, "item", "40ms", Duration::from_millis(40))
            .await;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(manager.stop_all().await, 3);
    settle().await;

    let count_after_stop = transport.sent_messages().len();
    tokio::time::sleep(Duration::from_millis(250)).await;

    assert_eq!(transport.sent_messages().len(), count_after_stop);
    assert!(manager.list().await.is_empty());
}

#[tokio::test]
async fn test_send_failure_does_not_terminate_loop() {
    let (transport, manager) = manager_with_mock();

    transport.fail_channel(10, true);
    manager
        .start(10, "banana", "40ms", Duration::from_millis(40))
        .await;

    // Several ticks fail outright
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(transport.sent_to(10).is_empty());

    // Once the transport recovers the same loop keeps delivering
    transport.fail_channel(10, false);
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(
        !transport.sent_to(10).is_empty(),
        "loop should keep retrying on its schedule after send failures"
    );

    manager.stop(10).await;
}

#[tokio::test]
async fn test_channels_tick_independently() {
    let (transport, manager) = manager_with_mock();

    manager
        .start(10, "left", "50ms", Duration::from_millis(50))
        .await;
    manager
        .start(20, "right", "50ms", Duration::from_millis(50))
        .await;

    tokio::time::sleep(Duration::from_millis(230)).await;

    assert!(transport.sent_to(10).len() >= 2);
    assert!(transport.sent_to(20).len() >= 2);

    // Stopping one channel leaves the other running
    manager.stop(10).await;
    settle().await;
    let left_count = transport.sent_to(10).len();
    let right_count = transport.sent_to(20).len();

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(transport.sent_to(10).len(), left_count);
    assert!(transport.sent_to(20).len() > right_count);

    manager.stop_all().await;
}
