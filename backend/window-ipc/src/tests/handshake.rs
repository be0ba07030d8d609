use crate::controller::WindowControllerBuilder;
use crate::tests::support::{EXAMPLE_WINDOW, example_registry, open_example_window, open_window, wait_until};
use crate::transport::{RendererTransport, WindowHandle};

use common::channel::{DATA_CHANNEL, ack_channel};

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::sleep;

/// **VALUE**: Verifies the handshake repeats at the fixed interval and stops exactly at the
/// ack: three ticks, ack after the second, exactly two broadcasts.
///
/// **WHY THIS MATTERS**: The page attaches its listener at an unknown time; broadcasting
/// must continue until it answers and then stop for good.
///
/// **BUG THIS CATCHES**: Would catch a handshake that never stops, stops early, or
/// broadcasts once more after the ack.
#[tokio::test(start_paused = true)]
async fn given_loaded_window_when_acked_after_second_tick_then_exactly_two_broadcasts() {
    // GIVEN: A loaded window with the default 2s interval
    let harness = open_example_window();
    let id = harness.controller.window_id().clone();
    harness.window.finish_load();

    // WHEN: Two ticks pass
    sleep(Duration::from_millis(2_001)).await;
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 1);
    sleep(Duration::from_millis(2_000)).await;
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 2);

    // WHEN: The page acks, then the third tick and many more pass
    harness
        .renderer
        .invoke(&ack_channel(&id), Value::Null)
        .await
        .unwrap();
    sleep(Duration::from_millis(2_000)).await;
    sleep(Duration::from_millis(20_000)).await;

    // THEN: Exactly two broadcasts, none after the ack
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 2);
    assert!(harness.controller.is_acknowledged());
    assert!(!harness.controller.is_broadcasting());
    assert!(!harness.transport.has_handler(&ack_channel(&id)));
}

/// **VALUE**: Verifies nothing is broadcast before the content finished loading.
///
/// **WHY THIS MATTERS**: Broadcasting into a window that is still loading is pure waste.
///
/// **BUG THIS CATCHES**: Would catch a handshake started from the constructor.
#[tokio::test(start_paused = true)]
async fn given_loading_window_when_time_passes_then_nothing_broadcast() {
    // GIVEN: A window that never finishes loading
    let harness = open_example_window();

    // WHEN: Time passes
    sleep(Duration::from_secs(10)).await;

    // THEN: No broadcast, no ack handler
    assert!(harness.recording.sent_on(DATA_CHANNEL).is_empty());
    assert!(!harness.controller.is_broadcasting());
}

/// **VALUE**: Verifies the broadcast payload is the initial data with windowId added.
///
/// **WHY THIS MATTERS**: The page learns its own id only from this payload.
///
/// **BUG THIS CATCHES**: Would catch the data or the id missing from the broadcast.
#[tokio::test(start_paused = true)]
async fn given_initial_data_when_broadcast_then_payload_has_data_and_window_id() {
    // GIVEN: A controller with initial data
    let data = json!({"theme": "dark"}).as_object().cloned().unwrap();
    let harness = open_window(
        &example_registry(),
        WindowControllerBuilder::new(EXAMPLE_WINDOW).with_data(data),
    );
    let id = harness.controller.window_id().to_string();

    // WHEN: The first tick passes after load
    harness.window.finish_load();
    sleep(Duration::from_millis(2_001)).await;

    // THEN: The payload spreads the data and adds windowId
    assert_eq!(
        harness.recording.sent_on(DATA_CHANNEL),
        vec![json!({"theme": "dark", "windowId": id})]
    );
}

/// **VALUE**: Verifies a reload after an acknowledged handshake starts a new one.
///
/// **WHY THIS MATTERS**: A reloaded page has lost its state and needs its id again.
///
/// **BUG THIS CATCHES**: Would catch a controller that only ever handshakes once.
#[tokio::test(start_paused = true)]
async fn given_acknowledged_handshake_when_reloaded_then_broadcasting_restarts() {
    // GIVEN: An acknowledged handshake
    let harness = open_example_window();
    let id = harness.controller.window_id().clone();
    harness.window.finish_load();
    sleep(Duration::from_millis(2_001)).await;
    harness
        .renderer
        .invoke(&ack_channel(&id), Value::Null)
        .await
        .unwrap();
    assert!(wait_until(|| harness.controller.is_acknowledged()).await);

    // WHEN: The page reloads
    harness.window.finish_load();
    sleep(Duration::from_millis(2_001)).await;

    // THEN: A new round broadcasts and waits for a new ack
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 2);
    assert!(harness.transport.has_handler(&ack_channel(&id)));
    assert!(harness.controller.is_broadcasting());
}

/// **VALUE**: Verifies a reload during an unacknowledged handshake keeps the running one.
///
/// **WHY THIS MATTERS**: Starting a second round would try to register a second ack handler
/// and reset the cadence.
///
/// **BUG THIS CATCHES**: Would catch restarts that delay or duplicate broadcasts.
#[tokio::test(start_paused = true)]
async fn given_running_handshake_when_reloaded_then_cadence_unchanged() {
    // GIVEN: A handshake running for one second
    let harness = open_example_window();
    harness.window.finish_load();
    sleep(Duration::from_millis(1_000)).await;

    // WHEN: The page reloads before the first tick
    harness.window.finish_load();
    sleep(Duration::from_millis(1_001)).await;

    // THEN: The first tick still came at 2s, and the next at 4s
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 1);
    sleep(Duration::from_millis(2_000)).await;
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 2);
}

/// **VALUE**: Verifies closing the window stops broadcasting and releases the ack handler.
///
/// **WHY THIS MATTERS**: A closed window never acks; the handshake must not run forever.
///
/// **BUG THIS CATCHES**: Would catch teardown leaving the broadcast task or ack channel.
#[tokio::test(start_paused = true)]
async fn given_running_handshake_when_window_closed_then_broadcast_stops_and_ack_released() {
    // GIVEN: A running handshake
    let harness = open_example_window();
    let id = harness.controller.window_id().clone();
    harness.window.finish_load();
    sleep(Duration::from_millis(2_001)).await;

    // WHEN: The window closes
    harness.window.close();
    assert!(wait_until(|| harness.controller.is_torn_down()).await);
    sleep(Duration::from_secs(10)).await;

    // THEN: No more broadcasts, nothing left registered
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 1);
    assert!(!harness.transport.has_handler(&ack_channel(&id)));
    assert_eq!(harness.transport.handler_count(), 0);
}

/// **VALUE**: Verifies the configured interval drives the cadence.
///
/// **WHY THIS MATTERS**: Hosts tune the interval through configuration.
///
/// **BUG THIS CATCHES**: Would catch the builder ignoring with_handshake_interval.
#[tokio::test(start_paused = true)]
async fn given_custom_interval_when_loaded_then_broadcasts_at_that_interval() {
    // GIVEN: A 100ms interval
    let harness = open_window(
        &example_registry(),
        WindowControllerBuilder::new(EXAMPLE_WINDOW)
            .with_handshake_interval(Duration::from_millis(100)),
    );

    // WHEN: 550ms pass after load
    harness.window.finish_load();
    sleep(Duration::from_millis(550)).await;

    // THEN: Five broadcasts
    assert_eq!(harness.recording.sent_on(DATA_CHANNEL).len(), 5);
    assert_eq!(harness.recording.label(), EXAMPLE_WINDOW);
}
