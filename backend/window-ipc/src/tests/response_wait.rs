use crate::controller::WindowControllerBuilder;
use crate::error::handler::HandlerError;
use crate::registry::{MethodContract, RegistryBuilder};
use crate::tests::support::{EXAMPLE_WINDOW, Harness, open_window, wait_until};
use crate::transport::RendererTransport;

use common::channel::{response_channel, scoped_name};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

fn ack_window(calls: Arc<AtomicUsize>, builder: WindowControllerBuilder) -> Harness {
    let registry = RegistryBuilder::new()
        .declare_window_type(EXAMPLE_WINDOW)
        .register_method(
            EXAMPLE_WINDOW,
            "pickColor",
            MethodContract::raw(move |_, _| {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<Value, HandlerError>(json!("handler result"))
                }
            })
            .with_renderer_ack(),
        )
        .unwrap()
        .build()
        .unwrap();
    open_window(&registry, builder)
}

/// **VALUE**: Verifies a renderer-ack method resolves with the payload sent on the companion
/// Response channel, and the handler's own return value is discarded.
///
/// **WHY THIS MATTERS**: The handler may only open a dialog; the real answer comes from the
/// page later.
///
/// **BUG THIS CATCHES**: Would catch the request resolving with the handler result, or
/// resolving before the page responds.
#[tokio::test]
async fn given_ack_method_when_page_responds_then_request_resolves_with_response_payload() {
    // GIVEN: A window whose pickColor needs a renderer ack
    let calls = Arc::new(AtomicUsize::new(0));
    let harness = ack_window(Arc::clone(&calls), WindowControllerBuilder::new(EXAMPLE_WINDOW));
    let id = harness.controller.window_id().clone();
    let reply_channel = response_channel(&id, "pickColor");

    // WHEN: Invoking it
    let pending = tokio::spawn(
        harness
            .renderer
            .invoke(&scoped_name(&id, "pickColor"), Value::Null),
    );

    // THEN: The request waits on "<id>:<id>:pickColorResponse"
    assert!(wait_until(|| harness.transport.has_handler(&reply_channel)).await);
    assert!(wait_until(|| calls.load(Ordering::SeqCst) == 1).await);
    assert!(!pending.is_finished());
    assert_eq!(reply_channel, format!("{id}:{id}:pickColorResponse"));

    // WHEN: The page responds
    harness
        .renderer
        .invoke(&reply_channel, json!({"color": "red"}))
        .await
        .unwrap();

    // THEN: The request resolves with the page's payload
    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply, json!({"success": true, "data": {"color": "red"}}));
    assert!(!harness.transport.has_handler(&reply_channel));
    assert_eq!(harness.controller.pending_response_count(), 0);
}

/// **VALUE**: Verifies a second concurrent request for the same ack method fails instead of
/// hijacking the first one's response.
///
/// **WHY THIS MATTERS**: The response channel is single-fire; two waiters cannot share it.
///
/// **BUG THIS CATCHES**: Would catch the second request replacing the first waiter.
#[tokio::test]
async fn given_pending_ack_request_when_second_request_arrives_then_second_fails() {
    // GIVEN: One request already waiting
    let calls = Arc::new(AtomicUsize::new(0));
    let harness = ack_window(calls, WindowControllerBuilder::new(EXAMPLE_WINDOW));
    let id = harness.controller.window_id().clone();
    let channel = scoped_name(&id, "pickColor");
    let first = tokio::spawn(harness.renderer.invoke(&channel, Value::Null));
    assert!(
        wait_until(|| harness.transport.has_handler(&response_channel(&id, "pickColor"))).await
    );

    // WHEN: A second request arrives
    let second = harness.renderer.invoke(&channel, Value::Null).await.unwrap();

    // THEN: It fails; the first still completes with the response
    assert_eq!(second["success"], json!(false));
    assert_eq!(
        second["error"],
        json!("A response for 'pickColor' is already pending")
    );

    harness
        .renderer
        .invoke(&response_channel(&id, "pickColor"), json!("blue"))
        .await
        .unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first, json!({"success": true, "data": "blue"}));
}

/// **VALUE**: Verifies the optional bounded wait answers with a timeout failure.
///
/// **WHY THIS MATTERS**: Without it a page that never responds leaves the caller hanging;
/// with it configured the caller gets a readable reason.
///
/// **BUG THIS CATCHES**: Would catch a configured timeout being ignored or leaving the
/// response channel registered.
#[tokio::test(start_paused = true)]
async fn given_response_timeout_when_page_never_responds_then_timeout_failure() {
    // GIVEN: A 500ms response timeout
    let calls = Arc::new(AtomicUsize::new(0));
    let harness = ack_window(
        calls,
        WindowControllerBuilder::new(EXAMPLE_WINDOW)
            .with_response_timeout(Some(Duration::from_millis(500))),
    );
    let id = harness.controller.window_id().clone();

    // WHEN: Invoking and never responding
    let reply = harness
        .renderer
        .invoke(&scoped_name(&id, "pickColor"), Value::Null)
        .await
        .unwrap();

    // THEN: Timeout failure, channel released
    assert_eq!(reply["success"], json!(false));
    let error = reply["error"].as_str().unwrap();
    assert!(error.starts_with("Timed out waiting for renderer response"), "got: {error}");
    assert!(!harness.transport.has_handler(&response_channel(&id, "pickColor")));
}

/// **VALUE**: Verifies closing the window resolves a waiting request with a failure.
///
/// **WHY THIS MATTERS**: Teardown releases every channel; the waiter must learn the window
/// went away instead of hanging.
///
/// **BUG THIS CATCHES**: Would catch teardown leaking the response channel.
#[tokio::test]
async fn given_waiting_request_when_window_closes_then_failure_envelope() {
    // GIVEN: A request waiting for the page
    let calls = Arc::new(AtomicUsize::new(0));
    let harness = ack_window(calls, WindowControllerBuilder::new(EXAMPLE_WINDOW));
    let id = harness.controller.window_id().clone();
    let pending = tokio::spawn(
        harness
            .renderer
            .invoke(&scoped_name(&id, "pickColor"), Value::Null),
    );
    assert!(wait_until(|| harness.controller.pending_response_count() == 1).await);

    // WHEN: The controller tears down
    harness.controller.on_closed();

    // THEN: The request fails, nothing remains registered
    let reply = pending.await.unwrap().unwrap();
    assert_eq!(reply["success"], json!(false));
    assert!(
        reply["error"]
            .as_str()
            .unwrap()
            .starts_with("Window closed before responding")
    );
    assert_eq!(harness.transport.handler_count(), 0);
}

/// **VALUE**: Verifies a failing ack handler answers immediately and releases its response
/// channel.
///
/// **WHY THIS MATTERS**: If the handler fails the page will never respond; waiting would
/// hang the caller forever.
///
/// **BUG THIS CATCHES**: Would catch the failure being swallowed while the wait continues.
#[tokio::test]
async fn given_ack_handler_failure_when_invoked_then_failure_and_channel_released() {
    // GIVEN: An ack method whose handler fails
    let registry = RegistryBuilder::new()
        .declare_window_type(EXAMPLE_WINDOW)
        .register_method(
            EXAMPLE_WINDOW,
            "pickColor",
            MethodContract::raw(|_, _| async { Err::<Value, _>(HandlerError::from("no dialog")) })
                .with_renderer_ack(),
        )
        .unwrap()
        .build()
        .unwrap();
    let harness = open_window(&registry, WindowControllerBuilder::new(EXAMPLE_WINDOW));
    let id = harness.controller.window_id().clone();

    // WHEN: Invoking it
    let reply = harness
        .renderer
        .invoke(&scoped_name(&id, "pickColor"), Value::Null)
        .await
        .unwrap();

    // THEN: Failure with the handler's message, response channel gone
    assert_eq!(reply, json!({"success": false, "error": "no dialog"}));
    assert!(!harness.transport.has_handler(&response_channel(&id, "pickColor")));
    assert_eq!(harness.controller.pending_response_count(), 0);
}
