//! Wraps host handlers so that only envelopes ever cross the transport.

use crate::context::WindowContext;
use crate::error::handler::HandlerError;
use crate::registry::MethodContract;
use crate::transport::{Payload, RequestHandler, request_handler};

use common::{ResponseEnvelope, UNKNOWN_ERROR};

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use log::{error, warn};

/// Drive a handler future to an envelope. Handler failures become
/// `success: false` with the handler's message; a panic becomes
/// `"Unknown error"`.
pub(crate) async fn run_handler(
    channel: &str,
    handler: BoxFuture<'static, Result<Payload, HandlerError>>,
) -> ResponseEnvelope {
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(Ok(data)) => ResponseEnvelope::ok(data),
        Ok(Err(e)) => {
            warn!("Handler for '{channel}' failed: {e} {}", e.location());
            ResponseEnvelope::err(e.to_string())
        }
        Err(_) => {
            error!("Handler for '{channel}' panicked");
            ResponseEnvelope::err(UNKNOWN_ERROR)
        }
    }
}

pub(crate) fn envelope_handler(
    channel: String,
    context: WindowContext,
    contract: MethodContract,
) -> RequestHandler {
    request_handler(move |payload| {
        let handler = contract.call(context.clone(), payload);
        let channel = channel.clone();
        async move { run_handler(&channel, handler).await.into_value() }
    })
}
