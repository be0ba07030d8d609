use crate::context::WindowContext;
use crate::error::handler::HandlerError;
use crate::transport::Payload;

use common::{ErrorLocation, TypeShape, WindowMethod};

use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

/// Type-erased host-side handler: JSON params in, JSON result or failure out.
pub type HandlerFn = Arc<
    dyn Fn(WindowContext, Payload) -> BoxFuture<'static, Result<Payload, HandlerError>>
        + Send
        + Sync,
>;

/// One method of a window type: its handler plus the declaration the
/// presentation side is generated from.
#[derive(Clone)]
pub struct MethodContract {
    handler: HandlerFn,
    shape: TypeShape,
    needs_renderer_ack: bool,
}

impl MethodContract {
    /// Untyped handler working directly on JSON.
    pub fn raw<F, Fut>(handler: F) -> Self
    where
        F: Fn(WindowContext, Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Payload, HandlerError>> + Send + 'static,
    {
        Self {
            handler: Arc::new(move |context, payload| handler(context, payload).boxed()),
            shape: TypeShape::opaque(),
            needs_renderer_ack: false,
        }
    }

    /// Handler bound to a declared method: params are decoded into
    /// `M::Params` and the result encoded from `M::Returns`.
    pub fn typed<M, F, Fut, E>(handler: F) -> Self
    where
        M: WindowMethod,
        F: Fn(WindowContext, M::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Returns, E>> + Send + 'static,
        E: Into<HandlerError> + 'static,
    {
        let handler = Arc::new(handler);
        let erased: HandlerFn = Arc::new(move |context, payload| {
            let handler = Arc::clone(&handler);
            async move {
                let params: M::Params =
                    serde_json::from_value(payload).map_err(|e| HandlerError::InvalidParams {
                        method: M::NAME.to_string(),
                        reason: e.to_string(),
                        location: ErrorLocation::from(Location::caller()),
                    })?;

                let returns = handler(context, params).await.map_err(Into::into)?;

                serde_json::to_value(returns).map_err(|e| HandlerError::Encode {
                    method: M::NAME.to_string(),
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                })
            }
            .boxed()
        });

        Self {
            handler: erased,
            shape: TypeShape::of::<M>(),
            needs_renderer_ack: M::NEEDS_RENDERER_ACK,
        }
    }

    /// Complete requests with the presentation side's follow-up payload
    /// instead of the handler's own result.
    pub fn with_renderer_ack(mut self) -> Self {
        self.needs_renderer_ack = true;
        self
    }

    pub fn with_shape(mut self, shape: TypeShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }

    pub fn shape(&self) -> &TypeShape {
        &self.shape
    }

    pub fn needs_renderer_ack(&self) -> bool {
        self.needs_renderer_ack
    }

    pub fn call(
        &self,
        context: WindowContext,
        payload: Payload,
    ) -> BoxFuture<'static, Result<Payload, HandlerError>> {
        (self.handler)(context, payload)
    }
}

impl fmt::Debug for MethodContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodContract")
            .field("shape", &self.shape)
            .field("needs_renderer_ack", &self.needs_renderer_ack)
            .finish_non_exhaustive()
    }
}
