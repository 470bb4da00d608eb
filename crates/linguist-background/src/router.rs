//! Name-keyed dispatch of request messages to typed handlers.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use linguist_protocol::{ErrorKind, RequestMessage, ResponseMessage};

use crate::error::{HandlerError, RouterError, RouterResult};

/// A typed handler for one request name.
///
/// The payload is decoded from JSON and then passed through
/// [`validate`](RequestHandler::validate); if either step fails the caller
/// receives `InvalidPayload` and [`handle`](RequestHandler::handle) is never
/// called.
#[async_trait]
pub trait RequestHandler<C>: Send + Sync + 'static
where
    C: Send + Sync + 'static,
{
    const NAME: &'static str;

    type Payload: DeserializeOwned + Send + 'static;
    type Output: Serialize + Send + 'static;

    fn validate(_payload: &Self::Payload) -> Result<(), String> {
        Ok(())
    }

    async fn handle(ctx: Arc<C>, payload: Self::Payload) -> Result<Self::Output, HandlerError>;
}

enum Rejection {
    InvalidPayload(String),
    Handler(HandlerError),
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, Rejection>> + Send>>;
type ErasedHandler<C> = Arc<dyn Fn(Arc<C>, Value) -> HandlerFuture + Send + Sync>;

fn erase<C, H>() -> ErasedHandler<C>
where
    C: Send + Sync + 'static,
    H: RequestHandler<C>,
{
    Arc::new(|ctx: Arc<C>, raw: Value| -> HandlerFuture {
        Box::pin(async move {
            let payload: H::Payload =
                serde_json::from_value(raw).map_err(|e| Rejection::InvalidPayload(e.to_string()))?;
            H::validate(&payload).map_err(Rejection::InvalidPayload)?;
            let output = H::handle(ctx, payload).await.map_err(Rejection::Handler)?;
            serde_json::to_value(output)
                .map_err(|e| Rejection::Handler(HandlerError::failed(format!("cannot encode result: {e}"))))
        })
    })
}

/// Routes [`RequestMessage`]s to registered handlers over a shared context.
pub struct Router<C> {
    ctx: Arc<C>,
    handlers: HashMap<&'static str, ErasedHandler<C>>,
    order: Vec<&'static str>,
    sealed: bool,
}

impl<C: Send + Sync + 'static> Router<C> {
    /// Create an empty, unsealed router over `ctx`.
    pub fn new(ctx: Arc<C>) -> Self {
        Self {
            ctx,
            handlers: HashMap::new(),
            order: Vec::new(),
            sealed: false,
        }
    }

    /// The context handed to every handler.
    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }

    /// Register handler `H` under its name. Fails on a duplicate name or once sealed.
    pub fn register<H: RequestHandler<C>>(&mut self) -> RouterResult<&mut Self> {
        if self.sealed {
            return Err(RouterError::RegistrationClosed(H::NAME));
        }
        if self.handlers.contains_key(H::NAME) {
            return Err(RouterError::DuplicateName(H::NAME));
        }
        self.handlers.insert(H::NAME, erase::<C, H>());
        self.order.push(H::NAME);
        Ok(self)
    }

    /// Close registration. The readiness handler must have been registered
    /// last, so a successful readiness check implies every handler is live.
    pub fn seal(&mut self, readiness: &'static str) -> RouterResult<()> {
        let last = self.order.last().copied();
        if last != Some(readiness) {
            return Err(RouterError::ReadinessNotLast {
                expected: readiness,
                found: last,
            });
        }
        self.sealed = true;
        debug!(handlers = self.order.len(), "router sealed");
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Registered names in registration order.
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }

    /// Answer one request. Never fails: every outcome, including a handler
    /// panic, becomes a response carrying the request's correlation id.
    pub async fn dispatch(&self, request: RequestMessage) -> ResponseMessage {
        let RequestMessage {
            correlation_id,
            request_name,
            payload,
        } = request;

        let Some(handler) = self.handlers.get(request_name.as_str()) else {
            debug!(request = %request_name, "unknown request");
            return ResponseMessage::error(
                correlation_id,
                ErrorKind::UnknownRequest,
                format!("no handler for request {request_name:?}"),
            );
        };

        debug!(request = %request_name, %correlation_id, "dispatching");
        let task = tokio::spawn(handler(Arc::clone(&self.ctx), payload));
        match task.await {
            Ok(Ok(result)) => ResponseMessage::ok(correlation_id, result),
            Ok(Err(Rejection::InvalidPayload(reason))) => {
                debug!(request = %request_name, %reason, "invalid payload");
                ResponseMessage::error(correlation_id, ErrorKind::InvalidPayload, reason)
            }
            Ok(Err(Rejection::Handler(err))) => {
                debug!(request = %request_name, error = %err, "handler failed");
                ResponseMessage::error(correlation_id, err.kind(), err.to_string())
            }
            Err(join) => {
                let message = if join.is_panic() {
                    panic_message(join.into_panic())
                } else {
                    "handler task was cancelled".to_string()
                };
                warn!(request = %request_name, %message, "handler panicked");
                ResponseMessage::error(correlation_id, ErrorKind::HandlerFailure, message)
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(msg) => msg.to_string(),
            Err(_) => "handler panicked".to_string(),
        },
    }
}

impl<C> std::fmt::Debug for Router<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("handlers", &self.order)
            .field("sealed", &self.sealed)
            .finish()
    }
}
