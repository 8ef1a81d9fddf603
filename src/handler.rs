//! The handler contract and how the harness invokes it.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::context::InvocationContext;
use crate::error::{HandlerError, InvocationError};
use crate::event::GatewayEvent;
use crate::result::HandlerResult;

/// Future returned by [`Handler::call`].
pub type HandlerFuture =
    Pin<Box<dyn Future<Output = Result<HandlerResult, HandlerError>> + Send + 'static>>;

/// A function served behind the gateway.
///
/// Implemented for any `Fn(GatewayEvent, InvocationContext) -> impl Future`
/// whose output is `Result<HandlerResult, E>`, so plain `async fn`s work:
///
/// ```rust
/// use lambda_gateway_local::{GatewayEvent, HandlerResult, InvocationContext};
///
/// async fn hello(
///     event: GatewayEvent,
///     _context: InvocationContext,
/// ) -> Result<HandlerResult, std::convert::Infallible> {
///     Ok(HandlerResult::text(format!("Hello from {}", event.raw_path)))
/// }
///
/// fn assert_handler(_: impl lambda_gateway_local::Handler) {}
/// assert_handler(hello);
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, event: GatewayEvent, context: InvocationContext) -> HandlerFuture;
}

impl<F, Fut, E> Handler for F
where
    F: Fn(GatewayEvent, InvocationContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HandlerResult, E>> + Send + 'static,
    E: Into<HandlerError>,
{
    fn call(&self, event: GatewayEvent, context: InvocationContext) -> HandlerFuture {
        let fut = self(event, context);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

/// Run one invocation on its own task.
///
/// A handler that errors or panics yields [`InvocationError::Fault`] or
/// [`InvocationError::Panicked`]. With a `timeout`, a handler that is still
/// running when it elapses is aborted and [`InvocationError::Timeout`] returned;
/// the abort only lands at the handler's next `.await`.
pub async fn invoke(
    handler: Arc<dyn Handler>,
    event: GatewayEvent,
    context: InvocationContext,
    timeout: Option<Duration>,
) -> Result<HandlerResult, InvocationError> {
    let mut task = tokio::spawn(handler.call(event, context));

    let joined = match timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                return Err(InvocationError::Timeout(limit));
            }
        },
        None => task.await,
    };

    match joined {
        Ok(Ok(result)) => Ok(result),
        Ok(Err(err)) => Err(InvocationError::Fault(err)),
        Err(join_err) => {
            warn!(error = %join_err, "handler task did not complete");
            Err(InvocationError::Panicked)
        }
    }
}
