//! A small harness for locally developing HTTP API (payload format 2.0) handlers for AWS Lambda.
//!
//! A handler receives a [`GatewayEvent`] and an [`InvocationContext`] and returns a
//! [`HandlerResult`], exactly as it would behind API Gateway. Locally, each plain HTTP request
//! is turned into that event, the handler is invoked, and its result is written back as a
//! byte-exact HTTP response, base64 bodies included.
//!
//! For details, see the documentation for [`run`](fn.run.html).

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod body;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod handler;
pub mod headers;
pub mod lambda;
pub mod logging;
pub mod result;
#[cfg(feature = "local")]
pub mod rie;
#[cfg(feature = "local")]
pub mod server;
pub mod synth;
pub mod translate;

pub use body::Body;
pub use config::{BinaryPolicy, Config};
pub use context::InvocationContext;
pub use error::{Error, HandlerError, InvocationError, Result, TranslateError};
pub use event::GatewayEvent;
pub use handler::Handler;
pub use headers::{Headers, QueryParameters};
pub use lambda::is_lambda;
pub use result::HandlerResult;
#[cfg(feature = "local")]
pub use rie::RuntimeEmulator;
#[cfg(feature = "local")]
pub use server::LocalServer;

use std::sync::Arc;

use tokio::net::ToSocketAddrs;

/// Run a handler in either AWS Lambda or as a local development HTTP server.
///
/// If the `AWS_LAMBDA_RUNTIME_API` environment variable is present (as it is when running in
/// Lambda), events are received via the [AWS Lambda Runtime Interface][lambda-interface].
///
/// If not, configuration is read with [`Config::from_env`], an HTTP server is started on
/// `listen_addr` (which takes precedence over `LOCAL_LISTEN_ADDR`), and requests are served
/// until Ctrl-C.
///
/// If you need to decrease the size of the binary you deploy to Lambda, you can build the crate
/// with `--no-default-features` for your production build, which disables the HTTP server
/// component.
///
/// [lambda-interface]: https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html
///
/// # Example
///
/// ```rust,no_run
/// use lambda_gateway_local::{GatewayEvent, HandlerResult, InvocationContext};
///
/// #[tokio::main]
/// async fn main() -> lambda_gateway_local::Result<()> {
///     lambda_gateway_local::run(
///         |_event: GatewayEvent, _context: InvocationContext| async {
///             Ok::<_, std::convert::Infallible>(HandlerResult::text("Hello, world!"))
///         },
///         "localhost:3000",
///     )
///     .await
/// }
/// ```
///
/// # Errors
///
/// Fails if the configuration is invalid, if `listen_addr` resolves to no address or cannot be
/// bound, or if the Lambda runtime gives up.
#[cfg_attr(not(feature = "local"), allow(unused_variables))]
pub async fn run<H, A>(handler: H, listen_addr: A) -> Result<()>
where
    H: Handler,
    A: ToSocketAddrs,
{
    let handler: Arc<dyn Handler> = Arc::new(handler);

    #[cfg(feature = "local")]
    {
        if is_lambda() {
            lambda::run_on_lambda(handler).await
        } else {
            let mut config = Config::from_env()?;
            config.listen_addr = resolve(listen_addr).await?;
            serve_until_ctrl_c(LocalServer::with_shared_handler(config, handler)).await
        }
    }

    #[cfg(not(feature = "local"))]
    {
        lambda::run_on_lambda(handler).await
    }
}

/// First address `addr` resolves to, looked up without blocking the runtime.
#[cfg(feature = "local")]
async fn resolve(addr: impl ToSocketAddrs) -> Result<std::net::SocketAddr> {
    tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| Error::config("listen_addr resolved to no addresses"))
}

/// Bind the server's configured address and serve until Ctrl-C.
#[cfg(feature = "local")]
pub async fn serve_until_ctrl_c(server: LocalServer) -> Result<()> {
    let listener = server.bind().await?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the server is not shut down by the drop.
                tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        }
    });
    server.serve(listener, shutdown_rx).await
}
