//! The local HTTP listener.
//!
//! ```text
//! HTTP client
//!   │
//!   ▼
//! hyper http1 connection (one tokio task each)
//!   │
//!   ├── collect body (size-limited)
//!   ├── synthesize (GatewayEvent, InvocationContext)
//!   ├── invoke handler on its own task, under the deadline
//!   ├── translate HandlerResult -> Response
//!   │
//!   ▼
//! HTTP response
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::Config;
use crate::error::Result;
use crate::handler::{self, Handler};
use crate::synth;
use crate::translate::{self, plain_response};

/// Serves one handler over plain HTTP/1.1.
#[derive(Clone)]
pub struct LocalServer {
    config: Arc<Config>,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for LocalServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LocalServer {
    pub fn new(config: Config, handler: impl Handler) -> Self {
        Self::with_shared_handler(config, Arc::new(handler))
    }

    pub fn with_shared_handler(config: Config, handler: Arc<dyn Handler>) -> Self {
        Self {
            config: Arc::new(config),
            handler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Bind the configured listen address.
    pub async fn bind(&self) -> Result<TcpListener> {
        Ok(TcpListener::bind(self.config.listen_addr).await?)
    }

    /// Accept connections until `shutdown` flips to `true` (or its sender is
    /// dropped). In-flight connections are left to finish on their own tasks.
    pub async fn serve(self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "listening on http://{local_addr}");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            error!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let server = self.clone();
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let server = server.clone();
                            async move { Ok::<_, Infallible>(server.handle(req, peer).await) }
                        });
                        if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                            debug!(%peer, error = %e, "connection error");
                        }
                    });
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("shutting down");
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Handle one request end to end. Always produces a response.
    pub async fn handle(&self, req: Request<Incoming>, peer: SocketAddr) -> Response<Full<Bytes>> {
        let started = Instant::now();
        let (parts, body) = req.into_parts();

        let body = match Limited::new(body, self.config.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                let response = if e.downcast_ref::<LengthLimitError>().is_some() {
                    plain_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        Bytes::from_static(br#"{"message":"Request Entity Too Large"}"#),
                    )
                } else {
                    plain_response(
                        StatusCode::BAD_REQUEST,
                        Bytes::from_static(br#"{"message":"Bad Request"}"#),
                    )
                };
                info!(
                    method = %parts.method,
                    uri = %parts.uri,
                    status = response.status().as_u16(),
                    error = %e,
                    "request body rejected"
                );
                return response.map(Full::new);
            }
        };

        let (event, context) = synth::synthesize(&self.config, &parts, &body, peer);
        let span = info_span!(
            "invocation",
            request_id = %event.request_context.request_id,
            aws_request_id = %context.aws_request_id,
        );

        async {
            let outcome = handler::invoke(
                Arc::clone(&self.handler),
                event,
                context,
                self.config.invocation_timeout,
            )
            .await;
            let response = translate::respond(&self.config, outcome);
            info!(
                method = %parts.method,
                uri = %parts.uri,
                status = response.status().as_u16(),
                elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                "request handled"
            );
            response.map(Full::new)
        }
        .instrument(span)
        .await
    }
}
