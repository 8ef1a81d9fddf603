//! Forwarding to the AWS Lambda Runtime Interface Emulator.
//!
//! [`RuntimeEmulator`] is a [`Handler`] that posts the synthesized event to an
//! RIE invoke endpoint, so a function packaged as a container image can be
//! exercised over plain HTTP exactly like the in-process handlers. The
//! emulator builds its own invocation context; the harness's context is not
//! forwarded.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::context::InvocationContext;
use crate::error::{Error, HandlerError, Result};
use crate::event::GatewayEvent;
use crate::handler::{Handler, HandlerFuture};
use crate::result::HandlerResult;

/// The invoke URL RIE listens on by default.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9000/2015-03-31/functions/function/invocations";

/// A function running behind the Runtime Interface Emulator.
#[derive(Debug, Clone)]
pub struct RuntimeEmulator {
    endpoint: Uri,
}

/// What RIE returns when the function itself failed.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FunctionError {
    error_message: Option<String>,
    error_type: Option<String>,
}

#[derive(thiserror::Error, Debug)]
#[error("{0}")]
struct ForwardError(String);

fn forward_error(msg: impl Into<String>) -> HandlerError {
    Box::new(ForwardError(msg.into()))
}

impl RuntimeEmulator {
    pub fn new(endpoint: Uri) -> Result<Self> {
        if endpoint.scheme_str() != Some("http") || endpoint.authority().is_none() {
            return Err(Error::config(format!(
                "runtime emulator endpoint must be an absolute http:// URL, got {endpoint}"
            )));
        }
        Ok(Self { endpoint })
    }

    /// Endpoint from `RIE_ENDPOINT`, falling back to [`DEFAULT_ENDPOINT`].
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("RIE_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let endpoint = endpoint
            .parse::<Uri>()
            .map_err(|e| Error::config(format!("RIE_ENDPOINT={endpoint:?}: {e}")))?;
        Self::new(endpoint)
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    async fn forward(endpoint: Uri, event: GatewayEvent) -> std::result::Result<HandlerResult, HandlerError> {
        let payload = serde_json::to_vec(&event)?;
        let authority = endpoint
            .authority()
            .ok_or_else(|| forward_error("endpoint has no authority"))?
            .clone();
        let port = authority.port_u16().unwrap_or(80);

        let stream = TcpStream::connect((connect_host(authority.host()), port)).await?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream)).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "runtime emulator connection closed");
            }
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri(endpoint.path_and_query().map_or("/", |pq| pq.as_str()))
            .header(HOST, authority.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload)))?;

        let response = sender.send_request(request).await?;
        let status = response.status();
        let body = response.into_body().collect().await?.to_bytes();

        if !status.is_success() {
            return Err(forward_error(format!(
                "runtime emulator answered {status}: {}",
                String::from_utf8_lossy(&body)
            )));
        }
        parse_reply(&body)
    }
}

/// `Uri` keeps the brackets around IPv6 literals; sockets want them off.
fn connect_host(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

/// Interpret a function's JSON reply.
fn parse_reply(body: &[u8]) -> std::result::Result<HandlerResult, HandlerError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| forward_error(format!("function reply is not JSON: {e}")))?;

    if value.get("errorMessage").is_some() || value.get("errorType").is_some() {
        let failure: FunctionError = serde_json::from_value(value)?;
        warn!(
            error_type = failure.error_type.as_deref().unwrap_or("unknown"),
            "function returned an error"
        );
        return Err(forward_error(format!(
            "{}: {}",
            failure.error_type.unwrap_or_else(|| "Error".to_string()),
            failure.error_message.unwrap_or_default()
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| forward_error(format!("function reply has an invalid shape: {e}")))
}

impl Handler for RuntimeEmulator {
    fn call(&self, event: GatewayEvent, _context: InvocationContext) -> HandlerFuture {
        Box::pin(Self::forward(self.endpoint.clone(), event))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_is_accepted() {
        let rie = RuntimeEmulator::new(DEFAULT_ENDPOINT.parse().unwrap()).unwrap();
        assert_eq!(rie.endpoint().port_u16(), Some(9000));
    }

    #[test]
    fn relative_endpoints_are_rejected() {
        assert!(RuntimeEmulator::new("/invocations".parse().unwrap()).is_err());
        assert!(RuntimeEmulator::new("https://example.com/".parse().unwrap()).is_err());
    }

    #[test]
    fn ipv6_hosts_lose_their_brackets() {
        let endpoint: Uri = "http://[::1]:9000/2015-03-31/functions/function/invocations"
            .parse()
            .unwrap();
        let authority = endpoint.authority().unwrap();
        assert_eq!(connect_host(authority.host()), "::1");
        assert_eq!(connect_host("localhost"), "localhost");
        assert_eq!(connect_host("127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn forward_errors_display_their_message() {
        let err = forward_error("runtime emulator answered 502 Bad Gateway: ");
        assert_eq!(err.to_string(), "runtime emulator answered 502 Bad Gateway: ");
    }

    #[test]
    fn parses_a_gateway_reply() {
        let reply = br#"{"statusCode":201,"headers":{"Content-Type":"text/plain"},"body":"made"}"#;
        let result = parse_reply(reply).unwrap();
        assert_eq!(result.status_code, Some(201));
        assert_eq!(result.header("content-type"), Some("text/plain"));
        assert_eq!(result.body.as_deref(), Some("made"));
    }

    #[test]
    fn function_errors_are_faults() {
        let reply = br#"{"errorType":"TypeError","errorMessage":"x is undefined","trace":[]}"#;
        let err = parse_reply(reply).unwrap_err();
        assert_eq!(err.to_string(), "TypeError: x is undefined");
    }

    #[test]
    fn malformed_replies_are_faults() {
        assert!(parse_reply(b"not json").is_err());
        assert!(parse_reply(br#"{"statusCode":"two hundred"}"#).is_err());
    }
}
