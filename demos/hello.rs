//! The function used by the end-to-end tests: echoes the event and context back
//! as JSON, or returns a fixed binary payload for `?binary=true`.
//!
//! ```text
//! cargo run --example hello
//! curl 'http://localhost:8080/foo/bar?testkey=testvalue'
//! curl 'http://localhost:8080/foo/bar?binary=true'
//! ```

use lambda_gateway_local::{GatewayEvent, HandlerError, HandlerResult, InvocationContext};
use serde_json::json;

async fn handler(event: GatewayEvent, context: InvocationContext) -> Result<HandlerResult, HandlerError> {
    tracing::info!(path = %event.raw_path, "received event");

    if event.query_string_parameters.get("binary") == Some("true") {
        return Ok(HandlerResult::binary(b"This is a test binary data".to_vec())
            .with_header("Content-Type", "application/octet-stream"));
    }

    Ok(HandlerResult::json(&json!({
        "message": "Hello from Lambda!",
        "event": event,
        "context": context,
    }))?)
}

#[tokio::main]
async fn main() -> lambda_gateway_local::Result<()> {
    lambda_gateway_local::logging::init();
    lambda_gateway_local::run(handler, "localhost:8080").await
}
