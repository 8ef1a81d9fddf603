//! Expose a function running under the Lambda Runtime Interface Emulator as a
//! function URL.
//!
//! ```text
//! docker run -p 9000:8080 my-function-image
//! RIE_ENDPOINT=http://localhost:9000/2015-03-31/functions/function/invocations \
//!     cargo run --example rie_proxy
//! ```

use lambda_gateway_local::{logging, Config, LocalServer, RuntimeEmulator};

#[tokio::main]
async fn main() -> lambda_gateway_local::Result<()> {
    logging::init();

    let config = Config::from_env()?;
    let emulator = RuntimeEmulator::from_env()?;
    tracing::info!(endpoint = %emulator.endpoint(), "forwarding to runtime emulator");

    lambda_gateway_local::serve_until_ctrl_c(LocalServer::new(config, emulator)).await
}
