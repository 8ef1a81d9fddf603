//! Running the same handler inside AWS Lambda.

use std::sync::Arc;

use lambda_http::lambda_runtime::{service_fn, Context, LambdaEvent};

use crate::context::InvocationContext;
use crate::error::{Error, Result};
use crate::event::GatewayEvent;
use crate::handler::Handler;

/// Whether the process was started by the Lambda service.
pub fn is_lambda() -> bool {
    std::env::var_os("AWS_LAMBDA_RUNTIME_API").is_some()
}

/// Receive events through the [AWS Lambda Runtime Interface][lambda-interface]
/// until the runtime shuts the process down.
///
/// The gateway in front of the function does the HTTP translation, so the
/// handler's [`HandlerResult`](crate::HandlerResult) is returned unchanged.
///
/// [lambda-interface]: https://docs.aws.amazon.com/lambda/latest/dg/runtimes-api.html
pub async fn run_on_lambda(handler: Arc<dyn Handler>) -> Result<()> {
    lambda_http::lambda_runtime::run(service_fn(move |event: LambdaEvent<GatewayEvent>| {
        let handler = Arc::clone(&handler);
        async move {
            let (payload, context) = event.into_parts();
            handler.call(payload, invocation_context(&context)).await
        }
    }))
    .await
    .map_err(|e| Error::Runtime(e.to_string()))
}

/// Map the runtime's context onto the one handlers see locally.
pub fn invocation_context(context: &Context) -> InvocationContext {
    let env = &context.env_config;
    InvocationContext {
        callback_waits_for_empty_event_loop: true,
        function_version: env.version.clone(),
        function_name: env.function_name.clone(),
        memory_limit_in_mb: env.memory.to_string(),
        log_group_name: env.log_group.clone(),
        log_stream_name: env.log_stream.clone(),
        invoked_function_arn: context.invoked_function_arn.clone(),
        aws_request_id: context.request_id.clone(),
        deadline_ms: Some(context.deadline),
    }
}
