//! Per-invocation metadata passed alongside the event.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationContext {
    pub callback_waits_for_empty_event_loop: bool,
    pub function_version: String,
    pub function_name: String,
    #[serde(rename = "memoryLimitInMB")]
    pub memory_limit_in_mb: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    pub invoked_function_arn: String,
    pub aws_request_id: String,
    /// Epoch milliseconds by which the invocation has to finish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
}

impl InvocationContext {
    /// Build a context for a fresh invocation started at `started_at_ms`.
    pub fn new(config: &Config, aws_request_id: String, started_at_ms: u64) -> Self {
        let deadline_ms = config.invocation_timeout.map(|timeout| {
            started_at_ms.saturating_add(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
        });
        Self {
            callback_waits_for_empty_event_loop: true,
            function_version: config.function_version.clone(),
            function_name: config.function_name.clone(),
            memory_limit_in_mb: config.memory_limit_mb.clone(),
            log_group_name: config.log_group_name.clone(),
            log_stream_name: config.log_stream_name.clone(),
            invoked_function_arn: config.function_arn(),
            aws_request_id,
            deadline_ms,
        }
    }

    /// Time left before the deadline; `None` when the invocation is unbounded.
    pub fn remaining_time(&self) -> Option<Duration> {
        let deadline = UNIX_EPOCH + Duration::from_millis(self.deadline_ms?);
        Some(
            deadline
                .duration_since(SystemTime::now())
                .unwrap_or(Duration::ZERO),
        )
    }
}
