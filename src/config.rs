//! Harness configuration.
//!
//! Loaded once at startup and shared read-only between requests. The defaults
//! mirror what the AWS Runtime Interface Emulator reports for an unconfigured
//! function, so events look the same whether a handler runs here or behind RIE.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lambda's synchronous invocation payload limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 6 * 1024 * 1024;

/// How request bodies are placed into the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BinaryPolicy {
    /// Textual content types travel as text, everything else as base64.
    #[default]
    ContentType,
    /// Every non-empty body is base64-encoded.
    Always,
}

impl FromStr for BinaryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content-type" | "auto" => Ok(Self::ContentType),
            "always" | "binary" => Ok(Self::Always),
            other => Err(Error::config(format!("unknown binary body policy {other:?}"))),
        }
    }
}

/// Read-only settings for the event synthesizer, translator and listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub function_name: String,
    pub function_version: String,
    pub memory_limit_mb: String,
    pub log_group_name: String,
    pub log_stream_name: String,
    pub region: String,
    pub account_id: String,
    /// Overrides the ARN otherwise built from region, account and function name.
    pub invoked_function_arn: Option<String>,
    pub route_key: String,
    pub stage: String,
    pub api_id: String,
    /// Used for `requestContext.domainName` when the request has no `Host` header.
    pub domain_name: String,
    pub binary_policy: BinaryPolicy,
    /// Content type for text responses whose handler did not set one.
    pub default_content_type: String,
    #[serde(with = "humantime_serde")]
    pub invocation_timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            function_name: "test_function".to_string(),
            function_version: "$LATEST".to_string(),
            memory_limit_mb: "3008".to_string(),
            log_group_name: "/aws/lambda/Functions".to_string(),
            log_stream_name: "$LATEST".to_string(),
            region: "us-east-1".to_string(),
            account_id: "012345678912".to_string(),
            invoked_function_arn: None,
            route_key: "$default".to_string(),
            stage: "$default".to_string(),
            api_id: "local".to_string(),
            domain_name: "localhost".to_string(),
            binary_policy: BinaryPolicy::ContentType,
            default_content_type: "application/json".to_string(),
            invocation_timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(addr) = var("LOCAL_LISTEN_ADDR") {
            config.listen_addr = parse("LOCAL_LISTEN_ADDR", &addr)?;
        }
        if let Some(name) = var("AWS_LAMBDA_FUNCTION_NAME") {
            config.function_name = name;
        }
        if let Some(version) = var("AWS_LAMBDA_FUNCTION_VERSION") {
            config.function_version = version;
        }
        if let Some(memory) = var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE") {
            let megabytes: u32 = parse("AWS_LAMBDA_FUNCTION_MEMORY_SIZE", &memory)?;
            config.memory_limit_mb = megabytes.to_string();
        }
        if let Some(group) = var("AWS_LAMBDA_LOG_GROUP_NAME") {
            config.log_group_name = group;
        }
        if let Some(stream) = var("AWS_LAMBDA_LOG_STREAM_NAME") {
            config.log_stream_name = stream;
        }
        if let Some(region) = var("AWS_REGION") {
            config.region = region;
        }
        if let Some(account) = var("LOCAL_ACCOUNT_ID") {
            config.account_id = account;
        }
        if let Some(arn) = var("LOCAL_FUNCTION_ARN") {
            config.invoked_function_arn = Some(arn);
        }
        if let Some(route_key) = var("LOCAL_ROUTE_KEY") {
            config.route_key = route_key;
        }
        if let Some(stage) = var("LOCAL_STAGE") {
            config.stage = stage;
        }
        if let Some(api_id) = var("LOCAL_API_ID") {
            config.api_id = api_id;
        }
        if let Some(domain) = var("LOCAL_DOMAIN_NAME") {
            config.domain_name = domain;
        }
        if let Some(policy) = var("LOCAL_BINARY_BODIES") {
            config.binary_policy = policy.parse()?;
        }
        if let Some(content_type) = var("LOCAL_DEFAULT_CONTENT_TYPE") {
            config.default_content_type = content_type;
        }
        if let Some(timeout) = var("LOCAL_TIMEOUT") {
            let timeout = humantime::parse_duration(timeout.trim())
                .map_err(|e| Error::config(format!("LOCAL_TIMEOUT={timeout:?}: {e}")))?;
            config.invocation_timeout = Some(timeout);
        }
        if let Some(limit) = var("LOCAL_MAX_BODY_BYTES") {
            config.max_body_bytes = parse("LOCAL_MAX_BODY_BYTES", &limit)?;
        }

        Ok(config)
    }

    /// The function ARN reported in every invocation context.
    pub fn function_arn(&self) -> String {
        self.invoked_function_arn.clone().unwrap_or_else(|| {
            format!(
                "arn:aws:lambda:{}:{}:function:{}",
                self.region, self.account_id, self.function_name
            )
        })
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| Error::config(format!("{key}={value:?}: {e}")))
}
