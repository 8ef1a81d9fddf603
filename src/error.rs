//! Error types.
//!
//! Only [`Error`] ever escapes to the embedding binary. [`InvocationError`] and
//! [`TranslateError`] are always turned into an HTTP response by the translator.

use std::time::Duration;

use thiserror::Error;

/// Result type for harness-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type handlers may return; identical to `lambda_runtime::Error`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Harness-level failures: configuration, sockets and the deployed runtime.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("lambda runtime error: {0}")]
    Runtime(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// A handler invocation that did not produce a usable result.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Fault(HandlerError),

    /// The handler task panicked or was torn down by the runtime.
    #[error("handler panicked")]
    Panicked,

    /// The handler did not finish before the configured deadline.
    #[error("handler timed out after {0:?}")]
    Timeout(Duration),

    /// The handler finished but its result cannot be written as a response.
    #[error("invalid handler result: {0}")]
    InvalidResult(#[from] TranslateError),
}

impl InvocationError {
    pub fn fault(err: impl Into<HandlerError>) -> Self {
        Self::Fault(err.into())
    }
}

/// Ways a [`HandlerResult`](crate::HandlerResult) can fail to become a response.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("status code {0} is not a valid HTTP status")]
    InvalidStatus(i64),

    #[error("header {name:?} has an invalid name or value")]
    InvalidHeader { name: String },

    #[error("body is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}
