//! Response translation: `HandlerResult` -> HTTP response.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, SET_COOKIE};
use http::{HeaderName, HeaderValue, Response, StatusCode};
use tracing::error;

use crate::body::Body;
use crate::config::Config;
use crate::error::{InvocationError, TranslateError};
use crate::result::HandlerResult;

const OCTET_STREAM: &str = "application/octet-stream";

/// Turn a handler result into a response, failing closed on anything that
/// cannot be written as HTTP.
pub fn translate(config: &Config, result: HandlerResult) -> Result<Response<Bytes>, TranslateError> {
    let code = result.status_code.unwrap_or(200);
    let status = u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(TranslateError::InvalidStatus(code))?;

    let body = match result.body {
        Some(body) => Some(Body::from_wire(body, result.is_base64_encoded)?),
        None => None,
    };

    let mut response = Response::new(Bytes::new());
    *response.status_mut() = status;

    let headers = response.headers_mut();
    for (name, value) in &result.headers {
        let invalid = || TranslateError::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        // Names differing only in case collapse to one header; the later key in sort order wins.
        headers.insert(header_name, header_value);
    }
    for cookie in &result.cookies {
        let value = HeaderValue::from_str(cookie).map_err(|_| TranslateError::InvalidHeader {
            name: SET_COOKIE.to_string(),
        })?;
        headers.append(SET_COOKIE, value);
    }

    if !headers.contains_key(CONTENT_TYPE) {
        let default = if result.is_base64_encoded {
            OCTET_STREAM
        } else {
            config.default_content_type.as_str()
        };
        let value = HeaderValue::from_str(default).map_err(|_| TranslateError::InvalidHeader {
            name: CONTENT_TYPE.to_string(),
        })?;
        headers.insert(CONTENT_TYPE, value);
    }

    if let Some(body) = body {
        *response.body_mut() = Bytes::from(body.into_bytes());
    }
    Ok(response)
}

/// The opaque response sent for a failed invocation.
pub fn error_response(err: &InvocationError) -> Response<Bytes> {
    let (status, body) = match err {
        InvocationError::Timeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            Bytes::from_static(br#"{"message":"Gateway Timeout"}"#),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Bytes::from_static(br#"{"message":"Internal Server Error"}"#),
        ),
    };
    plain_response(status, body)
}

/// Translate the outcome of an invocation. Never fails; detail about a failure
/// goes to the log only.
pub fn respond(config: &Config, outcome: Result<HandlerResult, InvocationError>) -> Response<Bytes> {
    let err = match outcome {
        Ok(result) => match translate(config, result) {
            Ok(response) => return response,
            Err(err) => InvocationError::from(err),
        },
        Err(err) => err,
    };
    error!(error = %err, "invocation failed");
    error_response(&err)
}

/// A JSON-bodied response the harness itself produces.
pub(crate) fn plain_response(status: StatusCode, body: Bytes) -> Response<Bytes> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
