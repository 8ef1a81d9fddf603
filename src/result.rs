//! What a handler returns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::body::Body;

/// A handler's response in gateway wire format.
///
/// `statusCode` defaults to 200 and `isBase64Encoded` to `false`; every other
/// field is optional. Header names are written out exactly as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HandlerResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl HandlerResult {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code: Some(i64::from(status_code)),
            ..Self::default()
        }
    }

    /// A 200 response with a text body.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200).with_body(Body::Text(body.into()))
    }

    /// A 200 `application/json` response holding `value` serialized.
    pub fn json<T: Serialize>(value: &T) -> serde_json::Result<Self> {
        Ok(Self::new(200)
            .with_header("Content-Type", "application/json")
            .with_body(Body::Text(serde_json::to_string(value)?)))
    }

    /// A 200 response with raw bytes, sent base64-encoded.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(200).with_body(Body::Binary(bytes.into()))
    }

    #[must_use]
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(i64::from(status_code));
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookies.push(cookie.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        let (body, is_base64_encoded) = body.into().into_wire();
        self.body = Some(body);
        self.is_base64_encoded = is_base64_encoded;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let result: HandlerResult = serde_json::from_value(json!({ "body": "hi" })).unwrap();
        assert_eq!(result.status_code, None);
        assert!(!result.is_base64_encoded);
        assert_eq!(result.body.as_deref(), Some("hi"));
    }

    #[test]
    fn binary_builder_encodes_body() {
        let result = HandlerResult::binary(b"This is a test binary data".to_vec())
            .with_header("Content-Type", "application/octet-stream");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "statusCode": 200,
                "headers": { "Content-Type": "application/octet-stream" },
                "body": "VGhpcyBpcyBhIHRlc3QgYmluYXJ5IGRhdGE=",
                "isBase64Encoded": true,
            })
        );
    }

    #[test]
    fn json_builder_sets_content_type() {
        let result = HandlerResult::json(&json!({ "message": "Hello from Lambda!" })).unwrap();
        assert_eq!(result.header("content-type"), Some("application/json"));
        assert_eq!(result.body.as_deref(), Some(r#"{"message":"Hello from Lambda!"}"#));
        assert!(!result.is_base64_encoded);
    }

    #[test]
    fn wrongly_typed_fields_are_rejected() {
        let parsed = serde_json::from_value::<HandlerResult>(json!({ "statusCode": "ok" }));
        assert!(parsed.is_err());
    }
}
