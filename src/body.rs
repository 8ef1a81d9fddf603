//! Request and response payloads.
//!
//! The gateway wire format carries a body as a string plus an
//! `isBase64Encoded` flag. [`Body`] makes the two cases explicit so the
//! flag can never disagree with the contents.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::config::BinaryPolicy;

/// A payload that is either UTF-8 text or opaque bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    /// Pick the representation for an inbound request body.
    ///
    /// Returns `None` for an empty body. A body the policy considers text but
    /// which is not valid UTF-8 is still sent as binary.
    pub fn from_request(bytes: &[u8], content_type: Option<&str>, policy: BinaryPolicy) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        let textual = match policy {
            BinaryPolicy::Always => false,
            BinaryPolicy::ContentType => content_type.map_or(true, is_text_content),
        };
        if textual {
            if let Ok(text) = std::str::from_utf8(bytes) {
                return Some(Self::Text(text.to_string()));
            }
        }
        Some(Self::Binary(bytes.to_vec()))
    }

    /// Decode a wire-format body.
    pub fn from_wire(body: String, is_base64_encoded: bool) -> Result<Self, base64::DecodeError> {
        if is_base64_encoded {
            STANDARD.decode(body.as_bytes()).map(Self::Binary)
        } else {
            Ok(Self::Text(body))
        }
    }

    /// Encode into the wire format: the string and its `isBase64Encoded` flag.
    pub fn into_wire(self) -> (String, bool) {
        match self {
            Self::Text(text) => (text, false),
            Self::Binary(bytes) => (STANDARD.encode(bytes), true),
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Binary(bytes) => bytes,
        }
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Whether a content type is safe to pass through as text.
pub fn is_text_content(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    ["text", "json", "xml", "javascript", "x-www-form-urlencoded"]
        .iter()
        .any(|marker| content_type.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_body_is_absent() {
        assert_eq!(Body::from_request(b"", Some("text/plain"), BinaryPolicy::ContentType), None);
        assert_eq!(Body::from_request(b"", None, BinaryPolicy::Always), None);
    }

    #[test]
    fn textual_content_types_stay_text() {
        for content_type in [
            "application/json",
            "text/plain; charset=utf-8",
            "application/xml",
            "application/x-www-form-urlencoded",
            "Application/JSON",
        ] {
            let body = Body::from_request(b"{\"a\":1}", Some(content_type), BinaryPolicy::ContentType);
            assert_eq!(body, Some(Body::Text("{\"a\":1}".to_string())), "{content_type}");
        }
    }

    #[test]
    fn missing_content_type_is_text_when_utf8() {
        let body = Body::from_request(b"test body", None, BinaryPolicy::ContentType);
        assert_eq!(body, Some(Body::Text("test body".to_string())));
    }

    #[test]
    fn opaque_content_types_are_binary() {
        let body = Body::from_request(b"\x89PNG", Some("image/png"), BinaryPolicy::ContentType);
        assert_eq!(body, Some(Body::Binary(b"\x89PNG".to_vec())));
    }

    #[test]
    fn invalid_utf8_text_falls_back_to_binary() {
        let body = Body::from_request(&[0xff, 0xfe], Some("text/plain"), BinaryPolicy::ContentType);
        assert_eq!(body, Some(Body::Binary(vec![0xff, 0xfe])));
    }

    #[test]
    fn always_policy_encodes_text_too() {
        let body = Body::from_request(b"hello", Some("text/plain"), BinaryPolicy::Always).unwrap();
        assert_eq!(body.into_wire(), ("aGVsbG8=".to_string(), true));
    }

    #[test]
    fn wire_decoding_honours_flag() {
        let binary = Body::from_wire("VGhpcyBpcyBhIHRlc3QgYmluYXJ5IGRhdGE=".to_string(), true).unwrap();
        assert_eq!(binary.as_bytes(), b"This is a test binary data");

        let text = Body::from_wire("VGhpcw==".to_string(), false).unwrap();
        assert_eq!(text, Body::Text("VGhpcw==".to_string()));

        assert!(Body::from_wire("not base64!".to_string(), true).is_err());
    }
}
