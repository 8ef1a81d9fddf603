//! Key/value containers for event headers and query parameters.
//!
//! Both serialize as plain JSON objects with sorted keys.
//!
//! * [`Headers`] stores names in canonical MIME casing (`content-type` becomes
//!   `Content-Type`), joins repeated header lines with `", "` and looks names up
//!   case-insensitively.
//! * [`QueryParameters`] stores form-decoded pairs; when a key repeats, the last
//!   value wins.

use std::collections::btree_map::{self, BTreeMap};

use http::HeaderMap;
use serde::{Deserialize, Serialize};

/// Request headers as they appear in a gateway event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every header, joining repeated lines in arrival order.
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for (name, value) in map {
            headers.append(name.as_str(), &String::from_utf8_lossy(value.as_bytes()));
        }
        headers
    }

    /// Add a value, joining it onto any existing value for the same name.
    pub fn append(&mut self, name: &str, value: &str) {
        let name = canonical_name(name);
        match self.0.entry(name) {
            btree_map::Entry::Vacant(entry) => {
                entry.insert(value.to_string());
            }
            btree_map::Entry::Occupied(mut entry) => {
                let joined = entry.get_mut();
                joined.push_str(", ");
                joined.push_str(value);
            }
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .get(&canonical_name(name))
            .or_else(|| {
                self.0
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Decoded query string parameters, last value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParameters(BTreeMap<String, String>);

impl QueryParameters {
    /// Parse a raw (still encoded) query string.
    pub fn parse(raw: &str) -> Self {
        let pairs = form_urlencoded::parse(raw.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self(pairs)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `x-forwarded-for` -> `X-Forwarded-For`.
pub fn canonical_name(name: &str) -> String {
    let mut canonical = String::with_capacity(name.len());
    let mut upper = true;
    for ch in name.chars() {
        if upper {
            canonical.push(ch.to_ascii_uppercase());
        } else {
            canonical.push(ch.to_ascii_lowercase());
        }
        upper = ch == '-';
    }
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn canonicalizes_names() {
        assert_eq!(canonical_name("content-type"), "Content-Type");
        assert_eq!(canonical_name("X-CUSTOM-HEADER"), "X-Custom-Header");
        assert_eq!(canonical_name("accept"), "Accept");
    }

    #[test]
    fn repeated_lines_are_joined() {
        let mut map = HeaderMap::new();
        map.append("accept", HeaderValue::from_static("text/html"));
        map.append("accept", HeaderValue::from_static("application/json"));
        map.insert("user-agent", HeaderValue::from_static("curl/8.0"));

        let headers = Headers::from_header_map(&map);
        assert_eq!(headers.get("Accept"), Some("text/html, application/json"));
        assert_eq!(headers.get("USER-AGENT"), Some("curl/8.0"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn lookup_is_case_insensitive_for_deserialized_names() {
        let headers: Headers =
            serde_json::from_value(serde_json::json!({ "content-type": "text/plain" })).unwrap();
        assert_eq!(headers.get("Content-Type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn serializes_as_object() {
        let mut headers = Headers::new();
        headers.append("custom-header", "HeaderValue");
        assert_eq!(
            serde_json::to_value(&headers).unwrap(),
            serde_json::json!({ "Custom-Header": "HeaderValue" })
        );
    }

    #[test]
    fn query_last_value_wins() {
        let query = QueryParameters::parse("a=1&b=2&a=3");
        assert_eq!(query.get("a"), Some("3"));
        assert_eq!(query.get("b"), Some("2"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn query_values_are_decoded() {
        let query = QueryParameters::parse("name=J%C3%BCrgen+Smith&flag");
        assert_eq!(query.get("name"), Some("Jürgen Smith"));
        assert_eq!(query.get("flag"), Some(""));
    }

    #[test]
    fn empty_query_has_no_parameters() {
        assert!(QueryParameters::parse("").is_empty());
        assert!(QueryParameters::parse("&&=orphan").is_empty());
    }
}
