//! The gateway event handed to a handler (HTTP API payload format 2.0).

use serde::{Deserialize, Deserializer, Serialize};

use crate::body::Body;
use crate::headers::{Headers, QueryParameters};

/// The only payload format this harness produces.
pub const PAYLOAD_VERSION: &str = "2.0";

/// The protocol string reported in `requestContext.http.protocol`.
pub const PROTOCOL: &str = "HTTP/1.1";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewayEvent {
    pub version: String,
    pub route_key: String,
    pub raw_path: String,
    pub raw_query_string: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    pub headers: Headers,
    #[serde(skip_serializing_if = "QueryParameters::is_empty")]
    pub query_string_parameters: QueryParameters,
    pub request_context: RequestContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub is_base64_encoded: bool,
}

impl GatewayEvent {
    /// The request body with base64 already undone, if there was one.
    pub fn payload(&self) -> Result<Option<Body>, base64::DecodeError> {
        self.body
            .clone()
            .map(|body| Body::from_wire(body, self.is_base64_encoded))
            .transpose()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestContext {
    pub route_key: String,
    pub account_id: String,
    pub stage: String,
    pub request_id: String,
    pub api_id: String,
    pub domain_name: String,
    pub domain_prefix: String,
    /// `dd/Mon/yyyy:HH:mm:ss +ZZZZ`
    pub time: String,
    pub time_epoch: i64,
    pub http: HttpDescription,
    #[serde(deserialize_with = "null_as_default")]
    pub authentication: Authentication,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpDescription {
    pub method: String,
    pub path: String,
    pub protocol: String,
    pub source_ip: String,
    pub user_agent: String,
}

/// Always serialized, even without TLS, so handlers can rely on the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Authentication {
    #[serde(deserialize_with = "null_as_default")]
    pub client_cert: ClientCert,
}

/// Mutual-TLS client certificate details. Empty when the connection had none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientCert {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_cert_pem: Option<String>,
    #[serde(rename = "subjectDN", skip_serializing_if = "Option::is_none")]
    pub subject_dn: Option<String>,
    #[serde(rename = "issuerDN", skip_serializing_if = "Option::is_none")]
    pub issuer_dn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity: Option<CertValidity>,
}

impl ClientCert {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CertValidity {
    pub not_before: String,
    pub not_after: String,
}

/// Function URLs send `null` where API Gateway omits the key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
