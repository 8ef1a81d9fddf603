//! Event synthesis: inbound HTTP request -> `(GatewayEvent, InvocationContext)`.
//!
//! Synthesis never fails. Anything hyper could parse becomes a well-formed
//! event; lossy UTF-8 decoding covers paths and header values that are not
//! valid text.

use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Local};
use http::header::{COOKIE, CONTENT_TYPE, HOST, USER_AGENT};
use http::request::Parts;
use percent_encoding::percent_decode_str;
use uuid::Uuid;

use crate::body::Body;
use crate::config::Config;
use crate::context::InvocationContext;
use crate::event::{
    Authentication, ClientCert, GatewayEvent, HttpDescription, RequestContext, PAYLOAD_VERSION,
    PROTOCOL,
};
use crate::headers::{Headers, QueryParameters};

/// Common Log Format timestamp, as API Gateway writes `requestContext.time`.
const CLF_TIME_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Build the event and context for one request, stamped with the current time.
pub fn synthesize(
    config: &Config,
    parts: &Parts,
    body: &[u8],
    peer: SocketAddr,
) -> (GatewayEvent, InvocationContext) {
    synthesize_at(config, parts, body, peer, Local::now())
}

/// Like [`synthesize`], with the receipt instant supplied by the caller.
pub fn synthesize_at(
    config: &Config,
    parts: &Parts,
    body: &[u8],
    peer: SocketAddr,
    received_at: DateTime<Local>,
) -> (GatewayEvent, InvocationContext) {
    let headers = Headers::from_header_map(&parts.headers);
    let raw_path = percent_decode_str(parts.uri.path())
        .decode_utf8_lossy()
        .into_owned();
    let raw_query_string = parts.uri.query().unwrap_or_default().to_string();
    let query_string_parameters = QueryParameters::parse(&raw_query_string);

    let user_agent = headers.get(USER_AGENT.as_str()).unwrap_or_default().to_string();
    let domain_name = headers
        .get(HOST.as_str())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|authority| authority.to_string()))
        .unwrap_or_else(|| config.domain_name.clone());
    let domain_prefix = domain_prefix(&domain_name);

    let cookies = headers
        .get(COOKIE.as_str())
        .map(split_cookies)
        .unwrap_or_default();

    let (body, is_base64_encoded) =
        match Body::from_request(body, headers.get(CONTENT_TYPE.as_str()), config.binary_policy) {
            Some(body) => {
                let (body, is_base64_encoded) = body.into_wire();
                (Some(body), is_base64_encoded)
            }
            None => (None, false),
        };

    let time_epoch = received_at.timestamp_millis();
    let request_context = RequestContext {
        route_key: config.route_key.clone(),
        account_id: config.account_id.clone(),
        stage: config.stage.clone(),
        request_id: Uuid::new_v4().to_string(),
        api_id: config.api_id.clone(),
        domain_name,
        domain_prefix,
        time: received_at.format(CLF_TIME_FORMAT).to_string(),
        time_epoch,
        http: HttpDescription {
            method: parts.method.as_str().to_string(),
            path: raw_path.clone(),
            protocol: PROTOCOL.to_string(),
            source_ip: peer.ip().to_string(),
            user_agent,
        },
        authentication: Authentication {
            client_cert: ClientCert::default(),
        },
    };

    let event = GatewayEvent {
        version: PAYLOAD_VERSION.to_string(),
        route_key: config.route_key.clone(),
        raw_path,
        raw_query_string,
        cookies,
        headers,
        query_string_parameters,
        request_context,
        body,
        is_base64_encoded,
    };

    let started_at_ms = u64::try_from(time_epoch).unwrap_or_default();
    let context = InvocationContext::new(config, Uuid::new_v4().to_string(), started_at_ms);

    (event, context)
}

/// First DNS label of the host, port stripped. IP literals are kept whole.
fn domain_prefix(domain_name: &str) -> String {
    let host = match domain_name.rsplit_once(':') {
        Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
        _ => domain_name,
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }
    host.split('.').next().unwrap_or_default().to_string()
}

fn split_cookies(header: &str) -> Vec<String> {
    header
        .split(';')
        .flat_map(|part| part.split(", "))
        .map(str::trim)
        .filter(|cookie| !cookie.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BinaryPolicy;
    use chrono::TimeZone;
    use http::Request;
    use serde_json::json;

    fn parts(builder: http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    fn peer() -> SocketAddr {
        "192.0.2.10:54321".parse().unwrap()
    }

    #[test]
    fn get_with_query_string() {
        let parts = parts(
            Request::get("/foo/bar?testkey=testvalue")
                .header("host", "localhost:8080")
                .header("accept", "*/*")
                .header("user-agent", "curl/8.0"),
        );
        let (event, context) = synthesize(&Config::default(), &parts, b"", peer());

        assert_eq!(event.version, "2.0");
        assert_eq!(event.route_key, "$default");
        assert_eq!(event.raw_path, "/foo/bar");
        assert_eq!(event.raw_query_string, "testkey=testvalue");
        assert_eq!(event.query_string_parameters.get("testkey"), Some("testvalue"));
        assert_eq!(event.headers.get("Accept"), Some("*/*"));
        assert_eq!(event.body, None);
        assert!(!event.is_base64_encoded);

        let ctx = &event.request_context;
        assert_eq!(ctx.route_key, "$default");
        assert_eq!(ctx.stage, "$default");
        assert_eq!(ctx.domain_name, "localhost:8080");
        assert_eq!(ctx.domain_prefix, "localhost");
        assert_eq!(ctx.http.method, "GET");
        assert_eq!(ctx.http.path, "/foo/bar");
        assert_eq!(ctx.http.protocol, "HTTP/1.1");
        assert_eq!(ctx.http.source_ip, "192.0.2.10");
        assert_eq!(ctx.http.user_agent, "curl/8.0");

        assert_eq!(context.function_name, "test_function");
        assert!(context.callback_waits_for_empty_event_loop);
        assert_ne!(context.aws_request_id, ctx.request_id);
    }

    #[test]
    fn empty_query_string_omits_parameters() {
        let parts = parts(Request::get("/"));
        let (event, _) = synthesize(&Config::default(), &parts, b"", peer());
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["rawQueryString"], json!(""));
        assert!(value.get("queryStringParameters").is_none());
        assert!(value.get("body").is_none());
    }

    #[test]
    fn post_json_body_is_passed_through() {
        let parts = parts(
            Request::post("/foo/bar")
                .header("content-type", "application/json")
                .header("content-length", "23"),
        );
        let body = br#"{"jsonkey":"jsonvalue"}"#;
        let (event, _) = synthesize(&Config::default(), &parts, body, peer());

        assert_eq!(event.body.as_deref(), Some(r#"{"jsonkey":"jsonvalue"}"#));
        assert!(!event.is_base64_encoded);
        assert_eq!(event.raw_query_string, "");
        assert_eq!(event.headers.get("Content-Length"), Some("23"));
        assert_eq!(event.headers.get("Content-Type"), Some("application/json"));
    }

    #[test]
    fn binary_body_is_base64_encoded() {
        let parts = parts(Request::put("/upload").header("content-type", "application/octet-stream"));
        let (event, _) = synthesize(&Config::default(), &parts, &[0, 159, 146, 150], peer());

        assert_eq!(event.body.as_deref(), Some("AJ+Slg=="));
        assert!(event.is_base64_encoded);
    }

    #[test]
    fn always_binary_policy_applies_to_text() {
        let config = Config {
            binary_policy: BinaryPolicy::Always,
            ..Config::default()
        };
        let parts = parts(Request::post("/").header("content-type", "text/plain"));
        let (event, _) = synthesize(&config, &parts, b"hello", peer());

        assert_eq!(event.body.as_deref(), Some("aGVsbG8="));
        assert!(event.is_base64_encoded);
    }

    #[test]
    fn path_is_percent_decoded() {
        let parts = parts(Request::get("/files/a%20b/%C3%A9?x=%20"));
        let (event, _) = synthesize(&Config::default(), &parts, b"", peer());

        assert_eq!(event.raw_path, "/files/a b/é");
        assert_eq!(event.request_context.http.path, "/files/a b/é");
        assert_eq!(event.raw_query_string, "x=%20");
        assert_eq!(event.query_string_parameters.get("x"), Some(" "));
    }

    #[test]
    fn time_and_epoch_describe_the_same_instant() {
        let received_at = Local.timestamp_millis_opt(1_583_348_638_390).unwrap();
        let parts = parts(Request::get("/"));
        let (event, context) =
            synthesize_at(&Config::default(), &parts, b"", peer(), received_at);

        assert_eq!(event.request_context.time_epoch, 1_583_348_638_390);
        assert_eq!(
            event.request_context.time,
            received_at.format("%d/%b/%Y:%H:%M:%S %z").to_string()
        );
        let parsed = DateTime::parse_from_str(&event.request_context.time, CLF_TIME_FORMAT).unwrap();
        assert_eq!(parsed.timestamp(), 1_583_348_638);
        assert_eq!(context.deadline_ms, None);
    }

    #[test]
    fn identifiers_are_fresh_per_request() {
        let parts = parts(Request::get("/"));
        let (first, first_ctx) = synthesize(&Config::default(), &parts, b"", peer());
        let (second, second_ctx) = synthesize(&Config::default(), &parts, b"", peer());

        assert!(Uuid::parse_str(&first.request_context.request_id).is_ok());
        assert!(Uuid::parse_str(&first_ctx.aws_request_id).is_ok());
        assert_ne!(first.request_context.request_id, second.request_context.request_id);
        assert_ne!(first_ctx.aws_request_id, second_ctx.aws_request_id);
    }

    #[test]
    fn missing_host_falls_back_to_configured_domain() {
        let parts = parts(Request::get("/"));
        let (event, _) = synthesize(&Config::default(), &parts, b"", peer());
        assert_eq!(event.request_context.domain_name, "localhost");
        assert_eq!(event.request_context.http.user_agent, "");
    }

    #[test]
    fn cookies_are_split_but_header_is_kept() {
        let parts = parts(Request::get("/").header("cookie", "a=1; b=2"));
        let (event, _) = synthesize(&Config::default(), &parts, b"", peer());
        assert_eq!(event.cookies, vec!["a=1".to_string(), "b=2".to_string()]);
        assert_eq!(event.headers.get("Cookie"), Some("a=1; b=2"));
    }

    #[test]
    fn domain_prefixes() {
        assert_eq!(domain_prefix("abc.execute-api.us-east-1.amazonaws.com"), "abc");
        assert_eq!(domain_prefix("localhost:8080"), "localhost");
        assert_eq!(domain_prefix("127.0.0.1:8080"), "127.0.0.1");
        assert_eq!(domain_prefix("[::1]:8080"), "::1");
    }
}
