// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Request resolution and exchange execution.
//!
//! Resolution is a pure step: an endpoint's shape plus the partitioned
//! parameters yield a [`ResolvedRequest`] with the versioned target, headers
//! and body decided. Execution then opens a fresh channel, drives one HTTP/1
//! exchange over it, and classifies the response per the requested mode.

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use http::header::{CONNECTION, CONTENT_TYPE, HOST, UPGRADE};
use http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper_util::rt::TokioIo;
use tokio::time::Instant;

use vessel_spec::{Endpoint, Method};

use crate::errors::ClientError;
use crate::params::RequestParams;
use crate::response::{ByteStream, Data, DuplexSocket, ResponseHandle};
use crate::transport::{Timeouts, Transport};

/// Wire body type shared by all request shapes. Unsync because streamed
/// payloads are plain boxed streams.
pub(crate) type OutBody = UnsyncBoxBody<Bytes, io::Error>;

/// Raw request payload, used where the wire format is not JSON (archive
/// uploads, build contexts).
pub enum Payload {
    /// The whole payload, already in memory.
    Full(Bytes),
    /// Payload chunks produced on demand; forwarded unbuffered.
    Stream(Pin<Box<dyn Stream<Item = Result<Bytes, io::Error>> + Send + 'static>>),
}

impl std::fmt::Debug for Payload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Payload::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Payload::Stream(_) => f.debug_tuple("Stream").finish(),
        }
    }
}

/// How the caller wants the response surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseMode {
    #[default]
    Data,
    Stream,
    Socket,
}

/// Request body selected during resolution.
#[derive(Debug)]
pub(crate) enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Payload { payload: Payload, content_type: String },
}

/// Everything needed to put one request on the wire, decided before any
/// network activity.
#[derive(Debug)]
pub(crate) struct ResolvedRequest {
    pub method: http::Method,
    /// Origin-form target: `/{version}{substituted path}?{query}`.
    pub target: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

/// Resolves an endpoint plus partitioned parameters into a request.
///
/// Path slots are substituted by name; query pairs keep their partition
/// order. When the body bucket holds exactly one entry its value becomes the
/// JSON document itself, so a single declared `body` parameter is sent
/// unwrapped; multiple body entries are sent as one object keyed by
/// declaration name. A raw payload, when present, takes the body's place.
pub(crate) fn resolve_request(
    version: &str,
    endpoint: &Endpoint,
    params: &RequestParams,
    payload: Option<Payload>,
    payload_content_type: Option<String>,
) -> Result<ResolvedRequest, ClientError> {
    let mut path = format!("/{}{}", version, endpoint.path);
    for (name, value) in &params.path {
        path = path.replace(&format!("{{{}}}", name), value);
    }

    let mut target = path;
    if !params.query.is_empty() {
        let query: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        target.push('?');
        target.push_str(&query);
    }

    let mut headers = HeaderMap::new();
    for (name, value) in &params.header {
        headers.insert(
            name.parse::<HeaderName>()?,
            HeaderValue::from_str(value)?,
        );
    }

    let body = match payload {
        Some(payload) => RequestBody::Payload {
            payload,
            content_type: payload_content_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        },
        None => {
            let mut entries = params.body.clone().into_iter();
            match (entries.next(), entries.next()) {
                (None, _) => RequestBody::Empty,
                // a single body declaration is the document itself
                (Some((_, value)), None) => RequestBody::Json(value),
                _ => RequestBody::Json(serde_json::Value::Object(params.body.clone())),
            }
        }
    };

    Ok(ResolvedRequest {
        method: http_method(endpoint.method),
        target,
        headers,
        body,
    })
}

fn http_method(method: Method) -> http::Method {
    match method {
        Method::Get => http::Method::GET,
        Method::Post => http::Method::POST,
        Method::Put => http::Method::PUT,
        Method::Delete => http::Method::DELETE,
        Method::Head => http::Method::HEAD,
    }
}

/// Executes one exchange over a fresh channel and classifies the response.
///
/// The call-timeout deadline covers everything up to response headers, and
/// the full body collection in data mode. Read/write inactivity on the
/// channel itself is bounded separately by the transport's timed stream.
pub(crate) async fn execute(
    transport: &Transport,
    timeouts: &Timeouts,
    resolved: ResolvedRequest,
    mode: ResponseMode,
    throw_exception: bool,
    throw_entire_message: bool,
) -> Result<ResponseHandle, ClientError> {
    let deadline = Instant::now() + timeouts.call;

    let channel = transport.connect(timeouts).await?;
    let io = TokioIo::new(channel);
    let (mut sender, conn) =
        hyper::client::conn::http1::handshake::<_, OutBody>(io).await?;

    // The driver must keep running for upgrades to complete, so it is
    // detached rather than joined with the exchange.
    tokio::spawn(async move {
        if let Err(err) = conn.with_upgrades().await {
            tracing::debug!(error = %err, "connection driver terminated");
        }
    });

    let mut builder = Request::builder()
        .method(resolved.method.clone())
        .uri(resolved.target.clone())
        .header(HOST, transport.authority());

    if mode == ResponseMode::Socket {
        builder = builder
            .header(CONNECTION, "Upgrade")
            .header(UPGRADE, "tcp");
    }

    let (content_type, body) = match resolved.body {
        RequestBody::Empty => (None, empty_body()),
        RequestBody::Json(value) => {
            let bytes = serde_json::to_vec(&value)?;
            (
                Some("application/json".to_string()),
                Full::new(Bytes::from(bytes))
                    .map_err(|never| match never {})
                    .boxed_unsync(),
            )
        }
        RequestBody::Payload {
            payload,
            content_type,
        } => (Some(content_type), payload_body(payload)),
    };
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }

    let mut request = builder.body(body)?;
    request.headers_mut().extend(resolved.headers);

    tracing::debug!(
        method = %request.method(),
        target = %resolved.target,
        ?mode,
        "dispatching request"
    );

    let response = within_deadline(deadline, sender.send_request(request)).await??;
    let status = response.status();

    if throw_exception && status.as_u16() >= 400 {
        let bytes = within_deadline(deadline, response.into_body().collect())
            .await??
            .to_bytes();
        return Err(ClientError::Response {
            status,
            message: summarize(status, &bytes, throw_entire_message),
        });
    }

    match mode {
        ResponseMode::Data => {
            let bytes = within_deadline(deadline, response.into_body().collect())
                .await??
                .to_bytes();
            Ok(ResponseHandle::Data(Data::decode(bytes)))
        }
        ResponseMode::Stream => Ok(ResponseHandle::Stream(ByteStream::new(
            response.into_body(),
        ))),
        ResponseMode::Socket => {
            if status != StatusCode::SWITCHING_PROTOCOLS {
                return Err(ClientError::UpgradeRefused(status));
            }
            let upgraded =
                within_deadline(deadline, hyper::upgrade::on(response)).await??;
            Ok(ResponseHandle::Socket(DuplexSocket::new(upgraded)))
        }
    }
}

fn empty_body() -> OutBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

fn payload_body(payload: Payload) -> OutBody {
    match payload {
        Payload::Full(bytes) => Full::new(bytes)
            .map_err(|never| match never {})
            .boxed_unsync(),
        Payload::Stream(stream) => {
            StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync()
        }
    }
}

async fn within_deadline<T>(
    deadline: Instant,
    fut: impl std::future::Future<Output = T>,
) -> Result<T, ClientError> {
    tokio::time::timeout_at(deadline, fut).await.map_err(|_| {
        ClientError::Transport(io::Error::new(
            io::ErrorKind::TimedOut,
            "call timed out before the exchange completed",
        ))
    })
}

/// Builds the error message for a >= 400 response. The summarized form
/// prefers the JSON `message` field the engine uses, falling back to the
/// body text, falling back to the status's canonical reason.
fn summarize(status: StatusCode, body: &[u8], entire: bool) -> String {
    let text = String::from_utf8_lossy(body);
    if entire {
        return text.into_owned();
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice(body) {
        if let Some(serde_json::Value::String(message)) = map.get("message") {
            return message.clone();
        }
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.canonical_reason().unwrap_or("unknown error").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vessel_spec::{ParamLocation, ParameterDeclaration};

    fn endpoint(method: Method, path: &str, params: &[(&str, ParamLocation)]) -> Endpoint {
        Endpoint {
            operation: "Test".to_string(),
            method,
            path: path.to_string(),
            description: None,
            params: params
                .iter()
                .map(|(name, location)| ParameterDeclaration {
                    name: name.to_string(),
                    location: *location,
                    description: None,
                })
                .collect(),
        }
    }

    fn parts() -> RequestParams {
        RequestParams::default()
    }

    #[test]
    fn test_resolve_substitutes_path_slots() {
        let ep = endpoint(
            Method::Get,
            "/containers/{id}/json",
            &[("id", ParamLocation::Path)],
        );
        let mut params = parts();
        params.path.insert("id".to_string(), "abc".to_string());

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        assert_eq!(resolved.method, http::Method::GET);
        assert_eq!(resolved.target, "/v1.41/containers/abc/json");
    }

    #[test]
    fn test_resolve_builds_query_string() {
        let ep = endpoint(Method::Get, "/containers/json", &[]);
        let mut params = parts();
        params
            .query
            .push(("all".to_string(), "true".to_string()));
        params.query.push((
            "filters".to_string(),
            r#"{"status":["running"]}"#.to_string(),
        ));

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        assert_eq!(
            resolved.target,
            "/v1.41/containers/json?all=true&filters=%7B%22status%22%3A%5B%22running%22%5D%7D"
        );
    }

    #[test]
    fn test_resolve_path_value_never_reaches_query() {
        let ep = endpoint(
            Method::Post,
            "/containers/{id}/start",
            &[("id", ParamLocation::Path)],
        );
        let mut params = parts();
        params.path.insert("id".to_string(), "abc".to_string());

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        assert!(!resolved.target.contains('?'));
        assert_eq!(resolved.target, "/v1.41/containers/abc/start");
    }

    #[test]
    fn test_resolve_single_body_entry_is_unwrapped() {
        let ep = endpoint(
            Method::Post,
            "/containers/create",
            &[("body", ParamLocation::Body)],
        );
        let mut params = parts();
        params.body.insert(
            "body".to_string(),
            json!({"Image": "busybox", "Cmd": "ls"}),
        );

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        match resolved.body {
            RequestBody::Json(value) => {
                assert_eq!(value, json!({"Image": "busybox", "Cmd": "ls"}))
            }
            _ => panic!("expected a json body"),
        }
    }

    #[test]
    fn test_resolve_multiple_body_entries_stay_keyed() {
        let ep = endpoint(
            Method::Post,
            "/networks/{id}/connect",
            &[
                ("container", ParamLocation::Body),
                ("endpointConfig", ParamLocation::Body),
            ],
        );
        let mut params = parts();
        params.body.insert("container".to_string(), json!("abc"));
        params
            .body
            .insert("endpointConfig".to_string(), json!({"Aliases": ["web"]}));

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        match resolved.body {
            RequestBody::Json(value) => assert_eq!(
                value,
                json!({"container": "abc", "endpointConfig": {"Aliases": ["web"]}})
            ),
            other => panic!("expected a json body, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_no_body_params_is_empty_body() {
        let ep = endpoint(Method::Post, "/containers/{id}/pause", &[(
            "id",
            ParamLocation::Path,
        )]);
        let mut params = parts();
        params.path.insert("id".to_string(), "abc".to_string());

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        assert!(matches!(resolved.body, RequestBody::Empty));
    }

    #[test]
    fn test_resolve_headers_parse() {
        let ep = endpoint(
            Method::Post,
            "/images/create",
            &[("X-Registry-Auth", ParamLocation::Header)],
        );
        let mut params = parts();
        params
            .header
            .insert("X-Registry-Auth".to_string(), "c2VjcmV0".to_string());

        let resolved = resolve_request("v1.41", &ep, &params, None, None).expect("resolve");
        assert_eq!(
            resolved.headers.get("X-Registry-Auth").map(|v| v.as_bytes()),
            Some(&b"c2VjcmV0"[..])
        );
    }

    #[test]
    fn test_resolve_invalid_header_value_fails() {
        let ep = endpoint(
            Method::Post,
            "/images/create",
            &[("X-Registry-Auth", ParamLocation::Header)],
        );
        let mut params = parts();
        params
            .header
            .insert("X-Registry-Auth".to_string(), "bad\nvalue".to_string());

        let err = resolve_request("v1.41", &ep, &params, None, None)
            .expect_err("header value with a newline");
        assert!(matches!(err, ClientError::HeaderValueParse(_)));
    }

    #[test]
    fn test_resolve_payload_takes_the_body_slot() {
        let ep = endpoint(Method::Post, "/build", &[]);
        let payload = Payload::Full(Bytes::from_static(b"tarball"));

        let resolved =
            resolve_request("v1.41", &ep, &parts(), Some(payload), None).expect("resolve");
        match resolved.body {
            RequestBody::Payload { content_type, .. } => {
                assert_eq!(content_type, "application/octet-stream")
            }
            _ => panic!("expected a payload body"),
        }
    }

    #[test]
    fn test_resolve_payload_content_type_override() {
        let ep = endpoint(Method::Post, "/build", &[]);
        let payload = Payload::Full(Bytes::from_static(b"tarball"));

        let resolved = resolve_request(
            "v1.41",
            &ep,
            &parts(),
            Some(payload),
            Some("application/x-tar".to_string()),
        )
        .expect("resolve");
        match resolved.body {
            RequestBody::Payload { content_type, .. } => {
                assert_eq!(content_type, "application/x-tar")
            }
            _ => panic!("expected a payload body"),
        }
    }

    #[test]
    fn test_summarize_prefers_engine_message_field() {
        let body = br#"{"message":"No such container: abc"}"#;
        assert_eq!(
            summarize(StatusCode::NOT_FOUND, body, false),
            "No such container: abc"
        );
    }

    #[test]
    fn test_summarize_entire_returns_full_body() {
        let body = br#"{"message":"No such container: abc"}"#;
        assert_eq!(
            summarize(StatusCode::NOT_FOUND, body, true),
            r#"{"message":"No such container: abc"}"#
        );
    }

    #[test]
    fn test_summarize_falls_back_to_body_text() {
        assert_eq!(
            summarize(StatusCode::INTERNAL_SERVER_ERROR, b"backend exploded\n", false),
            "backend exploded"
        );
    }

    #[test]
    fn test_summarize_falls_back_to_canonical_reason() {
        assert_eq!(summarize(StatusCode::NOT_FOUND, b"", false), "Not Found");
    }
}
