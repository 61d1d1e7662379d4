// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use vessel_config::errors::ConfigError;
use vessel_spec::errors::SpecError;

/// Errors for client construction and invocation.
///
/// Configuration and spec-lookup failures are raised before any network
/// activity. Transport failures (connect, timeout, TLS) carry the underlying
/// error verbatim. HTTP-level failures are opt-in: without
/// `throw_exception`, a >= 400 response flows through the normal response
/// mode path and no `Response` error is ever produced.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("a client requires a category before any invocation")]
    MissingCategory,
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("spec error: {0}")]
    Spec(#[from] SpecError),
    #[error("no operation {operation} under {category} in {version}")]
    UnknownOperation {
        category: String,
        operation: String,
        version: String,
    },
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] hyper::Error),
    #[error("request build error: {0}")]
    RequestBuild(#[from] http::Error),
    #[error("body encode error: {0}")]
    BodyEncode(#[from] serde_json::Error),
    #[error("header name parse error: {0}")]
    HeaderNameParse(#[from] http::header::InvalidHeaderName),
    #[error("header value parse error: {0}")]
    HeaderValueParse(#[from] http::header::InvalidHeaderValue),
    #[error("engine returned {status}: {message}")]
    Response {
        status: http::StatusCode,
        message: String,
    },
    #[error("server refused the connection upgrade with status {0}")]
    UpgradeRefused(http::StatusCode),
}
