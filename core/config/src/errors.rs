// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Errors for connection and TLS configuration.
/// Configuration errors fail fast, before any network activity.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing endpoint")]
    MissingEndpoint,
    #[error("invalid endpoint scheme: {0}")]
    InvalidEndpointScheme(String),
    #[error("unix endpoint is missing a socket path")]
    UnixSocketMissingPath,
    #[error("invalid unix socket path: {0}")]
    UnixSocketInvalidPath(http::Error),
    #[error("URI parse error: {0}")]
    UriParse(#[from] http::uri::InvalidUri),
    #[error("endpoint is missing an authority")]
    MissingAuthority,
    #[error("invalid server name: {0}")]
    InvalidServerName(String),
    #[error("invalid pem format: {0}")]
    InvalidPem(#[from] rustls_pki_types::pem::Error),
    #[error("root store error: {0}")]
    RootStore(rustls::Error),
    #[error("client auth error: {0}")]
    ClientAuth(rustls::Error),
    #[error("client cert and key must be supplied together")]
    MissingClientCertOrKey,
}
