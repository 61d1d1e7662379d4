// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;
use std::time::Duration;

use duration_string::DurationString;
use http::Uri;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::component::Configuration;
use crate::errors::ConfigError;
use crate::tls::TlsClientConfig;

/// Synthetic authority substituted for unix endpoints. The HTTP machinery
/// requires a hostname where none exists; this one is never resolved.
pub const UNIX_PLACEHOLDER_AUTHORITY: &str = "localhost";

/// Connection descriptor for one engine daemon.
///
/// The endpoint selects the transport variant: `unix://<path>` for a
/// filesystem-path socket, `http://host:port` for plain TCP, and
/// `https://host:port` for TCP under (mutual) TLS. Every timeout has an
/// explicit finite default; unset never means infinite and never means zero.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct ConnectionConfig {
    /// The daemon endpoint the client will connect to.
    pub endpoint: String,

    /// Timeout for establishing the connection. Default: 10s.
    #[serde(default = "default_connect_timeout")]
    #[schemars(with = "String")]
    pub connect_timeout: DurationString,

    /// Inactivity timeout for reads on an established channel. Default: 5m.
    /// Raise this for long-lived event streams.
    #[serde(default = "default_read_timeout")]
    #[schemars(with = "String")]
    pub read_timeout: DurationString,

    /// Inactivity timeout for writes on an established channel. Default: 5m.
    #[serde(default = "default_write_timeout")]
    #[schemars(with = "String")]
    pub write_timeout: DurationString,

    /// Overall budget for one exchange, up to response headers (and the full
    /// body in buffered mode). Default: 10m.
    #[serde(default = "default_call_timeout")]
    #[schemars(with = "String")]
    pub call_timeout: DurationString,

    /// TLS client configuration, only honored for `https` endpoints.
    #[serde(default, rename = "tls")]
    pub tls_setting: TlsClientConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            endpoint: String::new(),
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            write_timeout: default_write_timeout(),
            call_timeout: default_call_timeout(),
            tls_setting: TlsClientConfig::default(),
        }
    }
}

fn default_connect_timeout() -> DurationString {
    Duration::from_secs(10).into()
}

fn default_read_timeout() -> DurationString {
    Duration::from_secs(300).into()
}

fn default_write_timeout() -> DurationString {
    Duration::from_secs(300).into()
}

fn default_call_timeout() -> DurationString {
    Duration::from_secs(600).into()
}

impl Configuration for ConnectionConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        let uri = self.parse_endpoint_uri()?;
        if uri.scheme_str() != Some("https") && self.tls_setting.is_configured() {
            tracing::warn!(
                endpoint = %self.endpoint,
                "TLS material configured for a non-https endpoint; it will be ignored"
            );
        }
        self.tls_setting.validate()?;
        Ok(())
    }
}

impl ConnectionConfig {
    /// Creates a new connection configuration with the given endpoint and all
    /// other fields set to default.
    pub fn with_endpoint(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            ..Self::default()
        }
    }

    pub fn with_connect_timeout(self, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout: connect_timeout.into(),
            ..self
        }
    }

    pub fn with_read_timeout(self, read_timeout: Duration) -> Self {
        Self {
            read_timeout: read_timeout.into(),
            ..self
        }
    }

    pub fn with_write_timeout(self, write_timeout: Duration) -> Self {
        Self {
            write_timeout: write_timeout.into(),
            ..self
        }
    }

    pub fn with_call_timeout(self, call_timeout: Duration) -> Self {
        Self {
            call_timeout: call_timeout.into(),
            ..self
        }
    }

    pub fn with_tls_setting(self, tls_setting: TlsClientConfig) -> Self {
        Self {
            tls_setting,
            ..self
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout.clone().into()
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout.clone().into()
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout.clone().into()
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout.clone().into()
    }

    /// Parses the endpoint string into a URI.
    ///
    /// A unix endpoint has no authority and the Uri parser refuses one
    /// without it, so we build our own URI carrying the socket path and a
    /// placeholder authority that is never resolved.
    pub fn parse_endpoint_uri(&self) -> Result<Uri, ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        if let Some(path) = self.endpoint.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(ConfigError::UnixSocketMissingPath);
            }

            let uri = Uri::builder()
                .scheme("unix")
                .authority(UNIX_PLACEHOLDER_AUTHORITY)
                .path_and_query(path)
                .build()
                .map_err(ConfigError::UnixSocketInvalidPath)?;
            return Ok(uri);
        }

        let uri = Uri::from_str(&self.endpoint)?;
        match uri.scheme_str() {
            Some("http") | Some("https") => Ok(uri),
            other => Err(ConfigError::InvalidEndpointScheme(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}
