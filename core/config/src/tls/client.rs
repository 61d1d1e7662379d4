// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

use std::path::Path;

use rustls_pki_types::{CertificateDer, PrivateKeyDer, pem::PemObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::component::Configuration;
use crate::errors::ConfigError;
use crate::tls::provider::initialize_crypto_provider;
use crate::tls::root_store_builder::RootStoreBuilder;

/// TLS material for an https endpoint.
///
/// When a CA file is supplied, trust is restricted exclusively to that CA:
/// a server whose chain does not validate against it fails the handshake,
/// with no fallback to the system trust store. Client cert and key enable
/// mutual authentication and must be supplied together.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, JsonSchema)]
pub struct TlsClientConfig {
    /// Path to a PEM bundle of CA certificates. Setting this disables the
    /// system pool regardless of `include_system_ca_certs_pool`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_file: Option<String>,

    /// Path to the PEM client certificate presented for mutual TLS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<String>,

    /// Path to the PEM private key matching `cert_file`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,

    /// If true, load system root CA certificates when no CA file is given.
    #[serde(default = "default_include_system_ca_certs_pool")]
    pub include_system_ca_certs_pool: bool,
}

impl Default for TlsClientConfig {
    fn default() -> Self {
        TlsClientConfig {
            ca_file: None,
            cert_file: None,
            key_file: None,
            include_system_ca_certs_pool: default_include_system_ca_certs_pool(),
        }
    }
}

fn default_include_system_ca_certs_pool() -> bool {
    true
}

impl Configuration for TlsClientConfig {
    type Error = ConfigError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.cert_file.is_some() != self.key_file.is_some() {
            return Err(ConfigError::MissingClientCertOrKey);
        }
        Ok(())
    }
}

impl TlsClientConfig {
    pub fn with_ca_file(mut self, ca_file: &str) -> Self {
        self.ca_file = Some(ca_file.to_string());
        self
    }

    pub fn with_cert_file(mut self, cert_file: &str) -> Self {
        self.cert_file = Some(cert_file.to_string());
        self
    }

    pub fn with_key_file(mut self, key_file: &str) -> Self {
        self.key_file = Some(key_file.to_string());
        self
    }

    pub fn with_include_system_ca_certs_pool(mut self, include: bool) -> Self {
        self.include_system_ca_certs_pool = include;
        self
    }

    /// Returns true if any TLS material is set.
    pub fn is_configured(&self) -> bool {
        self.ca_file.is_some() || self.cert_file.is_some() || self.key_file.is_some()
    }

    /// Builds the rustls client configuration described by this setting.
    pub fn load_rustls_config(&self) -> Result<rustls::ClientConfig, ConfigError> {
        initialize_crypto_provider();

        let mut roots = RootStoreBuilder::new();
        match &self.ca_file {
            // an explicit CA is the only trusted authority
            Some(ca) => roots = roots.add_file(ca)?,
            None => {
                if self.include_system_ca_certs_pool {
                    roots = roots.with_system_roots();
                }
            }
        }
        let root_store = roots.finish()?;

        let builder = rustls::ClientConfig::builder().with_root_certificates(root_store);
        let config = match (&self.cert_file, &self.key_file) {
            (Some(cert_file), Some(key_file)) => {
                let certs: Vec<CertificateDer<'static>> =
                    CertificateDer::pem_file_iter(Path::new(cert_file))
                        .map_err(ConfigError::InvalidPem)?
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(ConfigError::InvalidPem)?;
                let key = PrivateKeyDer::from_pem_file(Path::new(key_file))
                    .map_err(ConfigError::InvalidPem)?;
                builder
                    .with_client_auth_cert(certs, key)
                    .map_err(ConfigError::ClientAuth)?
            }
            (None, None) => builder.with_no_client_auth(),
            _ => return Err(ConfigError::MissingClientCertOrKey),
        };

        Ok(config)
    }
}
