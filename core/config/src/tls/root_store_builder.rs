// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Utility for assembling a `rustls::RootCertStore` from multiple optional
//! sources (system roots, PEM strings, files).
//!
//! This isolates certificate aggregation from the broader TLS configuration
//! code. System root loading is deferred until `finish()`; each `add_*`
//! method consumes and returns `Self` for fluent chaining.

use std::path::Path;

use rustls::RootCertStore;
use rustls_pki_types::{CertificateDer, pem::PemObject};

use crate::errors::ConfigError;

/// Builder for constructing a RootCertStore from multiple certificate sources.
pub struct RootStoreBuilder {
    store: RootCertStore,
    include_system: bool,
}

impl Default for RootStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RootStoreBuilder {
    /// Create a new (empty) builder.
    pub fn new() -> Self {
        Self {
            store: RootCertStore::empty(),
            include_system: false,
        }
    }

    /// Enable inclusion of platform/system root certificates when `finish()`
    /// is called.
    pub fn with_system_roots(mut self) -> Self {
        self.include_system = true;
        self
    }

    /// Add CA certificates from a file containing one or more PEM-encoded
    /// certificates.
    pub fn add_file(mut self, path: &str) -> Result<Self, ConfigError> {
        let cert_path = Path::new(path);
        let iter = CertificateDer::pem_file_iter(cert_path).map_err(ConfigError::InvalidPem)?;
        for item in iter {
            let cert = item.map_err(ConfigError::InvalidPem)?;
            self.store.add(cert).map_err(ConfigError::RootStore)?;
        }
        Ok(self)
    }

    /// Add CA certificates from a PEM string containing one or more
    /// concatenated certs.
    pub fn add_pem(mut self, data: &str) -> Result<Self, ConfigError> {
        for item in CertificateDer::pem_slice_iter(data.as_bytes()) {
            let cert = item.map_err(ConfigError::InvalidPem)?;
            self.store.add(cert).map_err(ConfigError::RootStore)?;
        }
        Ok(self)
    }

    /// Internal: load system roots if requested.
    fn load_system_roots(&mut self) -> Result<(), ConfigError> {
        if self.include_system {
            let native_certs = rustls_native_certs::load_native_certs();
            for err in &native_certs.errors {
                tracing::warn!(error = %err, "skipping unloadable platform root certificate");
            }
            for cert in native_certs.certs {
                self.store.add(cert).map_err(ConfigError::RootStore)?;
            }
        }
        Ok(())
    }

    /// Finalize and return the constructed RootCertStore.
    pub fn finish(mut self) -> Result<RootCertStore, ConfigError> {
        self.load_system_roots()?;
        Ok(self.store)
    }
}
