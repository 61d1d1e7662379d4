// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Public client surface: one client per (category, connection, version)
//! triple, invocations resolved against the specification at call time.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use vessel_config::component::Configuration;
use vessel_config::conn::ConnectionConfig;
use vessel_spec::store::{DEFAULT_API_VERSION, SpecStore, default_store};
use vessel_spec::{Method, ParameterDeclaration};

use crate::dispatch::{self, Payload, ResponseMode};
use crate::errors::ClientError;
use crate::params;
use crate::response::ResponseHandle;
use crate::transport::{Timeouts, Transport};

/// Options for constructing a [`Client`].
pub struct ClientOptions {
    category: String,
    conn: ConnectionConfig,
    api_version: Option<String>,
    spec_store: Option<Arc<SpecStore>>,
}

/// A category-scoped handle onto one engine daemon.
///
/// Construction validates the configuration and loads TLS material, so a
/// misconfigured client fails here rather than on first use. The
/// specification itself is fetched lazily on the first invocation.
pub struct Client {
    category: String,
    version: String,
    transport: Transport,
    timeouts: Timeouts,
    store: Arc<SpecStore>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("category", &self.category)
            .field("version", &self.version)
            .field("timeouts", &self.timeouts)
            .finish_non_exhaustive()
    }
}

impl ClientOptions {
    pub fn new(category: &str, conn: ConnectionConfig) -> Self {
        Self {
            category: category.to_string(),
            conn,
            api_version: None,
            spec_store: None,
        }
    }

    /// Pins the API version instead of the store default.
    pub fn with_api_version(self, version: &str) -> Self {
        Self {
            api_version: Some(version.to_string()),
            ..self
        }
    }

    /// Substitutes a specification store, mainly for loading documents from
    /// disk instead of the embedded set.
    pub fn with_spec_store(self, store: Arc<SpecStore>) -> Self {
        Self {
            spec_store: Some(store),
            ..self
        }
    }
}

impl Client {
    pub fn new(options: ClientOptions) -> Result<Self, ClientError> {
        if options.category.is_empty() {
            return Err(ClientError::MissingCategory);
        }
        options.conn.validate()?;

        let transport = Transport::from_config(&options.conn)?;
        let timeouts = Timeouts::from_config(&options.conn);

        Ok(Self {
            category: options.category,
            version: options
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            transport,
            timeouts,
            store: options.spec_store.unwrap_or_else(default_store),
        })
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn api_version(&self) -> &str {
        &self.version
    }

    /// Executes one invocation over a fresh channel.
    ///
    /// Lookup failures surface before any network activity; an operation id
    /// absent from this client's category fails with
    /// [`ClientError::UnknownOperation`] without connecting.
    pub async fn invoke(&self, invocation: Invocation) -> Result<ResponseHandle, ClientError> {
        let endpoint = self
            .store
            .request_info(&self.category, &invocation.op, Some(&self.version))?
            .ok_or_else(|| ClientError::UnknownOperation {
                category: self.category.clone(),
                operation: invocation.op.clone(),
                version: self.version.clone(),
            })?;

        let parts = params::partition(&invocation.params, &endpoint.params);
        let resolved = dispatch::resolve_request(
            &self.version,
            &endpoint,
            &parts,
            invocation.payload,
            invocation.payload_content_type,
        )?;

        dispatch::execute(
            &self.transport,
            &self.timeouts,
            resolved,
            invocation.mode,
            invocation.throw_exception,
            invocation.throw_entire_message,
        )
        .await
    }

    /// Operation ids available under this client's category.
    pub fn ops(&self) -> Result<Vec<String>, ClientError> {
        let endpoints = self.store.endpoints_in(&self.category, Some(&self.version))?;
        Ok(endpoints.into_iter().map(|e| e.operation).collect())
    }

    /// Describes one operation: method, path template and declared
    /// parameters, in declaration order.
    pub fn doc(&self, operation: &str) -> Result<Option<OperationDoc>, ClientError> {
        let endpoint = self
            .store
            .request_info(&self.category, operation, Some(&self.version))?;
        Ok(endpoint.map(|e| OperationDoc {
            operation: e.operation,
            method: e.method,
            path: e.path,
            description: e.description,
            params: e.params,
        }))
    }
}

/// Human-oriented description of one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDoc {
    pub operation: String,
    pub method: Method,
    pub path: String,
    pub description: Option<String>,
    pub params: Vec<ParameterDeclaration>,
}

/// Categories available in the embedded specification set.
pub fn categories(version: Option<&str>) -> Result<BTreeSet<String>, ClientError> {
    Ok(default_store().categories(version)?)
}

/// One call against an operation: the operation id, a flat parameter map,
/// an optional raw payload, and the response handling flags.
#[derive(Debug)]
pub struct Invocation {
    op: String,
    params: Map<String, Value>,
    payload: Option<Payload>,
    payload_content_type: Option<String>,
    mode: ResponseMode,
    throw_exception: bool,
    throw_entire_message: bool,
}

impl Invocation {
    pub fn new(op: &str) -> Self {
        Self {
            op: op.to_string(),
            params: Map::new(),
            payload: None,
            payload_content_type: None,
            mode: ResponseMode::default(),
            throw_exception: false,
            throw_entire_message: false,
        }
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_params(self, params: Map<String, Value>) -> Self {
        Self { params, ..self }
    }

    /// Attaches a raw payload forwarded as the request body, displacing any
    /// body-located parameters.
    pub fn with_payload(self, payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            ..self
        }
    }

    /// Content type for the raw payload. Default: `application/octet-stream`.
    pub fn with_payload_content_type(self, content_type: &str) -> Self {
        Self {
            payload_content_type: Some(content_type.to_string()),
            ..self
        }
    }

    pub fn with_mode(self, mode: ResponseMode) -> Self {
        Self { mode, ..self }
    }

    /// Raise a [`ClientError::Response`] for any status >= 400 instead of
    /// handing the response back.
    pub fn with_throw_exception(self, throw_exception: bool) -> Self {
        Self {
            throw_exception,
            ..self
        }
    }

    /// Carry the entire server body in the raised error rather than a
    /// summarized message. Only meaningful together with `throw_exception`.
    pub fn with_throw_entire_message(self, throw_entire_message: bool) -> Self {
        Self {
            throw_entire_message,
            ..self
        }
    }
}
