// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Spec-driven client for a container engine's versioned HTTP API.
//!
//! Operations are resolved at call time against a machine-readable
//! specification instead of hand-written per-endpoint bindings. A
//! [`Client`] is scoped to one category (`containers`, `images`, ...) and
//! one daemon; each [`Invocation`] names an operation id, supplies a flat
//! parameter map, and picks how the response is surfaced: buffered
//! ([`Data`]), streamed ([`ByteStream`]), or a raw hijacked channel
//! ([`DuplexSocket`]) for interactive attach/exec sessions.

pub mod client;
pub mod demux;
pub mod dispatch;
pub mod errors;
pub mod params;
pub mod response;
pub mod transport;

pub use client::{categories, Client, ClientOptions, Invocation, OperationDoc};
pub use demux::{Frame, FrameDecoder, StdStream};
pub use dispatch::{Payload, ResponseMode};
pub use errors::ClientError;
pub use params::RequestParams;
pub use response::{ByteStream, Data, DuplexSocket, ResponseHandle};
pub use transport::{Channel, Timeouts, Transport};
