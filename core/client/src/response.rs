// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Response surfaces for the three consumption modes. The dispatcher decides
//! which variant to produce; callers pick it apart with the `into_*`
//! accessors.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use http_body_util::BodyDataStream;
use hyper::body::Incoming;
use hyper::upgrade::Upgraded;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// What one invocation produced, shaped by the requested response mode.
pub enum ResponseHandle {
    /// The whole body, already buffered and decoded.
    Data(Data),
    /// The body as it arrives, without buffering the whole of it.
    Stream(ByteStream),
    /// A raw bidirectional channel obtained via connection upgrade.
    Socket(DuplexSocket),
}

impl std::fmt::Debug for ResponseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseHandle::Data(data) => f.debug_tuple("Data").field(data).finish(),
            ResponseHandle::Stream(_) => f.debug_tuple("Stream").finish(),
            ResponseHandle::Socket(_) => f.debug_tuple("Socket").finish(),
        }
    }
}

impl ResponseHandle {
    pub fn into_data(self) -> Option<Data> {
        match self {
            ResponseHandle::Data(data) => Some(data),
            _ => None,
        }
    }

    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            ResponseHandle::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn into_socket(self) -> Option<DuplexSocket> {
        match self {
            ResponseHandle::Socket(socket) => Some(socket),
            _ => None,
        }
    }
}

/// A fully buffered response body.
///
/// Bodies that parse as JSON are decoded; anything else is handed over as
/// raw bytes rather than rejected, since several endpoints legitimately
/// return non-JSON payloads (archives, raw logs).
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    Json(serde_json::Value),
    Raw(Bytes),
}

impl Data {
    pub fn decode(bytes: Bytes) -> Self {
        match serde_json::from_slice(&bytes) {
            Ok(value) => Data::Json(value),
            Err(_) => Data::Raw(bytes),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Data::Json(value) => Some(value),
            Data::Raw(_) => None,
        }
    }
}

/// Incremental response body chunks in arrival order.
pub struct ByteStream {
    inner: BodyDataStream<Incoming>,
}

impl ByteStream {
    pub(crate) fn new(body: Incoming) -> Self {
        Self {
            inner: BodyDataStream::new(body),
        }
    }
}

impl Stream for ByteStream {
    type Item = Result<Bytes, hyper::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// Raw bidirectional byte channel over an upgraded connection. Writes go to
/// the server's stdin side; reads carry its output, possibly in the
/// multiplexed framing (see [`crate::demux`]).
pub struct DuplexSocket {
    inner: TokioIo<Upgraded>,
}

impl DuplexSocket {
    pub(crate) fn new(upgraded: Upgraded) -> Self {
        Self {
            inner: TokioIo::new(upgraded),
        }
    }
}

impl AsyncRead for DuplexSocket {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for DuplexSocket {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json_body() {
        let data = Data::decode(Bytes::from_static(b"{\"Id\":\"abc\",\"Warnings\":[]}"));
        assert_eq!(data, Data::Json(json!({"Id": "abc", "Warnings": []})));
        assert!(data.as_json().is_some());
    }

    #[test]
    fn test_decode_non_json_body_stays_raw() {
        let payload = Bytes::from_static(b"\x01\x00\x00\x00\x00\x00\x00\x02hi");
        let data = Data::decode(payload.clone());
        assert_eq!(data, Data::Raw(payload));
        assert!(data.as_json().is_none());
    }

    #[test]
    fn test_decode_empty_body_stays_raw() {
        let data = Data::decode(Bytes::new());
        assert_eq!(data, Data::Raw(Bytes::new()));
    }

    #[test]
    fn test_json_scalar_bodies_decode() {
        // wait/commit style endpoints can return bare scalars
        let data = Data::decode(Bytes::from_static(b"0"));
        assert_eq!(data, Data::Json(json!(0)));
    }

    #[test]
    fn test_handle_debug_names_the_variant() {
        let handle = ResponseHandle::Data(Data::Raw(Bytes::from_static(b"x")));
        let rendered = format!("{:?}", handle);
        assert!(rendered.starts_with("Data"));
    }
}
