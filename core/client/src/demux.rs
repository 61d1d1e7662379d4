// Copyright Vessel Contributors
// SPDX-License-Identifier: Apache-2.0

//! Decoder for the engine's multiplexed stdio framing, used by attach, logs
//! and exec output when the session has no tty.
//!
//! Each frame is an 8-byte header followed by the payload: one stream byte,
//! three zero bytes, then the payload length as a big-endian u32.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

const HEADER_LEN: usize = 8;

/// Origin stream of one demultiplexed frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdStream {
    Stdin,
    Stdout,
    Stderr,
}

impl StdStream {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(StdStream::Stdin),
            1 => Some(StdStream::Stdout),
            2 => Some(StdStream::Stderr),
            _ => None,
        }
    }
}

/// One demultiplexed payload with its origin stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub stream: StdStream,
    pub payload: Bytes,
}

/// Incremental frame decoder, usable with `tokio_util::codec::FramedRead`
/// over a [`crate::response::DuplexSocket`] or any other byte source.
#[derive(Debug, Default)]
pub struct FrameDecoder;

impl Decoder for FrameDecoder {
    type Item = Frame;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, Self::Error> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        let stream = StdStream::from_byte(src[0]).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid stream byte {:#04x} in frame header", src[0]),
            )
        })?;
        let len = u32::from_be_bytes([src[4], src[5], src[6], src[7]]) as usize;

        if src.len() < HEADER_LEN + len {
            // Reserve what the full frame needs so the next read can fill it.
            src.reserve(HEADER_LEN + len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(len).freeze();
        Ok(Some(Frame { stream, payload }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_bytes(stream: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![stream, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_decode_single_frame() {
        let mut buf = BytesMut::from(&frame_bytes(1, b"hello")[..]);
        let frame = FrameDecoder
            .decode(&mut buf)
            .expect("decode")
            .expect("complete frame");
        assert_eq!(frame.stream, StdStream::Stdout);
        assert_eq!(frame.payload, Bytes::from_static(b"hello"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_back_to_back_frames() {
        let mut bytes = frame_bytes(1, b"out");
        bytes.extend(frame_bytes(2, b"err"));
        let mut buf = BytesMut::from(&bytes[..]);

        let mut decoder = FrameDecoder;
        let first = decoder.decode(&mut buf).expect("decode").expect("frame");
        let second = decoder.decode(&mut buf).expect("decode").expect("frame");
        assert_eq!(first.stream, StdStream::Stdout);
        assert_eq!(first.payload, Bytes::from_static(b"out"));
        assert_eq!(second.stream, StdStream::Stderr);
        assert_eq!(second.payload, Bytes::from_static(b"err"));
        assert!(decoder.decode(&mut buf).expect("decode").is_none());
    }

    #[test]
    fn test_decode_frame_split_across_chunks() {
        let bytes = frame_bytes(2, b"partial payload");
        let mut decoder = FrameDecoder;
        let mut buf = BytesMut::new();

        // header alone is not enough
        buf.extend_from_slice(&bytes[..HEADER_LEN]);
        assert!(decoder.decode(&mut buf).expect("decode").is_none());

        // half the payload still is not
        buf.extend_from_slice(&bytes[HEADER_LEN..HEADER_LEN + 7]);
        assert!(decoder.decode(&mut buf).expect("decode").is_none());

        buf.extend_from_slice(&bytes[HEADER_LEN + 7..]);
        let frame = decoder.decode(&mut buf).expect("decode").expect("frame");
        assert_eq!(frame.stream, StdStream::Stderr);
        assert_eq!(frame.payload, Bytes::from_static(b"partial payload"));
    }

    #[test]
    fn test_decode_empty_payload_frame() {
        let mut buf = BytesMut::from(&frame_bytes(0, b"")[..]);
        let frame = FrameDecoder
            .decode(&mut buf)
            .expect("decode")
            .expect("frame");
        assert_eq!(frame.stream, StdStream::Stdin);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_invalid_stream_byte_is_rejected() {
        let mut buf = BytesMut::from(&frame_bytes(7, b"x")[..]);
        let err = FrameDecoder
            .decode(&mut buf)
            .expect_err("invalid stream byte");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_short_header_yields_none() {
        let mut buf = BytesMut::from(&[1u8, 0, 0][..]);
        assert!(FrameDecoder.decode(&mut buf).expect("decode").is_none());
    }
}
