//! # Wire Format
//!
//! Framing for event streams and registry traffic.
//!
//! A connection starts with a 5-byte preamble:
//! - 4 bytes: Magic ("GWIR")
//! - 1 byte: Version
//!
//! followed by length-prefixed frames: a little-endian `u32` payload size,
//! then that many bytes of postcard-serialized data.
//!
//! ## Validation
//!
//! The frame size is checked against `MAX_FRAME_SIZE` BEFORE any payload
//! allocation, so a corrupted or hostile peer cannot force a huge
//! allocation out of a 4-byte prefix.

use graphwire_core::GraphwireError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

// =============================================================================
// WIRE CONSTANTS
// =============================================================================

/// Magic bytes opening every connection.
pub const MAGIC_BYTES: &[u8; 4] = b"GWIR";

/// Current wire protocol version.
pub const WIRE_VERSION: u8 = 1;

/// Maximum allowed frame payload size.
///
/// Validated before allocation. A single graph event is tiny; the bound
/// mostly guards against garbage length prefixes.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024; // 16 MB

// =============================================================================
// PREAMBLE
// =============================================================================

/// Write the connection preamble.
pub async fn write_preamble<W>(writer: &mut W) -> Result<(), GraphwireError>
where
    W: AsyncWrite + Unpin,
{
    let mut preamble = [0u8; 5];
    preamble[0..4].copy_from_slice(MAGIC_BYTES);
    preamble[4] = WIRE_VERSION;
    writer
        .write_all(&preamble)
        .await
        .map_err(|e| GraphwireError::Io(e.to_string()))
}

/// Read and validate the connection preamble.
pub async fn read_preamble<R>(reader: &mut R) -> Result<(), GraphwireError>
where
    R: AsyncRead + Unpin,
{
    let mut preamble = [0u8; 5];
    reader
        .read_exact(&mut preamble)
        .await
        .map_err(|e| GraphwireError::Io(e.to_string()))?;

    if &preamble[0..4] != MAGIC_BYTES {
        return Err(GraphwireError::Serialization(
            "invalid magic bytes".to_string(),
        ));
    }
    if preamble[4] != WIRE_VERSION {
        return Err(GraphwireError::Serialization(format!(
            "unsupported wire version: {} (expected {WIRE_VERSION})",
            preamble[4]
        )));
    }
    Ok(())
}

// =============================================================================
// FRAMES
// =============================================================================

/// Serialize a value into a length-prefixed frame.
pub fn encode_frame<T: Serialize>(value: &T) -> Result<Vec<u8>, GraphwireError> {
    let payload =
        postcard::to_stdvec(value).map_err(|e| GraphwireError::Serialization(e.to_string()))?;
    if payload.len() > MAX_FRAME_SIZE {
        return Err(GraphwireError::Serialization(format!(
            "frame payload {} bytes exceeds maximum {MAX_FRAME_SIZE} bytes",
            payload.len()
        )));
    }
    let size = u32::try_from(payload.len())
        .map_err(|_| GraphwireError::Serialization("frame payload too large".to_string()))?;

    let mut frame = Vec::with_capacity(4_usize.saturating_add(payload.len()));
    frame.extend_from_slice(&size.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Decode a frame payload.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, GraphwireError> {
    postcard::from_bytes(payload).map_err(|e| GraphwireError::Serialization(e.to_string()))
}

/// Write one frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), GraphwireError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(value)?;
    writer
        .write_all(&frame)
        .await
        .map_err(|e| GraphwireError::Io(e.to_string()))
}

/// Read one frame. Returns `Ok(None)` on a clean end of stream (the peer
/// closed between frames); a truncated frame is an error.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, GraphwireError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let mut size_bytes = [0u8; 4];
    match reader.read_exact(&mut size_bytes).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(GraphwireError::Io(e.to_string())),
    }

    let size = u32::from_le_bytes(size_bytes) as usize;
    if size > MAX_FRAME_SIZE {
        return Err(GraphwireError::Serialization(format!(
            "frame size {size} bytes exceeds maximum {MAX_FRAME_SIZE} bytes"
        )));
    }

    let mut payload = vec![0u8; size];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|e| GraphwireError::Io(e.to_string()))?;

    decode_payload(&payload).map(Some)
}

// =============================================================================
// REGISTRY PROTOCOL
// =============================================================================

/// One request on a registry connection.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub enum RegistryRequest {
    /// Publish `name` as reachable at `endpoint`.
    Bind { name: String, endpoint: SocketAddr },
    /// Resolve `name` to an endpoint.
    Lookup { name: String },
}

/// The registry's answer.
#[derive(Debug, Clone, Serialize, serde::Deserialize)]
pub enum RegistryResponse {
    Bound,
    Endpoint(SocketAddr),
    Error(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use graphwire_core::{Event, SourceId, StampedEvent};

    #[tokio::test]
    async fn preamble_roundtrip() {
        let mut out = std::io::Cursor::new(Vec::new());
        write_preamble(&mut out).await.expect("write");

        let mut cursor = std::io::Cursor::new(out.into_inner());
        read_preamble(&mut cursor).await.expect("read");
    }

    #[tokio::test]
    async fn invalid_magic_rejected() {
        let mut buf = vec![0u8; 5];
        buf[0..4].copy_from_slice(b"XXXX");
        buf[4] = WIRE_VERSION;

        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_preamble(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn wrong_version_rejected() {
        let mut buf = vec![0u8; 5];
        buf[0..4].copy_from_slice(MAGIC_BYTES);
        buf[4] = WIRE_VERSION.wrapping_add(1);

        let mut cursor = std::io::Cursor::new(buf);
        assert!(read_preamble(&mut cursor).await.is_err());
    }

    #[tokio::test]
    async fn frame_roundtrip() {
        let ev = StampedEvent::new(
            SourceId::new("g1"),
            7,
            Event::NodeAdded {
                id: "A".to_string(),
            },
        );

        let mut out = std::io::Cursor::new(Vec::new());
        write_frame(&mut out, &ev).await.expect("write");

        let mut cursor = std::io::Cursor::new(out.into_inner());
        let restored: StampedEvent = read_frame(&mut cursor)
            .await
            .expect("read")
            .expect("present");
        assert_eq!(restored, ev);
    }

    #[tokio::test]
    async fn clean_eof_is_none() {
        let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
        let result: Option<StampedEvent> = read_frame(&mut cursor).await.expect("read");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_rejected_before_allocation() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&u32::MAX.to_le_bytes());

        let mut cursor = std::io::Cursor::new(buf);
        let result: Result<Option<StampedEvent>, _> = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn truncated_frame_is_an_error() {
        let ev = StampedEvent::new(
            SourceId::new("g1"),
            1,
            Event::NodeAdded {
                id: "A".to_string(),
            },
        );
        let mut frame = encode_frame(&ev).expect("encode");
        frame.truncate(frame.len() - 1);

        let mut cursor = std::io::Cursor::new(frame);
        let result: Result<Option<StampedEvent>, _> = read_frame(&mut cursor).await;
        assert!(result.is_err());
    }
}
