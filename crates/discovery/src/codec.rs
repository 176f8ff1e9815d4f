//! Length-prefixed frame codec.
//!
//! Every message on the discovery and probe connections uses one layout:
//!
//! ```text
//! +---------+----------------+-----------------+
//! | version | length (u32 LE)| payload         |
//! | 1 byte  | 4 bytes        | `length` bytes  |
//! +---------+----------------+-----------------+
//! ```
//!
//! Readers consume exactly `length` payload bytes no matter how the stream
//! is chunked. A stream that ends early is an error, never a short frame.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{DiscoveryError, Result};

/// Protocol version carried in the first header byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Version byte plus little-endian `u32` length.
pub const HEADER_LEN: usize = 5;

/// Upper bound on payloads accepted from the network.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Encode `payload` into a single frame.
pub fn encode_frame(payload: &[u8]) -> Result<Bytes> {
    let len = u32::try_from(payload.len()).map_err(|_| DiscoveryError::FrameTooLarge {
        len: payload.len(),
        max: u32::MAX as usize,
    })?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(PROTOCOL_VERSION);
    buf.put_u32_le(len);
    buf.put_slice(payload);
    Ok(buf.freeze())
}

/// Validate a header and return the declared payload length.
pub fn decode_header(header: &[u8; HEADER_LEN]) -> Result<usize> {
    if header[0] != PROTOCOL_VERSION {
        return Err(DiscoveryError::UnsupportedVersion(header[0]));
    }
    let len = u32::from_le_bytes([header[1], header[2], header[3], header[4]]);
    Ok(len as usize)
}

/// Write one frame and flush.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode_frame(payload)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame, rejecting payloads longer than `max_len`.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let len = decode_header(&header)?;
    if len > max_len {
        return Err(DiscoveryError::FrameTooLarge { len, max: max_len });
    }

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(Bytes::from(payload))
}
