//! Message framing over a TCP byte stream.
//!
//! The relay protocol is message-oriented, so every record travels in its own
//! length-prefixed frame:
//!
//! ```text
//! +-------------------+--------------------------+
//! | length (4 bytes)  |   JSON record            |
//! | u32 little-endian |   (length bytes, UTF-8)  |
//! +-------------------+--------------------------+
//! ```
//!
//! The prefix does not count itself. [`read_message`] and [`write_message`]
//! layer the codec on top; a frame that arrives intact but fails to decode is
//! reported separately from transport failures so the caller can keep the
//! connection open.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::messages::{self, CodecError};

/// Default upper bound on a single frame's payload: 1 MiB.
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 1_048_576;

/// Framing limits.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. A peer announcing more is disconnected.
    pub max_payload_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

/// Transport-level failures. Any of these ends the connection.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("payload size {size} exceeds maximum {max}")]
    PayloadTooLarge { size: u32, max: u32 },

    /// The peer closed the stream, possibly mid-frame.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of reading one typed message.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The stream is unusable; drop the connection.
    #[error(transparent)]
    Transport(#[from] FrameError),

    /// A whole frame arrived but did not decode. The stream is still in sync.
    #[error(transparent)]
    Malformed(#[from] CodecError),
}

/// Read one raw frame payload.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> Result<Vec<u8>, FrameError> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(eof_as_closed)?;

    let payload_len = u32::from_le_bytes(len_buf);
    if payload_len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: config.max_payload_size,
        });
    }

    let mut payload = vec![0u8; payload_len as usize];
    if payload_len > 0 {
        reader.read_exact(&mut payload).await.map_err(eof_as_closed)?;
    }
    Ok(payload)
}

/// Write one raw frame payload and flush.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    payload: &[u8],
    config: &FrameConfig,
) -> Result<(), FrameError> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    if len > config.max_payload_size {
        return Err(FrameError::PayloadTooLarge {
            size: len,
            max: config.max_payload_size,
        });
    }

    writer.write_all(&len.to_le_bytes()).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it as `M`.
pub async fn read_message<M, R>(reader: &mut R, config: &FrameConfig) -> Result<M, ReadError>
where
    M: DeserializeOwned,
    R: AsyncReadExt + Unpin,
{
    let payload = read_frame(reader, config).await?;
    Ok(messages::decode(&payload)?)
}

/// Encode `msg` and write it as one frame.
pub async fn write_message<M, W>(
    writer: &mut W,
    msg: &M,
    config: &FrameConfig,
) -> Result<(), ReadError>
where
    M: Serialize,
    W: AsyncWriteExt + Unpin,
{
    let payload = messages::encode(msg)?;
    write_frame(writer, &payload, config).await?;
    Ok(())
}

fn eof_as_closed(e: std::io::Error) -> FrameError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        FrameError::ConnectionClosed
    } else {
        FrameError::Io(e)
    }
}
