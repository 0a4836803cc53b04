//! RFC 6455 frame codec: header bits, variable-length fields, masking.
//!
//! Decoding reads from any [`AsyncRead`] in whatever chunking the transport
//! delivers, looping until a full frame is accumulated. Encoding always
//! produces server-style frames: minimal length representation, mask bit
//! never set.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |           (16/64)             |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |                Masking key (if MASK set)                      |
//! +---------------------------------------------------------------+
//! ```

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::FrameError;

/// 4-bit frame type tag (RFC 6455 §5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// Continuation of a fragmented message. Decoded but never reassembled.
    Continuation,
    /// UTF-8 text payload.
    Text,
    /// Binary payload.
    Binary,
    /// Connection close.
    Close,
    /// Ping; must be answered with a Pong carrying the same payload.
    Ping,
    /// Pong; ignored by this server.
    Pong,
}

impl OpCode {
    /// Maps an opcode nibble to its variant.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::UnknownOpcode`] for reserved values.
    pub const fn from_u8(value: u8) -> Result<Self, FrameError> {
        match value {
            0x0 => Ok(Self::Continuation),
            0x1 => Ok(Self::Text),
            0x2 => Ok(Self::Binary),
            0x8 => Ok(Self::Close),
            0x9 => Ok(Self::Ping),
            0xA => Ok(Self::Pong),
            other => Err(FrameError::UnknownOpcode(other)),
        }
    }

    /// Returns the opcode nibble.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Continuation => 0x0,
            Self::Text => 0x1,
            Self::Binary => 0x2,
            Self::Close => 0x8,
            Self::Ping => 0x9,
            Self::Pong => 0xA,
        }
    }
}

/// One decoded WebSocket frame.
///
/// Transient: constructed per read or write, never persisted. Incoming
/// payloads are already unmasked by the time a `Frame` exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// FIN bit. Always set by this server on encode; carried through as
    /// received on decode (fragments are not reassembled).
    pub fin: bool,
    /// Frame type tag.
    pub opcode: OpCode,
    /// Unmasked payload bytes.
    pub payload: Vec<u8>,
}

impl Frame {
    /// Builds a final (FIN=1) frame with the given opcode and payload.
    #[must_use]
    pub fn new(opcode: OpCode, payload: Vec<u8>) -> Self {
        Self {
            fin: true,
            opcode,
            payload,
        }
    }

    /// Builds a final TEXT frame from a string.
    #[must_use]
    pub fn text(message: &str) -> Self {
        Self::new(OpCode::Text, message.as_bytes().to_vec())
    }

    /// Builds a CLOSE frame carrying a big-endian status code and reason.
    #[must_use]
    pub fn close(code: u16, reason: &str) -> Self {
        let mut payload = code.to_be_bytes().to_vec();
        payload.extend_from_slice(reason.as_bytes());
        Self::new(OpCode::Close, payload)
    }

    /// Reads one frame from `reader`.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly before any
    /// header byte arrived (end-of-stream, not an error). A stream that ends
    /// partway through a frame yields the matching truncation error instead.
    ///
    /// # Errors
    ///
    /// See [`FrameError`]: truncated header/length/mask/payload, unknown
    /// opcode, oversized length, or a transport read failure.
    pub async fn read_from<R>(reader: &mut R) -> Result<Option<Self>, FrameError>
    where
        R: AsyncRead + Unpin,
    {
        // First header byte by itself: zero bytes here is a clean close,
        // anywhere later it is truncation.
        let mut first = [0u8; 1];
        if reader.read(&mut first).await? == 0 {
            return Ok(None);
        }
        let mut second = [0u8; 1];
        read_exactly(reader, &mut second, FrameError::TruncatedHeader).await?;

        let fin = first[0] & 0x80 != 0;
        let opcode = OpCode::from_u8(first[0] & 0x0F)?;
        let masked = second[0] & 0x80 != 0;
        let base_len = second[0] & 0x7F;

        let declared_len: u64 = match base_len {
            126 => {
                let mut ext = [0u8; 2];
                read_exactly(reader, &mut ext, FrameError::TruncatedLength).await?;
                u64::from(u16::from_be_bytes(ext))
            }
            127 => {
                let mut ext = [0u8; 8];
                read_exactly(reader, &mut ext, FrameError::TruncatedLength).await?;
                u64::from_be_bytes(ext)
            }
            n => u64::from(n),
        };

        let mask_key = if masked {
            let mut key = [0u8; 4];
            read_exactly(reader, &mut key, FrameError::TruncatedMask).await?;
            Some(key)
        } else {
            None
        };

        let len = usize::try_from(declared_len)
            .map_err(|_| FrameError::PayloadTooLarge(declared_len))?;
        let mut payload = vec![0u8; len];
        read_exactly(
            reader,
            &mut payload,
            FrameError::TruncatedPayload {
                expected: declared_len,
            },
        )
        .await?;

        if let Some(key) = mask_key {
            apply_mask(&mut payload, key);
        }

        Ok(Some(Self {
            fin,
            opcode,
            payload,
        }))
    }

    /// Serializes the frame for the server→client direction.
    ///
    /// The mask bit is never set and the minimal length encoding is chosen:
    /// lengths below 126 fit the base byte, below 65536 the 16-bit extended
    /// form, everything else the 64-bit form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let len = self.payload.len();
        let mut out = Vec::with_capacity(len + 10);

        let first = if self.fin { 0x80 } else { 0x00 } | self.opcode.as_u8();
        out.push(first);

        if len < 126 {
            #[allow(clippy::cast_possible_truncation)]
            out.push(len as u8);
        } else if len < 65_536 {
            out.push(126);
            #[allow(clippy::cast_possible_truncation)]
            out.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            out.push(127);
            out.extend_from_slice(&(len as u64).to_be_bytes());
        }

        out.extend_from_slice(&self.payload);
        out
    }
}

/// XORs `payload` in place with the 4-byte key, cycled.
///
/// Masking is an involution: applying the same key twice restores the
/// original bytes, so this one function serves both directions.
pub fn apply_mask(payload: &mut [u8], key: [u8; 4]) {
    for (byte, k) in payload.iter_mut().zip(key.iter().cycle()) {
        *byte ^= k;
    }
}

/// Reads until `buf` is full, mapping a mid-read end-of-stream to
/// `truncated`. Partial transport reads are tolerated by looping.
async fn read_exactly<R>(
    reader: &mut R,
    buf: &mut [u8],
    truncated: FrameError,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let Some(rest) = buf.get_mut(filled..) else {
            break;
        };
        let n = reader.read(rest).await?;
        if n == 0 {
            return Err(truncated);
        }
        filled += n;
    }
    Ok(())
}
