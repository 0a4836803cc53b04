//! Server error types with a narrow, per-layer taxonomy.
//!
//! Three failure classes exist and they are never blurred together:
//! handshake errors (connection rejected before any frame traffic), frame
//! decode errors (session terminated), and transport send errors (the
//! failing recipient is pruned, nothing propagates to the sender). A clean
//! end-of-stream is *not* an error — the frame codec reports it as the
//! absence of a frame.

/// Failure while negotiating the WebSocket upgrade.
///
/// Raised before the frame loop starts; a connection that fails the
/// handshake never processes a frame and never fires the close callback.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// The upgrade request carried no `Sec-WebSocket-Key` header.
    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,

    /// The 101 response could not be written to the peer.
    #[error("failed to write handshake response: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure while decoding a single WebSocket frame.
///
/// Each truncation point gets its own variant so callers can log them
/// apart, but every variant means the same thing to the session: terminate.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended inside the 2-byte frame header.
    #[error("truncated frame header")]
    TruncatedHeader,

    /// The stream ended inside the 16- or 64-bit extended length field.
    #[error("truncated extended length field")]
    TruncatedLength,

    /// The stream ended inside the 4-byte masking key.
    #[error("truncated masking key")]
    TruncatedMask,

    /// The stream ended before `expected` payload bytes arrived.
    #[error("truncated payload: expected {expected} bytes")]
    TruncatedPayload {
        /// Declared payload length of the partially received frame.
        expected: u64,
    },

    /// The opcode nibble is not one of the six RFC 6455 opcodes.
    #[error("unknown opcode 0x{0:x}")]
    UnknownOpcode(u8),

    /// A TEXT payload was not valid UTF-8.
    #[error("text payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// The declared payload length does not fit in this platform's `usize`.
    #[error("payload length {0} exceeds platform limits")]
    PayloadTooLarge(u64),

    /// Transport-level read failure mid-frame (not a clean close).
    #[error("transport error while reading frame: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level server error.
///
/// Everything is handled locally near where it occurs; this enum exists so
/// the per-connection task has a single `Result` type to propagate through.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// WebSocket upgrade negotiation failed.
    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    /// A frame could not be decoded from the peer.
    #[error("frame decode failed: {0}")]
    Frame(#[from] FrameError),

    /// Socket-level failure outside the frame codec.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
