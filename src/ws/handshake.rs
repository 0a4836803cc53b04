//! WebSocket upgrade negotiation (RFC 6455 §4.2.2).
//!
//! Validates the upgrade request and writes the `101 Switching Protocols`
//! response. After a successful negotiation the connection belongs to the
//! frame loop; nothing here reads from the socket.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha1::{Digest, Sha1};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::HandshakeError;
use crate::http::Request;

/// Magic GUID appended to the client key (RFC 6455).
const WEBSOCKET_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// Computes the `Sec-WebSocket-Accept` token for a client key:
/// `base64(SHA1(key ++ GUID))`.
#[must_use]
pub fn accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WEBSOCKET_GUID.as_bytes());
    BASE64.encode(hasher.finalize())
}

/// Performs the server side of the WebSocket handshake.
///
/// On success the 101 response has been written and the caller may start
/// the frame loop. On failure nothing has been written to the peer.
///
/// # Errors
///
/// [`HandshakeError::MissingKey`] when the request has no
/// `Sec-WebSocket-Key` header; [`HandshakeError::Io`] when the response
/// cannot be written.
pub async fn negotiate<W>(writer: &mut W, request: &Request) -> Result<(), HandshakeError>
where
    W: AsyncWrite + Unpin,
{
    let key = request
        .header("sec-websocket-key")
        .ok_or(HandshakeError::MissingKey)?;

    let accept = accept_key(key);
    let response = format!(
        "HTTP/1.1 101 Switching Protocols\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Accept: {accept}\r\n\
         \r\n"
    );
    writer.write_all(response.as_bytes()).await?;
    writer.flush().await?;

    tracing::debug!(accept = %accept, "websocket handshake complete");
    Ok(())
}
