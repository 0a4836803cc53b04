//! Per-connection WebSocket session lifecycle.
//!
//! Drives one connection from handshake to termination: negotiate the
//! upgrade, then loop decoding frames and dispatching TEXT payloads to the
//! chat handler until the peer closes, sends a CLOSE frame, or the decode
//! fails. Frames are processed strictly in arrival order.
//!
//! Outbound traffic (broadcasts, PONGs, the CLOSE echo) goes through an
//! unbounded channel drained by a writer task that owns the socket's write
//! half, so nothing ever writes to the socket from under the registry lock.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, WriteHalf};
use tokio::sync::mpsc;

use super::frame::{Frame, OpCode};
use super::handshake;
use crate::chat::{ChatHandler, ClientId, ClientRegistry};
use crate::error::{FrameError, ServerError};
use crate::http::Request;

/// Session lifecycle states.
///
/// `Closing` is transient: a received CLOSE frame is echoed and the session
/// terminates immediately, so it never rests in that state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Handshake not yet complete.
    Connecting,
    /// Frame loop running.
    Open,
    /// CLOSE received, echo pending.
    Closing,
    /// Terminal.
    Closed,
}

/// Runs one WebSocket session to completion.
///
/// On handshake failure the connection is dropped before any frame is
/// processed and the close callback never fires. After a successful
/// handshake the close callback fires exactly once, whatever path leads
/// out of the frame loop.
///
/// # Errors
///
/// Handshake and frame-decode failures are returned for the caller to log;
/// both mean the session is over.
pub async fn run<S>(
    stream: S,
    request: Request,
    registry: Arc<ClientRegistry>,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut read_half, mut write_half) = tokio::io::split(stream);

    let mut state = SessionState::Connecting;
    tracing::trace!(state = ?state, "negotiating websocket upgrade");
    handshake::negotiate(&mut write_half, &request).await?;
    state = SessionState::Open;

    let (outbound, outbound_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(write_half, outbound_rx));

    let handler = ChatHandler::new(registry, ClientId::new(), outbound.clone());
    let result = read_loop(&mut read_half, &handler, &outbound, &mut state).await;

    // Exactly one close callback per session, on every exit path.
    handler.on_close().await;

    // Both sender handles must go so the writer's channel closes.
    drop(handler);
    drop(outbound);
    let _ = writer.await;

    result.map_err(Into::into)
}

/// Decodes and dispatches frames until the session leaves `Open`.
async fn read_loop<R>(
    reader: &mut R,
    handler: &ChatHandler,
    outbound: &mpsc::UnboundedSender<Vec<u8>>,
    state: &mut SessionState,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    while *state == SessionState::Open {
        let Some(frame) = Frame::read_from(reader).await? else {
            // Clean end-of-stream.
            *state = SessionState::Closed;
            break;
        };

        match frame.opcode {
            OpCode::Text => {
                let text = String::from_utf8(frame.payload)?;
                handler.on_message(&text).await;
            }
            OpCode::Close => {
                *state = SessionState::Closing;
                tracing::debug!(state = ?*state, "close frame received, echoing");
                let _ = outbound.send(Frame::close(1000, "").encode());
                *state = SessionState::Closed;
            }
            OpCode::Ping => {
                let _ = outbound.send(Frame::new(OpCode::Pong, frame.payload).encode());
            }
            OpCode::Pong | OpCode::Binary | OpCode::Continuation => {
                // PONGs are ignored; BINARY and CONTINUATION are accepted at
                // the framing level but carry no application meaning here.
            }
        }
    }
    Ok(())
}

/// Drains the outbound channel into the socket's write half.
///
/// Exits on write failure or when every sender is gone, then shuts the
/// write half down. A dead writer is what makes later registry sends to
/// this client fail and get pruned.
async fn write_loop<S>(mut writer: WriteHalf<S>, mut rx: mpsc::UnboundedReceiver<Vec<u8>>)
where
    S: AsyncWrite + Send,
{
    while let Some(bytes) = rx.recv().await {
        if let Err(err) = writer.write_all(&bytes).await {
            tracing::debug!(error = %err, "outbound write failed");
            break;
        }
    }
    let _ = writer.shutdown().await;
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::ws::frame::apply_mask;
    use tokio::io::{AsyncReadExt, DuplexStream};

    const MASK: [u8; 4] = [0x11, 0x22, 0x33, 0x44];

    /// Client→server frames must be masked.
    fn masked(opcode: OpCode, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0x80 | opcode.as_u8()];
        assert!(payload.len() < 126, "test helper handles short frames only");
        #[allow(clippy::cast_possible_truncation)]
        out.push(0x80 | payload.len() as u8);
        out.extend_from_slice(&MASK);
        let mut body = payload.to_vec();
        apply_mask(&mut body, MASK);
        out.extend_from_slice(&body);
        out
    }

    fn upgrade_request() -> Request {
        let raw = b"GET / HTTP/1.1\r\n\
            Upgrade: websocket\r\n\
            Connection: Upgrade\r\n\
            Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n";
        let Some(request) = Request::parse(raw) else {
            panic!("request should parse");
        };
        request
    }

    async fn read_handshake_response(client: &mut DuplexStream) {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        while !buf.ends_with(b"\r\n\r\n") {
            let Ok(1) = client.read(&mut byte).await else {
                panic!("handshake response truncated");
            };
            buf.extend_from_slice(&byte);
        }
        let Ok(text) = std::str::from_utf8(&buf) else {
            panic!("handshake response not UTF-8");
        };
        assert!(text.starts_with("HTTP/1.1 101"));
    }

    async fn read_frame(client: &mut DuplexStream) -> Frame {
        let Ok(Some(frame)) = Frame::read_from(client).await else {
            panic!("expected a frame from the server");
        };
        frame
    }

    #[tokio::test]
    async fn handshake_failure_terminates_without_frames() {
        let (client, server) = tokio::io::duplex(1024);
        let raw = b"GET / HTTP/1.1\r\nUpgrade: websocket\r\nConnection: Upgrade\r\n\r\n";
        let Some(request) = Request::parse(raw) else {
            panic!("request should parse");
        };

        let registry = Arc::new(ClientRegistry::new());
        let result = run(server, request, registry).await;
        assert!(matches!(result, Err(ServerError::Handshake(_))));
        drop(client);
    }

    #[tokio::test]
    async fn ping_is_answered_with_identical_pong() {
        let (mut client, server) = tokio::io::duplex(1024);
        let registry = Arc::new(ClientRegistry::new());
        let session = tokio::spawn(run(server, upgrade_request(), registry));

        read_handshake_response(&mut client).await;

        let Ok(()) = client.write_all(&masked(OpCode::Ping, b"heartbeat")).await else {
            panic!("write failed");
        };

        let pong = read_frame(&mut client).await;
        assert_eq!(pong.opcode, OpCode::Pong);
        assert_eq!(pong.payload, b"heartbeat");

        drop(client);
        let Ok(result) = session.await else {
            panic!("session task panicked");
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn close_frame_is_echoed_with_code_1000() {
        let (mut client, server) = tokio::io::duplex(1024);
        let registry = Arc::new(ClientRegistry::new());
        let session = tokio::spawn(run(server, upgrade_request(), registry));

        read_handshake_response(&mut client).await;

        let Ok(()) = client.write_all(&masked(OpCode::Close, &[])).await else {
            panic!("write failed");
        };

        let echo = read_frame(&mut client).await;
        assert_eq!(echo.opcode, OpCode::Close);
        assert_eq!(echo.payload, 1000u16.to_be_bytes());

        let Ok(result) = session.await else {
            panic!("session task panicked");
        };
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn text_frames_reach_the_chat_handler() {
        let (mut client, server) = tokio::io::duplex(1024);
        let registry = Arc::new(ClientRegistry::new());
        let session = tokio::spawn(run(server, upgrade_request(), Arc::clone(&registry)));

        read_handshake_response(&mut client).await;

        let Ok(()) = client
            .write_all(&masked(OpCode::Text, b"alice|JOIN|12:00:00"))
            .await
        else {
            panic!("write failed");
        };

        // The join notice proves the message went through handler+registry.
        let notice = read_frame(&mut client).await;
        let Ok(text) = String::from_utf8(notice.payload) else {
            panic!("notice not UTF-8");
        };
        assert!(text.starts_with("SYSTEM|alice joined the chat|"));
        assert_eq!(registry.all_names().await, ["alice"]);

        drop(client);
        let Ok(result) = session.await else {
            panic!("session task panicked");
        };
        assert!(result.is_ok());
        // The close callback deregistered the client on disconnect.
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn invalid_utf8_text_aborts_the_session() {
        let (mut client, server) = tokio::io::duplex(1024);
        let registry = Arc::new(ClientRegistry::new());
        let session = tokio::spawn(run(server, upgrade_request(), registry));

        read_handshake_response(&mut client).await;

        let Ok(()) = client
            .write_all(&masked(OpCode::Text, &[0xFF, 0xFE, 0x80]))
            .await
        else {
            panic!("write failed");
        };

        let Ok(result) = session.await else {
            panic!("session task panicked");
        };
        assert!(matches!(
            result,
            Err(ServerError::Frame(FrameError::InvalidUtf8(_)))
        ));
    }

    #[tokio::test]
    async fn truncated_frame_aborts_the_session() {
        let (mut client, server) = tokio::io::duplex(1024);
        let registry = Arc::new(ClientRegistry::new());
        let session = tokio::spawn(run(server, upgrade_request(), registry));

        read_handshake_response(&mut client).await;

        // Declares a 10-byte masked payload, then hangs up.
        let Ok(()) = client.write_all(&[0x81, 0x8A, 1, 2, 3, 4, 9]).await else {
            panic!("write failed");
        };
        drop(client);

        let Ok(result) = session.await else {
            panic!("session task panicked");
        };
        assert!(matches!(
            result,
            Err(ServerError::Frame(FrameError::TruncatedPayload { .. }))
        ));
    }
}
