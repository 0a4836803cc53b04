//! TCP acceptor and per-connection routing.
//!
//! The accept loop does nothing but accept and dispatch: every connection
//! gets its own spawned task. The task reads one HTTP request; upgrade
//! requests hand the socket to the WebSocket session, everything else is
//! answered by the static-file collaborator and closed.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::app_state::AppState;
use crate::error::ServerError;
use crate::http::{Request, static_files};
use crate::ws::session;

/// Upper bound on the initial HTTP request we are willing to buffer.
const MAX_REQUEST_BYTES: usize = 8192;

/// Accepts connections forever, one task per connection.
///
/// # Errors
///
/// Returns only when `accept` itself fails; per-connection errors are
/// logged and never escape their task.
pub async fn run(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, addr, state).await {
                tracing::debug!(%addr, error = %err, "connection ended with error");
            }
        });
    }
}

/// Handles one accepted connection: parse the request, then route it.
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    state: AppState,
) -> Result<(), ServerError> {
    tracing::debug!(%addr, "new connection");

    let raw = read_request(&mut stream).await?;
    let Some(request) = Request::parse(&raw) else {
        stream.write_all(&static_files::not_found()).await?;
        stream.shutdown().await?;
        return Ok(());
    };

    if request.is_upgrade() {
        tracing::info!(%addr, path = %request.path, "websocket upgrade");
        return session::run(stream, request, state.registry).await;
    }

    tracing::info!(%addr, method = %request.method, path = %request.path, "http request");
    let response = static_files::serve(&state.config.static_dir, &request.path).await;
    stream.write_all(&response).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Reads the initial request up to and including the blank line that ends
/// the header block (or until `MAX_REQUEST_BYTES`).
async fn read_request(stream: &mut TcpStream) -> Result<Vec<u8>, std::io::Error> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(chunk.get(..n).unwrap_or_default());
        if buf.windows(4).any(|w| w == b"\r\n\r\n") || buf.len() >= MAX_REQUEST_BYTES {
            break;
        }
    }
    Ok(buf)
}
