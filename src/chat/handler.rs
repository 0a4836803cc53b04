//! Application-level chat protocol: `USERNAME|BODY|TIMESTAMP` dispatch.
//!
//! Sits above the WebSocket session and drives the [`ClientRegistry`].
//! Three message shapes exist: `JOIN` registers the sender and announces
//! the arrival, `LEAVE` is a no-op (departure is handled uniformly by the
//! close path), and everything else is relayed verbatim to every joined
//! client — including back to the sender, which the browser client relies
//! on to render its own messages.

use std::sync::Arc;

use super::registry::{ClientRegistry, Outbound};
use super::ClientId;

/// Per-connection chat protocol state.
///
/// Owns the connection's identity and a clone of its outbound channel so
/// that a `JOIN` can hand both to the registry.
#[derive(Debug)]
pub struct ChatHandler {
    registry: Arc<ClientRegistry>,
    id: ClientId,
    outbound: Outbound,
}

impl ChatHandler {
    /// Creates a handler for one connection.
    #[must_use]
    pub fn new(registry: Arc<ClientRegistry>, id: ClientId, outbound: Outbound) -> Self {
        Self {
            registry,
            id,
            outbound,
        }
    }

    /// Dispatches one incoming text message.
    ///
    /// Messages with fewer than three pipe-delimited fields are silently
    /// dropped: not an error, not forwarded.
    pub async fn on_message(&self, message: &str) {
        tracing::debug!(%message, "chat message received");

        let parts: Vec<&str> = message.split('|').collect();
        let [username, body, _timestamp, ..] = parts.as_slice() else {
            tracing::debug!("dropping malformed chat message");
            return;
        };

        match *body {
            "JOIN" => {
                self.registry
                    .add(self.id, username, self.outbound.clone())
                    .await;
                self.registry
                    .broadcast_system(&format!("{username} joined the chat"))
                    .await;
                self.registry.broadcast_user_list().await;
            }
            "LEAVE" => {
                // Departure runs through the close path so that explicit
                // LEAVEs and dropped connections behave identically.
            }
            _ => {
                self.registry.broadcast(message, None).await;
            }
        }
    }

    /// Close callback: deregisters the connection and, if it had joined,
    /// announces the departure and refreshes the roster.
    pub async fn on_close(&self) {
        if let Some(name) = self.registry.remove(self.id).await {
            self.registry
                .broadcast_system(&format!("{name} left the chat"))
                .await;
            self.registry.broadcast_user_list().await;
        }
    }
}
