//! Concurrent registry of joined chat clients.
//!
//! One tokio [`Mutex`] guards the whole map. The lock covers membership
//! mutation and the snapshot phase of a broadcast only — it is released
//! before any frame is pushed toward a socket, so a slow or dead peer can
//! never stall the registry. Clients that join or leave mid-broadcast may
//! or may not see that particular message; that staleness is accepted.

use std::collections::HashMap;

use tokio::sync::Mutex;
use tokio::sync::mpsc;

use super::ClientId;
use crate::ws::frame::Frame;

/// Outbound half of a client connection: encoded frames pushed here are
/// drained by the connection's writer task.
pub type Outbound = mpsc::UnboundedSender<Vec<u8>>;

/// One joined client.
#[derive(Debug)]
struct ClientRecord {
    name: String,
    outbound: Outbound,
}

/// Thread-safe map of connection identity → joined client.
///
/// A record exists iff the session completed an application-level JOIN and
/// has not yet been removed (by close, or by a failed send during a
/// broadcast). All access goes through these synchronized methods; no
/// external code touches the map.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
}

impl ClientRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or re-registers) a client under `name`.
    pub async fn add(&self, id: ClientId, name: &str, outbound: Outbound) {
        let count = {
            let mut clients = self.clients.lock().await;
            clients.insert(
                id,
                ClientRecord {
                    name: name.to_string(),
                    outbound,
                },
            );
            clients.len()
        };
        tracing::info!(%id, name, total = count, "client added");
    }

    /// Removes a client, returning its display name.
    ///
    /// Idempotent: removing an absent identity is a no-op yielding `None`.
    pub async fn remove(&self, id: ClientId) -> Option<String> {
        let (name, count) = {
            let mut clients = self.clients.lock().await;
            let name = clients.remove(&id).map(|record| record.name);
            (name, clients.len())
        };
        if let Some(name) = &name {
            tracing::info!(%id, name, total = count, "client removed");
        }
        name
    }

    /// Returns the display name registered for `id`, if any.
    pub async fn lookup_name(&self, id: ClientId) -> Option<String> {
        let clients = self.clients.lock().await;
        clients.get(&id).map(|record| record.name.clone())
    }

    /// Returns all display names in unspecified order.
    pub async fn all_names(&self) -> Vec<String> {
        let clients = self.clients.lock().await;
        clients.values().map(|record| record.name.clone()).collect()
    }

    /// Returns the current member count.
    pub async fn count(&self) -> usize {
        self.clients.lock().await.len()
    }

    /// Sends `message` as a TEXT frame to every client except `exclude`.
    ///
    /// Takes a snapshot of the member set under the lock, releases it, then
    /// fans out. A recipient whose send fails is pruned from the registry
    /// after the fan-out; its failure never blocks delivery to the rest and
    /// never surfaces to the caller.
    pub async fn broadcast(&self, message: &str, exclude: Option<ClientId>) {
        let encoded = Frame::text(message).encode();

        let targets: Vec<(ClientId, Outbound)> = {
            let clients = self.clients.lock().await;
            clients
                .iter()
                .filter(|(id, _)| Some(**id) != exclude)
                .map(|(id, record)| (*id, record.outbound.clone()))
                .collect()
        };

        let mut failed = Vec::new();
        for (id, outbound) in targets {
            if outbound.send(encoded.clone()).is_err() {
                tracing::warn!(%id, "failed to send to client, pruning");
                failed.push(id);
            }
        }

        for id in failed {
            self.remove(id).await;
        }
    }

    /// Broadcasts a `SYSTEM|text|HH:MM:SS` notice with the current
    /// wall-clock time.
    pub async fn broadcast_system(&self, text: &str) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        let formatted = format!("SYSTEM|{text}|{timestamp}");
        self.broadcast(&formatted, None).await;
    }

    /// Broadcasts the current roster as `USERLIST|count|name1,name2,...`
    /// (empty name list when nobody is joined).
    pub async fn broadcast_user_list(&self) {
        let names = self.all_names().await;
        let formatted = format!("USERLIST|{}|{}", names.len(), names.join(","));
        self.broadcast(&formatted, None).await;
    }
}
