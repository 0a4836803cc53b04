//! Shared state handed to every connection task.

use std::sync::Arc;

use crate::chat::ClientRegistry;
use crate::config::ServerConfig;

/// Cheap-to-clone shared state: one clone per accepted connection.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The chat room's joined-client registry.
    pub registry: Arc<ClientRegistry>,
    /// Immutable server configuration.
    pub config: Arc<ServerConfig>,
}
