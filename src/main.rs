//! pipechat server entry point.
//!
//! Binds the TCP listener and runs the accept loop.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pipechat::app_state::AppState;
use pipechat::chat::ClientRegistry;
use pipechat::config::ServerConfig;
use pipechat::server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting pipechat");

    let state = AppState {
        registry: Arc::new(ClientRegistry::new()),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(state.config.listen_addr).await?;
    tracing::info!(addr = %state.config.listen_addr, "server listening");

    server::run(listener, state).await?;

    Ok(())
}
