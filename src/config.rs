//! Server configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), with sensible defaults for local use.

use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on (e.g. `0.0.0.0:10000`).
    pub listen_addr: SocketAddr,

    /// Directory the bundled browser client is served from.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file,
    /// then reads `LISTEN_ADDR` (default `0.0.0.0:10000`) and `STATIC_DIR`
    /// (default `public`).
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as a
    /// [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:10000".to_string())
            .parse()?;

        let static_dir = PathBuf::from(
            std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
        );

        Ok(Self {
            listen_addr,
            static_dir,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_is_unset() {
        // Env-var tests share process state; only assert on the defaults
        // when the variables are genuinely absent.
        if std::env::var("LISTEN_ADDR").is_err() && std::env::var("STATIC_DIR").is_err() {
            let Ok(config) = ServerConfig::from_env() else {
                panic!("defaults should load");
            };
            assert_eq!(config.listen_addr.port(), 10_000);
            assert_eq!(config.static_dir, PathBuf::from("public"));
        }
    }
}
