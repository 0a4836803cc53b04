//! Minimal HTTP/1.1 request parsing.
//!
//! Just enough HTTP to serve the chat client and recognize WebSocket
//! upgrade requests. Header names are lowercased at parse time so lookups
//! are case-insensitive.

use std::collections::HashMap;

/// A parsed HTTP request line plus headers. The body, if any, is ignored.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method, e.g. `GET`.
    pub method: String,
    /// Request target, e.g. `/index.html`.
    pub path: String,
    /// Protocol version, e.g. `HTTP/1.1`.
    pub version: String,
    headers: HashMap<String, String>,
}

impl Request {
    /// Parses raw request bytes into a [`Request`].
    ///
    /// Returns `None` when the bytes are not UTF-8 or the request line does
    /// not have exactly three parts. Malformed header lines are skipped.
    #[must_use]
    pub fn parse(data: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(data).ok()?;
        let mut lines = text.split("\r\n");

        let request_line = lines.next()?;
        let mut parts = request_line.split(' ');
        let method = parts.next()?.to_string();
        let path = parts.next()?.to_string();
        let version = parts.next()?.to_string();
        if parts.next().is_some() {
            return None;
        }

        let mut headers = HashMap::new();
        for line in lines {
            if line.is_empty() {
                // Blank line ends the header block.
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }

        Some(Self {
            method,
            path,
            version,
            headers,
        })
    }

    /// Looks up a header by its lowercase name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Returns `true` if this request asks to upgrade to WebSocket:
    /// `Upgrade` contains "websocket" and `Connection` contains "upgrade",
    /// both case-insensitively.
    #[must_use]
    pub fn is_upgrade(&self) -> bool {
        let upgrade = self
            .header("upgrade")
            .map(str::to_lowercase)
            .unwrap_or_default();
        let connection = self
            .header("connection")
            .map(str::to_lowercase)
            .unwrap_or_default();
        upgrade.contains("websocket") && connection.contains("upgrade")
    }
}
