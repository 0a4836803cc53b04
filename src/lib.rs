//! # pipechat
//!
//! Real-time broadcast chat server that speaks the WebSocket wire protocol
//! (RFC 6455) directly over raw TCP — handshake, frame codec, and masking
//! are all implemented here rather than taken from a protocol library.
//!
//! ## Architecture
//!
//! ```text
//! Browser clients (HTTP, WebSocket)
//!     │
//!     ├── Acceptor (server)           one task per connection
//!     │
//!     ├── HTTP collaborator (http/)   request parse, upgrade detect, static files
//!     │
//!     ├── ConnectionSession (ws/)     handshake → frame loop → close callback
//!     │     ├── HandshakeNegotiator
//!     │     └── FrameCodec
//!     │
//!     └── Chat layer (chat/)
//!           ├── ChatHandler           USERNAME|BODY|TIMESTAMP dispatch
//!           └── ClientRegistry        synchronized map + broadcast fan-out
//! ```
//!
//! Every client→server text frame carries `USERNAME|BODY|TIMESTAMP`; the
//! server answers with `SYSTEM|text|HH:MM:SS` notices, `USERLIST|n|names`
//! rosters, and verbatim relays of chat messages to the whole room.

pub mod app_state;
pub mod chat;
pub mod config;
pub mod error;
pub mod http;
pub mod server;
pub mod ws;
