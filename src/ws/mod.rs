//! WebSocket protocol engine: handshake, frame codec, session lifecycle.
//!
//! Implements the server side of RFC 6455 by hand. No fragmentation
//! reassembly, no extensions, no TLS — single final frames only.

pub mod frame;
pub mod handshake;
pub mod session;
