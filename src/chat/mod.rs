//! Chat domain: client identity, the joined-client registry, and the
//! pipe-delimited application protocol.

pub mod client_id;
pub mod handler;
pub mod registry;

pub use client_id::ClientId;
pub use handler::ChatHandler;
pub use registry::ClientRegistry;
