//! HTTP collaborator: request parsing, upgrade detection, static files.
//!
//! The chat core never speaks HTTP itself. This module hands it a parsed
//! upgrade request and answers everything else (the bundled browser client)
//! directly.

pub mod request;
pub mod static_files;

pub use request::Request;
