//! Pitwall Backend Library
//!
//! Exposes the replay core and its collaborators for use by the binary
//! and by integration tests (which drive the router directly).

pub mod api;
pub mod ingest;
pub mod models;
pub mod replay;
pub mod store;
