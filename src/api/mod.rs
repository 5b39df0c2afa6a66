//! HTTP surface: shared state, handlers, and router assembly.

pub mod handlers;
pub mod routes;

use crate::ingest::OpenF1Client;
use crate::store::RaceStore;
use std::sync::Arc;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RaceStore>,
    pub openf1: Arc<OpenF1Client>,
}
