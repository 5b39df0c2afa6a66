//! Router assembly.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::{handlers, AppState};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/state", get(handlers::get_state))
        .route("/leaderboard", get(handlers::get_leaderboard))
        .route("/events", get(handlers::get_events))
        .route("/sessions", get(handlers::get_sessions))
        .route("/seed", post(handlers::post_seed))
        .route("/reset", post(handlers::post_reset))
        .route("/ingest/openf1", post(handlers::post_ingest_openf1))
        .route(
            "/ingest/openf1/drivers",
            post(handlers::post_ingest_openf1_drivers),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
