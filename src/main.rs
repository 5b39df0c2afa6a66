//! Pitwall - F1 Race Replay API
//!
//! Loads race events (laps / positions / pit stops) into SQLite, either
//! from the OpenF1 API or seeded manually, then rebuilds the race state
//! and leaderboard at a requested timestamp.

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pitwall_backend::{
    api::{routes, AppState},
    ingest::{openf1::OPENF1_API_BASE, OpenF1Client},
    store::RaceStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("Pitwall replay API starting");

    let db_path = resolve_data_path(
        env::var("DB_PATH").or_else(|_| env::var("DATABASE_PATH")).ok(),
        "pitwall.db",
    );
    let store = Arc::new(RaceStore::new(&db_path)?);
    info!("Database initialized at: {}", db_path);

    let openf1_base =
        env::var("OPENF1_BASE_URL").unwrap_or_else(|_| OPENF1_API_BASE.to_string());
    let openf1 = Arc::new(OpenF1Client::with_base_url(openf1_base)?);

    let app = routes::router(AppState { store, openf1 });

    let port = env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(3000);
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pitwall_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    // Default to the crate directory so running from elsewhere doesn't
    // accidentally create a new empty DB in a different working directory.
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return base.join(default_filename).to_string_lossy().to_string();
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the manifest dir for
    // runs with --manifest-path from elsewhere.
    let _ = dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}
