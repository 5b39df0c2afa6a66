//! SQLite persistence for the event log and driver metadata.
//!
//! One connection, guarded by a `parking_lot::Mutex`, shared behind `Arc`.
//! WAL mode keeps reads cheap while ingestion writes. The store is passed
//! explicitly through `AppState` so the replay core can be tested with no
//! storage dependency at all.

mod drivers;
mod events;

pub use drivers::normalize_driver;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{Connection, OpenFlags};
use std::sync::Arc;
use tracing::{info, warn};

const SCHEMA_SQL: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -64000;
PRAGMA temp_store = MEMORY;

-- Append-only event log. The full event is stored as JSON in `payload`
-- to keep the schema simple; the typed columns exist for indexing.
CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id TEXT NOT NULL,
    time_sec REAL NOT NULL,
    driver TEXT NOT NULL,
    type TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_session_time
    ON events(session_id, time_sec);

CREATE INDEX IF NOT EXISTS idx_events_session_driver_time
    ON events(session_id, driver, time_sec);

-- Driver metadata (code + full name) so responses can show nicer labels
-- than just the numeric driver id.
CREATE TABLE IF NOT EXISTS drivers (
    session_id TEXT NOT NULL,
    driver TEXT NOT NULL,
    code TEXT,
    name TEXT,
    PRIMARY KEY (session_id, driver)
);

CREATE INDEX IF NOT EXISTS idx_drivers_session
    ON drivers(session_id);
"#;

/// Handle over the events + drivers tables.
pub struct RaceStore {
    conn: Arc<Mutex<Connection>>,
}

impl RaceStore {
    pub fn new(db_path: &str) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX; // we handle our own locking

        let conn = Connection::open_with_flags(db_path, flags)
            .with_context(|| format!("Failed to open database at {}", db_path))?;

        conn.execute_batch(SCHEMA_SQL)
            .context("Failed to initialize database schema")?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap_or_default();
        if journal_mode.to_lowercase() != "wal" {
            warn!("WAL mode not active, journal_mode = {}", journal_mode);
        }

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))
            .unwrap_or(0);
        info!("Event log opened at {} ({} events)", db_path, count);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(crate) fn lock(&self) -> parking_lot::MutexGuard<'_, Connection> {
        self.conn.lock()
    }
}
