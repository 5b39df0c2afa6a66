//! Request handlers: parameter validation, core invocation, and HTTP
//! status mapping.
//!
//! Status taxonomy:
//! - 400: validation failure (negative `time_sec`, nothing ingested)
//! - 404: no events for the session up to the cutoff
//! - 502: the upstream data provider failed or returned an unusable shape
//! - 500: storage failure

use crate::api::AppState;
use crate::models::{
    DriverState, LeaderboardDebug, LeaderboardRow, RaceEvent, SessionSummary,
};
use crate::replay::{self, leaderboard};
use axum::{
    extract::{Query, State as AxumState},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{info, warn};

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (status, Json(json!({ "error": message })))
}

fn db_error(err: anyhow::Error) -> ApiError {
    warn!("database error: {err:#}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "database error")
}

fn provider_error(err: anyhow::Error) -> ApiError {
    warn!("provider error: {err:#}");
    error_response(StatusCode::BAD_GATEWAY, "upstream data provider failed")
}

fn default_session() -> String {
    "bahrain_demo".to_string()
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StateQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
    pub time_sec: f64,
    pub driver: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub session_id: String,
    pub time_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    pub state: BTreeMap<String, DriverState>,
}

pub async fn get_state(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<StateQuery>,
) -> ApiResult<StateResponse> {
    if q.time_sec < 0.0 {
        return Err(error_response(StatusCode::BAD_REQUEST, "time_sec must be >= 0"));
    }

    let events = state
        .store
        .load_events(&q.session_id, Some(q.time_sec))
        .map_err(db_error)?;
    if events.is_empty() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Session not found or no events loaded",
        ));
    }

    let snapshot = replay::replay(&events, q.time_sec);

    // Optional single-driver view, defaulting to the zero state for a
    // driver with no events yet.
    let snapshot = match &q.driver {
        Some(driver) => {
            let entry = snapshot.get(driver).cloned().unwrap_or_default();
            BTreeMap::from([(driver.clone(), entry)])
        }
        None => snapshot,
    };

    Ok(Json(StateResponse {
        session_id: q.session_id,
        time_sec: q.time_sec,
        driver: q.driver,
        state: snapshot,
    }))
}

// ---------------------------------------------------------------------------
// Leaderboard
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
    pub time_sec: f64,
    #[serde(default)]
    pub debug: bool,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub session_id: String,
    pub time_sec: f64,
    pub leaderboard: Vec<LeaderboardRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<LeaderboardDebug>,
}

pub async fn get_leaderboard(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<LeaderboardQuery>,
) -> ApiResult<LeaderboardResponse> {
    if q.time_sec < 0.0 {
        return Err(error_response(StatusCode::BAD_REQUEST, "time_sec must be >= 0"));
    }

    let events = state
        .store
        .load_events(&q.session_id, Some(q.time_sec))
        .map_err(db_error)?;
    if events.is_empty() {
        return Err(error_response(
            StatusCode::NOT_FOUND,
            "Session not found or no events loaded",
        ));
    }

    let snapshot = replay::replay(&events, q.time_sec);
    let driver_map = state.store.driver_map(&q.session_id).map_err(db_error)?;

    let rows = leaderboard::build_rows(&snapshot, &driver_map);
    let debug = q.debug.then(|| leaderboard::diagnostics(&rows));

    Ok(Json(LeaderboardResponse {
        session_id: q.session_id,
        time_sec: q.time_sec,
        leaderboard: rows,
        debug,
    }))
}

// ---------------------------------------------------------------------------
// Event log pass-throughs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
    pub until: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub session_id: String,
    pub until: Option<f64>,
    pub events: Vec<RaceEvent>,
}

pub async fn get_events(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<EventsQuery>,
) -> ApiResult<EventsResponse> {
    let events = state
        .store
        .load_events(&q.session_id, q.until)
        .map_err(db_error)?;
    Ok(Json(EventsResponse {
        session_id: q.session_id,
        until: q.until,
        events,
    }))
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

pub async fn get_sessions(AxumState(state): AxumState<AppState>) -> ApiResult<SessionsResponse> {
    let sessions = state.store.session_summaries().map_err(db_error)?;
    Ok(Json(SessionsResponse { sessions }))
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    #[serde(default = "default_session")]
    pub session_id: String,
}

pub async fn post_reset(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<SessionQuery>,
) -> ApiResult<Value> {
    state.store.clear_session(&q.session_id).map_err(db_error)?;
    Ok(Json(json!({ "ok": true, "session_id": q.session_id })))
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

fn sample_events() -> Vec<RaceEvent> {
    vec![
        RaceEvent::lap(10.0, "VER", 1),
        RaceEvent::lap(25.0, "LEC", 1),
        RaceEvent::pit(30.0, "VER", Some(Some(1))),
        RaceEvent::position(40.0, "VER", Some(1)),
    ]
}

pub async fn post_seed(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<SessionQuery>,
) -> ApiResult<Value> {
    let inserted = state
        .store
        .insert_events(&q.session_id, &sample_events())
        .map_err(db_error)?;

    if inserted == 0 {
        return Err(error_response(StatusCode::BAD_REQUEST, "Seed failed"));
    }

    Ok(Json(json!({ "session_id": q.session_id, "inserted": inserted })))
}

// ---------------------------------------------------------------------------
// OpenF1 ingestion
// ---------------------------------------------------------------------------

fn default_limit_laps() -> usize {
    500
}
fn default_limit_positions() -> usize {
    2000
}
fn default_limit_pits() -> usize {
    2000
}

#[derive(Debug, Deserialize)]
pub struct IngestQuery {
    pub session_id: String,
    pub openf1_session_key: u32,
    #[serde(default = "default_limit_laps")]
    pub limit_laps: usize,
    #[serde(default = "default_limit_positions")]
    pub limit_positions: usize,
    #[serde(default = "default_limit_pits")]
    pub limit_pits: usize,
}

#[derive(Debug, Serialize)]
pub struct IngestCounts {
    pub laps: usize,
    pub positions: usize,
    pub pits: usize,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub session_id: String,
    pub openf1_session_key: u32,
    pub inserted_total: usize,
    pub inserted: IngestCounts,
}

pub async fn post_ingest_openf1(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<IngestQuery>,
) -> ApiResult<IngestResponse> {
    info!(
        session_id = %q.session_id,
        openf1_session_key = q.openf1_session_key,
        "ingest started"
    );

    let session_start = state
        .openf1
        .fetch_session_start(q.openf1_session_key)
        .await
        .map_err(provider_error)?;

    let lap_events = state
        .openf1
        .fetch_lap_events(q.openf1_session_key, session_start, q.limit_laps)
        .await
        .map_err(provider_error)?;
    let pos_events = state
        .openf1
        .fetch_position_events(q.openf1_session_key, session_start, q.limit_positions)
        .await
        .map_err(provider_error)?;
    let pit_events = state
        .openf1
        .fetch_pit_events(q.openf1_session_key, session_start, q.limit_pits)
        .await
        .map_err(provider_error)?;

    let mut inserted_total = 0usize;
    for batch in [&lap_events, &pos_events, &pit_events] {
        inserted_total += state
            .store
            .insert_events(&q.session_id, batch)
            .map_err(db_error)?;
    }

    if inserted_total == 0 {
        warn!(
            session_id = %q.session_id,
            openf1_session_key = q.openf1_session_key,
            "ingest produced no events"
        );
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No events were ingested. Check session_key.",
        ));
    }

    info!(
        session_id = %q.session_id,
        total_inserted = inserted_total,
        "ingest finished"
    );

    Ok(Json(IngestResponse {
        session_id: q.session_id,
        openf1_session_key: q.openf1_session_key,
        inserted_total,
        inserted: IngestCounts {
            laps: lap_events.len(),
            positions: pos_events.len(),
            pits: pit_events.len(),
        },
    }))
}

#[derive(Debug, Deserialize)]
pub struct IngestDriversQuery {
    pub session_id: String,
    pub openf1_session_key: u32,
}

#[derive(Debug, Serialize)]
pub struct IngestDriversResponse {
    pub session_id: String,
    pub openf1_session_key: u32,
    pub upserted: usize,
}

pub async fn post_ingest_openf1_drivers(
    AxumState(state): AxumState<AppState>,
    Query(q): Query<IngestDriversQuery>,
) -> ApiResult<IngestDriversResponse> {
    let drivers = state
        .openf1
        .fetch_drivers(q.openf1_session_key)
        .await
        .map_err(provider_error)?;

    let upserted = state
        .store
        .upsert_drivers(&q.session_id, &drivers)
        .map_err(db_error)?;

    if upserted == 0 {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No drivers were ingested. Check session_key.",
        ));
    }

    Ok(Json(IngestDriversResponse {
        session_id: q.session_id,
        openf1_session_key: q.openf1_session_key,
        upserted,
    }))
}
