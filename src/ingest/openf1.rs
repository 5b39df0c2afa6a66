//! OpenF1 REST client.
//!
//! Fetches laps, position updates, pit stops, and driver metadata for a
//! session and normalizes them into [`RaceEvent`]s. OpenF1 timestamps are
//! ISO date strings; they are converted to UTC and then to seconds since
//! session start so everything runs on a single timeline.
//!
//! Fetching and normalization are split: the `normalize_*` functions are
//! pure and unit-tested without the network.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::models::{RaceEvent, RawDriver};

pub const OPENF1_API_BASE: &str = "https://api.openf1.org/v1";

#[derive(Clone)]
pub struct OpenF1Client {
    client: Client,
    base_url: String,
}

impl OpenF1Client {
    pub fn new() -> Result<Self> {
        Self::with_base_url(OPENF1_API_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .context("Failed to build OpenF1 client")?;

        Ok(Self { client, base_url })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        session_key: u32,
    ) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .query(&[("session_key", session_key.to_string())])
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("GET {path} {}: {}", status, text));
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse {path} response"))
    }

    /// Session start instant, the zero point of the event timeline.
    pub async fn fetch_session_start(&self, session_key: u32) -> Result<DateTime<Utc>> {
        let sessions: Vec<RawSession> = self.get_json("/sessions", session_key).await?;
        let date_start = sessions
            .into_iter()
            .next()
            .and_then(|s| s.date_start)
            .ok_or_else(|| anyhow::anyhow!("Session not found or missing date_start"))?;
        parse_iso(&date_start)
    }

    pub async fn fetch_lap_events(
        &self,
        session_key: u32,
        session_start: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RaceEvent>> {
        let laps: Vec<RawLap> = self.get_json("/laps", session_key).await?;
        Ok(normalize_laps(&laps, session_start, limit))
    }

    pub async fn fetch_position_events(
        &self,
        session_key: u32,
        session_start: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RaceEvent>> {
        let positions: Vec<RawPosition> = self.get_json("/position", session_key).await?;
        Ok(normalize_positions(&positions, session_start, limit))
    }

    pub async fn fetch_pit_events(
        &self,
        session_key: u32,
        session_start: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<RaceEvent>> {
        let pits: Vec<RawPit> = self.get_json("/pit", session_key).await?;
        Ok(normalize_pits(&pits, session_start, limit))
    }

    pub async fn fetch_drivers(&self, session_key: u32) -> Result<Vec<RawDriver>> {
        self.get_json("/drivers", session_key).await
    }
}

#[derive(Debug, Deserialize)]
struct RawSession {
    #[serde(default)]
    date_start: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLap {
    pub date_start: Option<String>,
    pub driver_number: Option<i64>,
    pub lap_number: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPosition {
    pub date: Option<String>,
    pub driver_number: Option<i64>,
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawPit {
    pub date: Option<String>,
    pub driver_number: Option<i64>,
    pub pit_count: Option<u32>,
}

/// Parse an ISO timestamp, accepting `Z`, explicit offsets, and naive
/// timestamps (assumed UTC — OpenF1 omits the zone on some rows).
pub fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .with_context(|| format!("Unparseable timestamp: {s}"))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

fn secs_since(start: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - start).num_milliseconds() as f64 / 1000.0
}

/// Records missing a timestamp or driver number (or with an unparseable
/// timestamp) are skipped rather than turned into malformed events.
pub fn normalize_laps(
    items: &[RawLap],
    session_start: DateTime<Utc>,
    limit: usize,
) -> Vec<RaceEvent> {
    items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let t = parse_iso(item.date_start.as_deref()?).ok()?;
            let driver = item.driver_number?;
            let lap = item.lap_number?;
            Some(RaceEvent::lap(
                secs_since(session_start, t),
                driver.to_string(),
                lap,
            ))
        })
        .collect()
}

pub fn normalize_positions(
    items: &[RawPosition],
    session_start: DateTime<Utc>,
    limit: usize,
) -> Vec<RaceEvent> {
    items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let t = parse_iso(item.date.as_deref()?).ok()?;
            let driver = item.driver_number?;
            Some(RaceEvent::position(
                secs_since(session_start, t),
                driver.to_string(),
                item.position,
            ))
        })
        .collect()
}

/// Pit records always carry an explicit (possibly null) `pit_count`, so the
/// resulting events overwrite the running total rather than increment it.
pub fn normalize_pits(
    items: &[RawPit],
    session_start: DateTime<Utc>,
    limit: usize,
) -> Vec<RaceEvent> {
    items
        .iter()
        .take(limit)
        .filter_map(|item| {
            let t = parse_iso(item.date.as_deref()?).ok()?;
            let driver = item.driver_number?;
            Some(RaceEvent::pit(
                secs_since(session_start, t),
                driver.to_string(),
                Some(item.pit_count),
            ))
        })
        .collect()
}
