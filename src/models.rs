//! Wire and domain types shared across the service.
//!
//! The event payload is an internally tagged enum so that each event kind
//! carries exactly the fields it needs. The replay fold never has to check
//! for missing fields: anything that deserialized is well-formed.

use serde::{Deserialize, Deserializer, Serialize};

/// A single timestamped race event.
///
/// Wire/storage shape (JSON):
/// `{time_sec, driver, type: "LAP"|"POSITION"|"PIT", lap?, position?, pit_count?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEvent {
    /// Seconds elapsed since session start.
    pub time_sec: f64,
    /// Driver id (OpenF1 driver number as a string, or a seed code like "VER").
    pub driver: String,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EventKind {
    #[serde(rename = "LAP")]
    Lap { lap: u32 },
    #[serde(rename = "POSITION")]
    Position {
        #[serde(default)]
        position: Option<u32>,
    },
    /// Pit stop. Some feeds report a running `pit_count` total, others emit
    /// bare pit events. The outer Option tracks field *presence*:
    /// - absent         -> increment pits by one
    /// - present, null  -> overwrite pits with 0
    /// - present, n     -> overwrite pits with n
    #[serde(rename = "PIT")]
    Pit {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "double_option"
        )]
        pit_count: Option<Option<u32>>,
    },
}

/// Keeps "present but null" distinguishable from "absent" through serde.
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<u32>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer).map(Some)
}

impl RaceEvent {
    pub fn lap(time_sec: f64, driver: impl Into<String>, lap: u32) -> Self {
        Self {
            time_sec,
            driver: driver.into(),
            kind: EventKind::Lap { lap },
        }
    }

    pub fn position(time_sec: f64, driver: impl Into<String>, position: Option<u32>) -> Self {
        Self {
            time_sec,
            driver: driver.into(),
            kind: EventKind::Position { position },
        }
    }

    pub fn pit(time_sec: f64, driver: impl Into<String>, pit_count: Option<Option<u32>>) -> Self {
        Self {
            time_sec,
            driver: driver.into(),
            kind: EventKind::Pit { pit_count },
        }
    }

    /// Tag string as stored in the events table's `type` column.
    pub fn kind_tag(&self) -> &'static str {
        match self.kind {
            EventKind::Lap { .. } => "LAP",
            EventKind::Position { .. } => "POSITION",
            EventKind::Pit { .. } => "PIT",
        }
    }
}

/// Per-driver snapshot produced by the replay fold. Never persisted;
/// recomputed from the event log on every query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverState {
    pub lap: u32,
    pub position: Option<u32>,
    pub pits: u32,
}

/// Display metadata for a driver (leaderboard enrichment only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverMeta {
    pub code: Option<String>,
    pub name: Option<String>,
}

/// Raw driver record as returned by the provider's /drivers endpoint.
/// Field names vary between data sources, hence the fallback chains in
/// [`crate::store::normalize_driver`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDriver {
    pub driver_number: Option<i64>,
    pub driver: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub code: Option<String>,
}

/// One ranked leaderboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub driver: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub position: Option<u32>,
    pub lap: u32,
    pub pits: u32,
}

/// Diagnostic payload for `?debug=true`, computed after inference ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardDebug {
    pub known_positions_count: usize,
    /// Distinct known positions, ascending, capped at 20.
    pub known_positions_sample: Vec<u32>,
    pub missing_position_drivers: Vec<String>,
}

/// Per-session aggregate for the /sessions listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub event_count: i64,
    /// `[min_time_sec, max_time_sec]` over the session's events.
    pub time_range: [f64; 2],
}
