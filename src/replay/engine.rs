//! The replay fold.
//!
//! # Determinism contract
//!
//! `replay` sorts by `time_sec` with a *stable* sort, so events sharing a
//! timestamp apply in the order the caller supplied them. The store loads
//! events `ORDER BY time_sec, id`, which makes the effective tie-break
//! insertion order. Given the same event set and cutoff, the result is
//! always identical, independent of prior queries.

use crate::models::{DriverState, EventKind, RaceEvent};
use std::collections::BTreeMap;

/// Driver id -> snapshot. A `BTreeMap` keeps iteration (and therefore the
/// leaderboard's pre-sort row order) deterministic.
pub type StateMap = BTreeMap<String, DriverState>;

/// Apply one event to the state map, default-initializing the driver on
/// first reference.
pub fn apply_event(state: &mut StateMap, event: &RaceEvent) {
    let entry = state.entry(event.driver.clone()).or_default();

    match &event.kind {
        // Absolute overwrites, not increments: feeds report totals.
        EventKind::Lap { lap } => entry.lap = *lap,
        EventKind::Position { position } => entry.position = *position,
        EventKind::Pit { pit_count } => match pit_count {
            // Running total from the feed wins, null counting as 0.
            Some(count) => entry.pits = count.unwrap_or(0),
            // Bare pit event: one more stop.
            None => entry.pits += 1,
        },
    }
}

/// Rebuild per-driver state by folding every event with
/// `time_sec <= target_time_sec`, in ascending time order.
pub fn replay(events: &[RaceEvent], target_time_sec: f64) -> StateMap {
    let mut ordered: Vec<&RaceEvent> = events.iter().collect();
    ordered.sort_by(|a, b| a.time_sec.total_cmp(&b.time_sec));

    let mut state = StateMap::new();
    for event in ordered {
        if event.time_sec > target_time_sec {
            break;
        }
        apply_event(&mut state, event);
    }
    state
}
