//! Leaderboard derivation over a replay snapshot.

use crate::models::{DriverMeta, LeaderboardDebug, LeaderboardRow};
use crate::replay::StateMap;
use std::collections::{BTreeSet, HashMap, HashSet};

const DEBUG_SAMPLE_CAP: usize = 20;

/// Materialize, infer, and rank leaderboard rows from a snapshot.
///
/// Rows with a known position sort ascending by it; rows whose position is
/// still unknown after inference sort after all of them, keeping the
/// snapshot's driver-id order among themselves.
pub fn build_rows(state: &StateMap, drivers: &HashMap<String, DriverMeta>) -> Vec<LeaderboardRow> {
    let mut rows: Vec<LeaderboardRow> = state
        .iter()
        .map(|(driver, info)| {
            let meta = drivers.get(driver);
            LeaderboardRow {
                driver: driver.clone(),
                code: meta.and_then(|m| m.code.clone()),
                name: meta.and_then(|m| m.name.clone()),
                position: info.position,
                lap: info.lap,
                pits: info.pits,
            }
        })
        .collect();

    infer_missing_leader(&mut rows);

    // Stable: null-position rows keep their relative order at the back.
    rows.sort_by_key(|r| (r.position.is_none(), r.position.unwrap_or(u32::MAX)));
    rows
}

/// Position feeds sometimes never mention the leader. If exactly one row is
/// missing a position and nobody is marked P1, that row must be the leader.
/// Zero or multiple missing rows, or a known P1, leave everything untouched.
fn infer_missing_leader(rows: &mut [LeaderboardRow]) {
    let known: HashSet<u32> = rows.iter().filter_map(|r| r.position).collect();

    let mut missing = rows.iter_mut().filter(|r| r.position.is_none());
    let (Some(sole), None) = (missing.next(), missing.next()) else {
        return;
    };

    if !known.contains(&1) {
        sole.position = Some(1);
    }
}

/// Post-inference diagnostics for the `?debug=true` response.
pub fn diagnostics(rows: &[LeaderboardRow]) -> LeaderboardDebug {
    let known: BTreeSet<u32> = rows.iter().filter_map(|r| r.position).collect();
    let mut sample: Vec<u32> = known.iter().copied().collect();
    sample.truncate(DEBUG_SAMPLE_CAP);

    LeaderboardDebug {
        known_positions_count: known.len(),
        known_positions_sample: sample,
        missing_position_drivers: rows
            .iter()
            .filter(|r| r.position.is_none())
            .map(|r| r.driver.clone())
            .collect(),
    }
}
