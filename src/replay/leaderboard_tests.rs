//! Tests for leaderboard ranking and the single-missing-position inference.

use super::leaderboard::{build_rows, diagnostics};
use super::StateMap;
use crate::models::{DriverMeta, DriverState};
use std::collections::HashMap;

fn entry(lap: u32, position: Option<u32>, pits: u32) -> DriverState {
    DriverState { lap, position, pits }
}

fn state_of(entries: &[(&str, Option<u32>)]) -> StateMap {
    entries
        .iter()
        .map(|(driver, position)| (driver.to_string(), entry(1, *position, 0)))
        .collect()
}

fn no_meta() -> HashMap<String, DriverMeta> {
    HashMap::new()
}

#[test]
fn sole_missing_driver_becomes_leader() {
    let state = state_of(&[("A", None), ("B", Some(2))]);
    let rows = build_rows(&state, &no_meta());

    assert_eq!(rows[0].driver, "A");
    assert_eq!(rows[0].position, Some(1));
    assert_eq!(rows[1].position, Some(2));
}

#[test]
fn no_inference_with_two_missing() {
    let state = state_of(&[("A", None), ("B", None)]);
    let rows = build_rows(&state, &no_meta());
    assert!(rows.iter().all(|r| r.position.is_none()));
}

#[test]
fn no_inference_when_leader_already_known() {
    let state = state_of(&[("A", None), ("B", Some(1))]);
    let rows = build_rows(&state, &no_meta());

    assert_eq!(rows[0].driver, "B");
    assert_eq!(rows[0].position, Some(1));
    assert_eq!(rows[1].driver, "A");
    assert_eq!(rows[1].position, None);
}

#[test]
fn no_inference_when_nothing_missing() {
    let state = state_of(&[("A", Some(2)), ("B", Some(3))]);
    let rows = build_rows(&state, &no_meta());
    assert_eq!(rows[0].position, Some(2));
    assert_eq!(rows[1].position, Some(3));
}

#[test]
fn known_positions_sort_ascending_with_unknown_last() {
    let state = state_of(&[
        ("A", Some(3)),
        ("B", None),
        ("C", Some(1)),
        ("D", None),
        ("E", Some(2)),
    ]);
    let rows = build_rows(&state, &no_meta());

    let order: Vec<&str> = rows.iter().map(|r| r.driver.as_str()).collect();
    // Two missing rows: no inference, and they keep driver-id order at the back.
    assert_eq!(order, vec!["C", "E", "A", "B", "D"]);
}

#[test]
fn metadata_enriches_rows_and_is_null_when_absent() {
    let mut state = StateMap::new();
    state.insert("1".to_string(), entry(12, Some(1), 2));
    state.insert("16".to_string(), entry(12, Some(2), 1));

    let mut meta = HashMap::new();
    meta.insert(
        "1".to_string(),
        DriverMeta {
            code: Some("VER".to_string()),
            name: Some("Max Verstappen".to_string()),
        },
    );

    let rows = build_rows(&state, &meta);
    assert_eq!(rows[0].code.as_deref(), Some("VER"));
    assert_eq!(rows[0].name.as_deref(), Some("Max Verstappen"));
    assert_eq!(rows[1].code, None);
    assert_eq!(rows[1].name, None);
}

#[test]
fn empty_state_yields_empty_leaderboard() {
    let rows = build_rows(&StateMap::new(), &no_meta());
    assert!(rows.is_empty());
}

#[test]
fn diagnostics_are_computed_after_inference() {
    // Sole missing driver gets P1 assigned, so nothing is missing afterwards.
    let state = state_of(&[("A", None), ("B", Some(2))]);
    let rows = build_rows(&state, &no_meta());
    let debug = diagnostics(&rows);

    assert_eq!(debug.known_positions_count, 2);
    assert_eq!(debug.known_positions_sample, vec![1, 2]);
    assert!(debug.missing_position_drivers.is_empty());
}

#[test]
fn diagnostics_list_remaining_missing_drivers() {
    let state = state_of(&[("A", None), ("B", None), ("C", Some(4))]);
    let rows = build_rows(&state, &no_meta());
    let debug = diagnostics(&rows);

    assert_eq!(debug.known_positions_count, 1);
    assert_eq!(debug.known_positions_sample, vec![4]);
    assert_eq!(debug.missing_position_drivers, vec!["A", "B"]);
}

#[test]
fn diagnostics_sample_is_capped_at_twenty() {
    let entries: Vec<(String, DriverState)> = (1..=25)
        .map(|p| (format!("D{p:02}"), entry(1, Some(p), 0)))
        .collect();
    let state: StateMap = entries.into_iter().collect();

    let rows = build_rows(&state, &no_meta());
    let debug = diagnostics(&rows);

    assert_eq!(debug.known_positions_count, 25);
    assert_eq!(debug.known_positions_sample.len(), 20);
    assert_eq!(debug.known_positions_sample[0], 1);
    assert_eq!(debug.known_positions_sample[19], 20);
}
