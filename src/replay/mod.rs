//! Replay core: the deterministic fold that turns an event log into a
//! point-in-time state snapshot, plus the leaderboard derivation on top.
//!
//! Everything in here is pure and synchronous. No I/O, no locks, no clock:
//! state is a function of (event set, cutoff time), recomputed per query.

pub mod engine;
pub mod leaderboard;

#[cfg(test)]
mod leaderboard_tests;

pub use engine::{apply_event, replay, StateMap};
