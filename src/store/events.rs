//! Event log access: append, load, clear, and per-session summaries.

use super::RaceStore;
use crate::models::{RaceEvent, SessionSummary};
use anyhow::{Context, Result};
use rusqlite::params;
use tracing::debug;

impl RaceStore {
    /// Append a batch of events for a session inside one transaction.
    /// Append-only, no dedup. Returns the number of rows inserted.
    pub fn insert_events(&self, session_id: &str, events: &[RaceEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        // Serialize outside the lock.
        let serialized: Vec<(&RaceEvent, String)> = events
            .iter()
            .map(|e| serde_json::to_string(e).map(|json| (e, json)))
            .collect::<Result<_, _>>()
            .context("Failed to serialize event payload")?;

        let conn = self.lock();
        conn.execute("BEGIN IMMEDIATE", [])?;

        let mut inserted = 0usize;
        {
            let mut stmt = conn.prepare_cached(
                "INSERT INTO events (session_id, time_sec, driver, type, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (event, payload) in &serialized {
                inserted += stmt.execute(params![
                    session_id,
                    event.time_sec,
                    &event.driver,
                    event.kind_tag(),
                    payload,
                ])?;
            }
        }

        conn.execute("COMMIT", [])?;
        debug!(session_id, inserted, "appended events");
        Ok(inserted)
    }

    /// Load a session's events, optionally only up to a timestamp
    /// (inclusive), ascending by `(time_sec, id)` so that the replay
    /// tie-break is insertion order.
    ///
    /// A stored payload that fails to parse aborts the load: silently
    /// skipping it would mask a data-quality bug upstream.
    pub fn load_events(&self, session_id: &str, until: Option<f64>) -> Result<Vec<RaceEvent>> {
        let conn = self.lock();

        let mut rows: Vec<String> = Vec::new();
        match until {
            None => {
                let mut stmt = conn.prepare_cached(
                    "SELECT payload FROM events WHERE session_id = ?1
                     ORDER BY time_sec ASC, id ASC",
                )?;
                let mapped = stmt.query_map(params![session_id], |row| row.get::<_, String>(0))?;
                for payload in mapped {
                    rows.push(payload?);
                }
            }
            Some(cutoff) => {
                let mut stmt = conn.prepare_cached(
                    "SELECT payload FROM events WHERE session_id = ?1 AND time_sec <= ?2
                     ORDER BY time_sec ASC, id ASC",
                )?;
                let mapped =
                    stmt.query_map(params![session_id, cutoff], |row| row.get::<_, String>(0))?;
                for payload in mapped {
                    rows.push(payload?);
                }
            }
        }
        drop(conn);

        rows.iter()
            .map(|payload| {
                serde_json::from_str(payload)
                    .with_context(|| format!("Malformed event payload in session {session_id}"))
            })
            .collect()
    }

    /// Delete all events for a session (used by /reset).
    pub fn clear_session(&self, session_id: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM events WHERE session_id = ?1", params![session_id])?;
        Ok(())
    }

    /// Event count and time range per known session.
    pub fn session_summaries(&self) -> Result<Vec<SessionSummary>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT session_id, COUNT(*), MIN(time_sec), MAX(time_sec)
             FROM events GROUP BY session_id ORDER BY session_id",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(SessionSummary {
                    session_id: row.get(0)?,
                    event_count: row.get(1)?,
                    time_range: [row.get(2)?, row.get(3)?],
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::RaceEvent;
    use crate::store::test_support::temp_store;

    #[test]
    fn insert_then_load_round_trips_in_time_order() {
        let (_dir, store) = temp_store();
        let events = vec![
            RaceEvent::lap(25.0, "LEC", 1),
            RaceEvent::lap(10.0, "VER", 1),
            RaceEvent::pit(30.0, "VER", Some(Some(1))),
        ];
        assert_eq!(store.insert_events("s1", &events).unwrap(), 3);

        let loaded = store.load_events("s1", None).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0], RaceEvent::lap(10.0, "VER", 1));
        assert_eq!(loaded[1], RaceEvent::lap(25.0, "LEC", 1));
        assert_eq!(loaded[2], RaceEvent::pit(30.0, "VER", Some(Some(1))));
    }

    #[test]
    fn until_filter_is_inclusive() {
        let (_dir, store) = temp_store();
        store
            .insert_events(
                "s1",
                &[RaceEvent::lap(10.0, "VER", 1), RaceEvent::lap(20.0, "VER", 2)],
            )
            .unwrap();

        let loaded = store.load_events("s1", Some(10.0)).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].time_sec, 10.0);
    }

    #[test]
    fn equal_timestamps_load_in_insertion_order() {
        let (_dir, store) = temp_store();
        store
            .insert_events("s1", &[RaceEvent::lap(30.0, "VER", 2)])
            .unwrap();
        store
            .insert_events("s1", &[RaceEvent::lap(30.0, "VER", 5)])
            .unwrap();

        let loaded = store.load_events("s1", None).unwrap();
        assert_eq!(loaded[0], RaceEvent::lap(30.0, "VER", 2));
        assert_eq!(loaded[1], RaceEvent::lap(30.0, "VER", 5));
    }

    #[test]
    fn clear_session_is_scoped() {
        let (_dir, store) = temp_store();
        store
            .insert_events("s1", &[RaceEvent::lap(1.0, "VER", 1)])
            .unwrap();
        store
            .insert_events("s2", &[RaceEvent::lap(2.0, "LEC", 1)])
            .unwrap();

        store.clear_session("s1").unwrap();
        assert!(store.load_events("s1", None).unwrap().is_empty());
        assert_eq!(store.load_events("s2", None).unwrap().len(), 1);
    }

    #[test]
    fn summaries_cover_count_and_time_range() {
        let (_dir, store) = temp_store();
        store
            .insert_events(
                "s1",
                &[
                    RaceEvent::lap(10.0, "VER", 1),
                    RaceEvent::lap(40.0, "VER", 2),
                ],
            )
            .unwrap();
        store
            .insert_events("s2", &[RaceEvent::lap(5.0, "LEC", 1)])
            .unwrap();

        let summaries = store.session_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].session_id, "s1");
        assert_eq!(summaries[0].event_count, 2);
        assert_eq!(summaries[0].time_range, [10.0, 40.0]);
        assert_eq!(summaries[1].session_id, "s2");
        assert_eq!(summaries[1].time_range, [5.0, 5.0]);
    }

    #[test]
    fn empty_batch_inserts_nothing() {
        let (_dir, store) = temp_store();
        assert_eq!(store.insert_events("s1", &[]).unwrap(), 0);
    }
}
