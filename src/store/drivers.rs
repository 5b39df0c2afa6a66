//! Driver metadata: normalizing upsert and per-session lookup.

use super::RaceStore;
use crate::models::{DriverMeta, RawDriver};
use anyhow::Result;
use rusqlite::params;
use std::collections::HashMap;

/// Normalize a raw provider record into `(driver_id, meta)`.
///
/// Providers disagree on field names: the id comes from `driver_number`
/// (OpenF1) or `driver`, the display name from title-cased first + last
/// names with `full_name`/`name` as fallbacks, and the three-letter code
/// from `abbreviation`/`code` or the last name's first three letters.
/// Records with no usable id are dropped.
pub fn normalize_driver(raw: &RawDriver) -> Option<(String, DriverMeta)> {
    let driver_id = raw
        .driver_number
        .map(|n| n.to_string())
        .or_else(|| raw.driver.clone())?;

    let name = match (&raw.first_name, &raw.last_name) {
        (Some(first), Some(last)) => Some(format!("{} {}", title_case(first), title_case(last))),
        _ => raw
            .full_name
            .as_deref()
            .or(raw.name.as_deref())
            .map(title_case),
    };

    let code = raw
        .abbreviation
        .clone()
        .or_else(|| raw.code.clone())
        .or_else(|| {
            raw.last_name
                .as_deref()
                .map(|last| last.chars().take(3).collect::<String>().to_uppercase())
        });

    Some((driver_id, DriverMeta { code, name }))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

impl RaceStore {
    /// Insert or update driver rows for a session. Returns how many raw
    /// records were processed (records without a driver id are skipped).
    pub fn upsert_drivers(&self, session_id: &str, rows: &[RawDriver]) -> Result<usize> {
        let normalized: Vec<(String, DriverMeta)> =
            rows.iter().filter_map(normalize_driver).collect();
        if normalized.is_empty() {
            return Ok(0);
        }

        let conn = self.lock();
        conn.execute("BEGIN IMMEDIATE", [])?;

        let mut processed = 0usize;
        {
            let mut stmt = conn.prepare_cached(
                "INSERT INTO drivers (session_id, driver, code, name)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(session_id, driver) DO UPDATE SET
                     code = excluded.code,
                     name = excluded.name",
            )?;
            for (driver, meta) in &normalized {
                stmt.execute(params![session_id, driver, meta.code, meta.name])?;
                processed += 1;
            }
        }

        conn.execute("COMMIT", [])?;
        Ok(processed)
    }

    /// Mapping like `{"1": {code: "VER", name: "Max Verstappen"}, ...}`.
    pub fn driver_map(&self, session_id: &str) -> Result<HashMap<String, DriverMeta>> {
        let conn = self.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT driver, code, name FROM drivers WHERE session_id = ?1",
        )?;

        let map = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    DriverMeta {
                        code: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(map)
    }
}
