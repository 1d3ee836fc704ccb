//! SQLite extraction - reads raw location fixes out of a pulled database
//!
//! Defensive filtering lives here: rows with NULL fields or unconvertible
//! timestamps are skipped so the detector downstream only ever sees
//! complete fixes.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::types::LocationFix;
use crate::infra::Config;

/// Read location fixes recorded at or after `since`, oldest first.
///
/// Timestamps in the source are epoch milliseconds; table and column names
/// come from the `[database]` configuration section.
pub fn read_location_fixes(
    db_path: &Path,
    config: &Config,
    since: DateTime<Utc>,
) -> Result<Vec<LocationFix>> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;

    ensure_table_exists(&conn, config.db_table())?;

    let query = format!(
        "SELECT {ts}, {lat}, {lon} FROM {table} WHERE {ts} >= ?1 ORDER BY {ts} ASC",
        ts = config.timestamp_column(),
        lat = config.latitude_column(),
        lon = config.longitude_column(),
        table = config.db_table(),
    );

    let mut stmt = conn.prepare(&query).context("failed to prepare location query")?;
    let rows = stmt
        .query_map([since.timestamp_millis()], |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?,
                row.get::<_, Option<f64>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })
        .context("location query failed")?;

    let mut fixes = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        let (ts, lat, lon) = row.context("failed to read location row")?;
        match (ts.and_then(timestamp_from_millis), lat, lon) {
            (Some(timestamp), Some(latitude), Some(longitude)) => {
                fixes.push(LocationFix { timestamp, latitude, longitude });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, "location_rows_with_null_fields_skipped");
    }
    info!(count = fixes.len(), db = %db_path.display(), "location_fixes_extracted");
    Ok(fixes)
}

/// Fail with a distinct error when the configured table is missing
fn ensure_table_exists(conn: &Connection, table: &str) -> Result<()> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )
        .context("failed to check table existence")?;

    if !exists {
        bail!("table '{}' not found in database", table);
    }
    Ok(())
}

/// Epoch milliseconds to a UTC timestamp; out-of-range values yield None
fn timestamp_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn create_locations_db(path: &Path) -> Connection {
        let conn = Connection::open(path).unwrap();
        conn.execute(
            "CREATE TABLE locations (
                _id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER,
                latitude REAL,
                longitude REAL
            )",
            [],
        )
        .unwrap();
        conn
    }

    fn insert(conn: &Connection, ts: Option<i64>, lat: Option<f64>, lon: Option<f64>) {
        conn.execute(
            "INSERT INTO locations (timestamp, latitude, longitude) VALUES (?1, ?2, ?3)",
            rusqlite::params![ts, lat, lon],
        )
        .unwrap();
    }

    #[test]
    fn test_reads_rows_in_timestamp_order() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("locations.db");
        let conn = create_locations_db(&db_path);

        let now = Utc::now();
        let t0 = now.timestamp_millis();
        // Inserted out of order; the query sorts ascending
        insert(&conn, Some(t0 + 120_000), Some(37.78), Some(-122.41));
        insert(&conn, Some(t0), Some(37.77), Some(-122.42));
        insert(&conn, Some(t0 + 60_000), Some(37.775), Some(-122.415));
        drop(conn);

        let config = Config::default();
        let since = now - Duration::days(7);
        let fixes = read_location_fixes(&db_path, &config, since).unwrap();

        assert_eq!(fixes.len(), 3);
        assert!(fixes[0].timestamp <= fixes[1].timestamp);
        assert!(fixes[1].timestamp <= fixes[2].timestamp);
        assert_eq!(fixes[0].latitude, 37.77);
    }

    #[test]
    fn test_skips_rows_with_null_fields() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("locations.db");
        let conn = create_locations_db(&db_path);

        let t0 = Utc::now().timestamp_millis();
        insert(&conn, Some(t0), Some(37.77), Some(-122.42));
        insert(&conn, Some(t0 + 1000), None, Some(-122.42));
        insert(&conn, Some(t0 + 2000), Some(37.77), None);
        insert(&conn, None, Some(37.77), Some(-122.42));
        drop(conn);

        let config = Config::default();
        let since = Utc::now() - Duration::days(1);
        let fixes = read_location_fixes(&db_path, &config, since).unwrap();

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].latitude, 37.77);
        assert_eq!(fixes[0].longitude, -122.42);
    }

    #[test]
    fn test_lookback_cutoff_filters_old_rows() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("locations.db");
        let conn = create_locations_db(&db_path);

        let now = Utc::now();
        let recent = now - Duration::days(1);
        let stale = now - Duration::days(30);
        insert(&conn, Some(recent.timestamp_millis()), Some(37.77), Some(-122.42));
        insert(&conn, Some(stale.timestamp_millis()), Some(37.78), Some(-122.41));
        drop(conn);

        let config = Config::default();
        let since = now - Duration::days(7);
        let fixes = read_location_fixes(&db_path, &config, since).unwrap();

        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].latitude, 37.77);
    }

    #[test]
    fn test_missing_table_is_a_distinct_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("empty.db");
        let conn = Connection::open(&db_path).unwrap();
        conn.execute("CREATE TABLE other (x INTEGER)", []).unwrap();
        drop(conn);

        let config = Config::default();
        let err = read_location_fixes(&db_path, &config, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("table 'locations' not found"));
    }

    #[test]
    fn test_empty_table_yields_empty_vec() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("locations.db");
        let conn = create_locations_db(&db_path);
        drop(conn);

        let config = Config::default();
        let fixes =
            read_location_fixes(&db_path, &config, Utc::now() - Duration::days(7)).unwrap();
        assert!(fixes.is_empty());
    }
}
