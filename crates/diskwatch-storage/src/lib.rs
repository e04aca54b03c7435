//! Time-series storage for disk usage samples.
//!
//! One SQLite database in WAL mode holds a single append-only `samples`
//! relation. Writes are serialized behind a mutex; WAL keeps concurrent
//! readers (trend and history queries) off the writer's back. Every
//! statement is prepared with bound parameters — SQL is never assembled
//! from input strings.

pub mod error;


use diskwatch_common::types::Sample;
use error::Result;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SAMPLES_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS samples (
    mount TEXT NOT NULL,
    time INTEGER NOT NULL,
    bytes INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_samples_mount_time
    ON samples(mount, time);
";

/// Append-only store of [`Sample`] rows, keyed by (mount, time).
///
/// The sampler is the sole writer; the trend engine and the view layer are
/// read-only consumers. There is no caching layer — every read hits SQLite.
pub struct SampleStore {
    conn: Mutex<Connection>,
}

impl SampleStore {
    /// Opens (creating if needed) the database at `path` and ensures the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Opens a private in-memory database. Test use only in practice, but
    /// harmless elsewhere.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Lock the connection, recovering from a poisoned mutex if necessary.
    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Idempotent creation of the samples table and its index. Safe to call
    /// on every startup; existing rows are untouched.
    pub fn ensure_schema(&self) -> Result<()> {
        self.lock_conn().execute_batch(SAMPLES_SCHEMA)?;
        Ok(())
    }

    /// Appends one sample row.
    pub fn insert(&self, mount: &str, timestamp: i64, available_bytes: u64) -> Result<()> {
        let conn = self.lock_conn();
        let mut stmt =
            conn.prepare_cached("INSERT INTO samples (mount, time, bytes) VALUES (?1, ?2, ?3)")?;
        stmt.execute(rusqlite::params![
            mount,
            timestamp,
            available_bytes as i64
        ])?;
        Ok(())
    }

    /// Returns the earliest recorded sample for `mount` whose timestamp is
    /// at or after `timestamp`, or `None` if there is no such sample.
    pub fn first_sample_at_or_after(&self, mount: &str, timestamp: i64) -> Result<Option<Sample>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT mount, time, bytes FROM samples
             WHERE mount = ?1 AND time >= ?2
             ORDER BY time ASC LIMIT 1",
        )?;
        let sample = stmt
            .query_row(rusqlite::params![mount, timestamp], |row| {
                Ok(Sample {
                    mount: row.get(0)?,
                    timestamp: row.get(1)?,
                    available_bytes: row.get::<_, i64>(2)? as u64,
                })
            })
            .optional()?;
        Ok(sample)
    }

    /// Returns the maximum timestamp across all rows, or `None` when the
    /// store is empty. Used only for cadence alignment at startup.
    pub fn latest_timestamp(&self) -> Result<Option<i64>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached("SELECT MAX(time) FROM samples")?;
        let latest = stmt.query_row([], |row| row.get::<_, Option<i64>>(0))?;
        Ok(latest)
    }

    /// Returns all samples for `mount` ordered by timestamp ascending,
    /// filtered to `time >= since` when given.
    pub fn history(&self, mount: &str, since: Option<i64>) -> Result<Vec<Sample>> {
        let conn = self.lock_conn();
        let mut stmt = conn.prepare_cached(
            "SELECT mount, time, bytes FROM samples
             WHERE mount = ?1 AND time >= ?2
             ORDER BY time ASC",
        )?;
        let rows = stmt.query_map(
            rusqlite::params![mount, since.unwrap_or(i64::MIN)],
            |row| {
                Ok(Sample {
                    mount: row.get(0)?,
                    timestamp: row.get(1)?,
                    available_bytes: row.get::<_, i64>(2)? as u64,
                })
            },
        )?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }
}
