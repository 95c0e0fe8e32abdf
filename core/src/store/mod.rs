//! SQLite warehouse loader.
//!
//! RULE: Only the store talks to the database.
//! The generator never touches it; callers hand a finished Dataset in.

use crate::error::GenResult;
use rusqlite::{params, Connection, OptionalExtension};

mod load;
mod query;

pub use query::{RunRecord, UsageRow};

pub struct WarehouseStore {
    conn: Connection,
}

impl WarehouseStore {
    /// Open (or create) the warehouse database at `path`.
    pub fn open(path: &str) -> GenResult<Self> {
        let conn = Connection::open(path)?;
        // WAL is ignored by some filesystems; not fatal.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        log::debug!("store: opened {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> GenResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order. Safe to call repeatedly.
    pub fn migrate(&self) -> GenResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_runs.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_usage_tables.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    /// Register a generation run and return its id.
    pub fn insert_run(&self, seed: u64, version: &str, config_json: &str) -> GenResult<String> {
        let run_id = uuid::Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, config_json, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, seed as i64, version, config_json, now()],
        )?;
        log::info!("store: registered run {run_id} (seed={seed})");
        Ok(run_id)
    }

    pub fn run(&self, run_id: &str) -> GenResult<Option<RunRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT run_id, seed, version, config_json, started_at FROM run WHERE run_id = ?1",
                params![run_id],
                |row| {
                    Ok(RunRecord {
                        run_id:      row.get(0)?,
                        seed:        row.get::<_, i64>(1)? as u64,
                        version:     row.get(2)?,
                        config_json: row.get(3)?,
                        started_at:  row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}
