//! SQLite-backed store for velocity records and run summaries.

use crate::assembler::VelocityRecord;
use crate::error::VelocityError;
use crate::pipeline::RunSummary;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use std::path::Path;

/// One persisted record; the payload is stored as JSON text
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub run_id: String,
    pub input_index: i64,
    pub event_id: String,
    pub entity_key: String,
    pub event_time_ms: i64,
    pub velocity: i64,
    pub payload_json: String,
}

pub struct VelocityStore {
    conn: Connection,
}

impl VelocityStore {
    /// Open or create DB at path.
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS velocity_records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id TEXT NOT NULL,
                input_index INTEGER NOT NULL,
                event_id TEXT NOT NULL,
                entity_key TEXT NOT NULL,
                event_time INTEGER NOT NULL,
                velocity INTEGER NOT NULL,
                payload TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_records_event ON velocity_records(event_id);
            CREATE INDEX IF NOT EXISTS idx_records_key_time ON velocity_records(entity_key, event_time);
            CREATE TABLE IF NOT EXISTS runs (run_id TEXT PRIMARY KEY, summary TEXT NOT NULL);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Insert a run's records in one transaction, in the order given.
    pub fn insert_records<P: Serialize>(
        &mut self,
        run_id: &str,
        records: &[VelocityRecord<P>],
    ) -> Result<usize, VelocityError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO velocity_records (run_id, input_index, event_id, entity_key, event_time, velocity, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for r in records {
                let payload = serde_json::to_string(&r.event.payload)?;
                stmt.execute(params![
                    run_id,
                    r.index as i64,
                    r.event.event_id,
                    r.event.entity_key,
                    r.event.event_time.timestamp_millis(),
                    r.velocity as i64,
                    payload,
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn record_run(&self, summary: &RunSummary) -> Result<(), VelocityError> {
        let json = serde_json::to_string(summary)?;
        self.conn.execute(
            "INSERT OR REPLACE INTO runs (run_id, summary) VALUES (?1, ?2)",
            params![summary.run_id.to_string(), json],
        )?;
        Ok(())
    }

    /// Most recently stored record for an event id
    pub fn get_record(&self, event_id: &str) -> Result<Option<StoredRecord>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT run_id, input_index, event_id, entity_key, event_time, velocity, payload
                 FROM velocity_records WHERE event_id = ?1 ORDER BY seq DESC LIMIT 1",
                params![event_id],
                |row| {
                    Ok(StoredRecord {
                        run_id: row.get(0)?,
                        input_index: row.get(1)?,
                        event_id: row.get(2)?,
                        entity_key: row.get(3)?,
                        event_time_ms: row.get(4)?,
                        velocity: row.get(5)?,
                        payload_json: row.get(6)?,
                    })
                },
            )
            .optional()
    }

    /// `(event_time_ms, velocity)` for one key within a run, oldest first
    pub fn key_history(&self, run_id: &str, entity_key: &str) -> Result<Vec<(i64, i64)>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT event_time, velocity FROM velocity_records
             WHERE run_id = ?1 AND entity_key = ?2 ORDER BY event_time, seq",
        )?;
        let rows = stmt.query_map(params![run_id, entity_key], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    pub fn count(&self) -> Result<u64, rusqlite::Error> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM velocity_records", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}
