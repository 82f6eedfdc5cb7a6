//! Run ledger
//!
//! One `pipeline_runs` row per run: written `running` when the run starts
//! and finalized with its outcome and counters when it ends.

#![allow(clippy::result_large_err)]

use crate::errors::{sqlite_op, Result};
use fdsync_core::ExError;
use rusqlite::{Connection, OptionalExtension, Row};

pub const OUTCOME_RUNNING: &str = "running";
pub const OUTCOME_SUCCEEDED: &str = "succeeded";
pub const OUTCOME_FAILED: &str = "failed";

/// Counters reported by a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub rows_extracted: u64,
    pub rows_linked: u64,
    pub rows_skipped: u64,
    pub records_appended: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLedgerEntry {
    pub run_id: String,
    pub period: String,
    pub cache_key: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub outcome: String,
    pub final_state: Option<String>,
    pub counts: RunCounts,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

pub fn record_start(conn: &Connection, run_id: &str, period: &str, cache_key: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO pipeline_runs (run_id, period, cache_key, started_at, outcome)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            run_id,
            period,
            cache_key,
            chrono::Utc::now().timestamp_millis(),
            OUTCOME_RUNNING
        ],
    )
    .map_err(|e| sqlite_op("ledger_start")(e).with_entity_id(run_id))?;
    Ok(())
}

/// Finalize a run row. `error` is `None` for a successful run.
pub fn record_finish(
    conn: &Connection,
    run_id: &str,
    final_state: &str,
    counts: RunCounts,
    error: Option<&ExError>,
) -> Result<()> {
    let outcome = if error.is_some() {
        OUTCOME_FAILED
    } else {
        OUTCOME_SUCCEEDED
    };
    conn.execute(
        "UPDATE pipeline_runs SET
            finished_at = ?2,
            outcome = ?3,
            final_state = ?4,
            rows_extracted = ?5,
            rows_linked = ?6,
            rows_skipped = ?7,
            records_appended = ?8,
            error_code = ?9,
            error_message = ?10
         WHERE run_id = ?1",
        rusqlite::params![
            run_id,
            chrono::Utc::now().timestamp_millis(),
            outcome,
            final_state,
            counts.rows_extracted as i64,
            counts.rows_linked as i64,
            counts.rows_skipped as i64,
            counts.records_appended as i64,
            error.map(|e| e.code()),
            error.map(|e| e.to_string()),
        ],
    )
    .map_err(|e| sqlite_op("ledger_finish")(e).with_entity_id(run_id))?;
    Ok(())
}

pub fn get_run(conn: &Connection, run_id: &str) -> Result<Option<RunLedgerEntry>> {
    conn.query_row(
        &format!("{} WHERE run_id = ?1", SELECT_RUN),
        [run_id],
        map_entry,
    )
    .optional()
    .map_err(sqlite_op("ledger_get"))
}

/// Most recent runs first
pub fn recent_runs(conn: &Connection, limit: usize) -> Result<Vec<RunLedgerEntry>> {
    let mut stmt = conn
        .prepare(&format!(
            "{} ORDER BY started_at DESC, rowid DESC LIMIT ?1",
            SELECT_RUN
        ))
        .map_err(sqlite_op("ledger_recent"))?;
    let entries = stmt
        .query_map([limit as i64], map_entry)
        .map_err(sqlite_op("ledger_recent"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(sqlite_op("ledger_recent"))?;
    Ok(entries)
}

const SELECT_RUN: &str = "SELECT run_id, period, cache_key, started_at, finished_at, outcome,
        final_state, rows_extracted, rows_linked, rows_skipped, records_appended,
        error_code, error_message
    FROM pipeline_runs";

fn map_entry(row: &Row<'_>) -> rusqlite::Result<RunLedgerEntry> {
    Ok(RunLedgerEntry {
        run_id: row.get(0)?,
        period: row.get(1)?,
        cache_key: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        outcome: row.get(5)?,
        final_state: row.get(6)?,
        counts: RunCounts {
            rows_extracted: row.get::<_, i64>(7)? as u64,
            rows_linked: row.get::<_, i64>(8)? as u64,
            rows_skipped: row.get::<_, i64>(9)? as u64,
            records_appended: row.get::<_, i64>(10)? as u64,
        },
        error_code: row.get(11)?,
        error_message: row.get(12)?,
    })
}
