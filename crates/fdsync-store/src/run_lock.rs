//! Run-level mutual exclusion
//!
//! At most one pipeline run may hold the lock for a given cache key. A lock
//! whose expiry has passed belongs to a crashed run and is taken over.

#![allow(clippy::result_large_err)]

use crate::errors::{sqlite_op, Result};
use fdsync_core::{ExError, ExErrorKind};
use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// A held run lock. Must be passed back to [`release`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a held run lock must be released"]
pub struct RunLease {
    pub cache_key: String,
    pub run_id: String,
    pub expires_at: i64,
}

/// Current holder of a lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    pub run_id: String,
    pub acquired_at: i64,
    pub expires_at: i64,
}

/// Take the lock for `cache_key`.
///
/// # Errors
///
/// `RunLocked` when another run holds an unexpired lock.
pub fn acquire(
    conn: &Connection,
    cache_key: &str,
    run_id: &str,
    ttl: Duration,
) -> Result<RunLease> {
    acquire_at(conn, cache_key, run_id, ttl, now_ms())
}

fn acquire_at(
    conn: &Connection,
    cache_key: &str,
    run_id: &str,
    ttl: Duration,
    now: i64,
) -> Result<RunLease> {
    let expires_at = now.saturating_add(ttl.as_millis() as i64);
    let previous = holder(conn, cache_key)?;

    let changed = conn
        .execute(
            "INSERT INTO run_lock (cache_key, run_id, acquired_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET
                run_id = excluded.run_id,
                acquired_at = excluded.acquired_at,
                expires_at = excluded.expires_at
             WHERE run_lock.expires_at <= ?3",
            rusqlite::params![cache_key, run_id, now, expires_at],
        )
        .map_err(sqlite_op("run_lock_acquire"))?;

    if changed == 0 {
        let held_by = previous
            .map(|h| h.run_id)
            .unwrap_or_else(|| "unknown".to_string());
        return Err(ExError::new(ExErrorKind::RunLocked)
            .with_op("run_lock_acquire")
            .with_entity_id(cache_key)
            .with_message(format!("lock held by run {}", held_by)));
    }

    if let Some(stale) = previous {
        tracing::warn!(
            cache_key = cache_key,
            stale_run_id = %stale.run_id,
            run_id = run_id,
            "Took over expired run lock"
        );
    }

    Ok(RunLease {
        cache_key: cache_key.to_string(),
        run_id: run_id.to_string(),
        expires_at,
    })
}

/// Release a lock. Releasing a lock that was since taken over is a no-op.
pub fn release(conn: &Connection, lease: RunLease) -> Result<()> {
    conn.execute(
        "DELETE FROM run_lock WHERE cache_key = ?1 AND run_id = ?2",
        rusqlite::params![lease.cache_key, lease.run_id],
    )
    .map_err(sqlite_op("run_lock_release"))?;
    Ok(())
}

/// Check that `lease` is still the live holder of its lock.
///
/// Run it inside the write transaction it guards, so a takeover cannot land
/// between the check and the commit.
///
/// # Errors
///
/// `RunLocked` when the lease has expired or another run has taken over.
pub fn ensure_held(conn: &Connection, lease: &RunLease) -> Result<()> {
    ensure_held_at(conn, lease, now_ms())
}

fn ensure_held_at(conn: &Connection, lease: &RunLease, now: i64) -> Result<()> {
    match holder(conn, &lease.cache_key)? {
        Some(h) if h.run_id == lease.run_id && h.expires_at > now => Ok(()),
        current => {
            let reason = match current {
                Some(h) if h.run_id != lease.run_id => {
                    format!("lock taken over by run {}", h.run_id)
                }
                Some(_) => "lock expired".to_string(),
                None => "lock no longer held".to_string(),
            };
            Err(ExError::new(ExErrorKind::RunLocked)
                .with_op("run_lock_check")
                .with_entity_id(lease.cache_key.as_str())
                .with_message(format!("run {}: {}", lease.run_id, reason)))
        }
    }
}

pub fn holder(conn: &Connection, cache_key: &str) -> Result<Option<LockHolder>> {
    conn.query_row(
        "SELECT run_id, acquired_at, expires_at FROM run_lock WHERE cache_key = ?1",
        [cache_key],
        |row| {
            Ok(LockHolder {
                run_id: row.get(0)?,
                acquired_at: row.get(1)?,
                expires_at: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(sqlite_op("run_lock_holder"))
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
