use super::{commit_failed, SnapshotCache};
use crate::errors::{sqlite_op, Result};
use fdsync_core::Snapshot;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

/// Baseline stored as one row of the `snapshot_cache` table
pub struct SqliteSnapshotCache {
    conn: Connection,
    key: String,
}

impl SqliteSnapshotCache {
    /// Wrap a migrated connection
    pub fn new(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    /// Open, configure and migrate the database at `path`
    pub fn open<P: AsRef<Path>>(path: P, key: impl Into<String>) -> Result<Self> {
        let conn = crate::db::open_migrated(path)?;
        Ok(Self::new(conn, key))
    }

    /// Digest and last update time (ms since epoch) of the stored baseline
    pub fn metadata(&self) -> Result<Option<(String, i64)>> {
        self.conn
            .query_row(
                "SELECT content_digest, updated_at FROM snapshot_cache WHERE cache_key = ?1",
                [&self.key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(sqlite_op("cache_metadata"))
    }
}

impl SnapshotCache for SqliteSnapshotCache {
    fn read(&self) -> Result<Option<Snapshot>> {
        self.conn
            .query_row(
                "SELECT content FROM snapshot_cache WHERE cache_key = ?1",
                [&self.key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map(|content| content.map(Snapshot::from_bytes))
            .map_err(|e| sqlite_op("cache_read")(e).with_entity_id(self.key.clone()))
    }

    fn commit(&self, snapshot: &Snapshot) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn
            .execute(
                "INSERT INTO snapshot_cache (cache_key, content, content_digest, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(cache_key) DO UPDATE SET
                    content = excluded.content,
                    content_digest = excluded.content_digest,
                    updated_at = excluded.updated_at",
                rusqlite::params![self.key, snapshot.as_bytes(), snapshot.digest(), now],
            )
            .map_err(|e| commit_failed(&self.key, snapshot, sqlite_op("cache_commit")(e)))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.conn
            .execute("DELETE FROM snapshot_cache WHERE cache_key = ?1", [&self.key])
            .map_err(sqlite_op("cache_clear"))?;
        Ok(())
    }

    fn key(&self) -> &str {
        &self.key
    }
}
