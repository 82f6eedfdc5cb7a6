//! Single-slot snapshot cache
//!
//! Holds the one baseline snapshot the next run diffs against. The baseline
//! is read once at the start of a run and replaced only by `commit`, after
//! the run's writes have landed.

#![allow(clippy::result_large_err)]

mod redis_cache;
mod sqlite_cache;

pub use redis_cache::RedisSnapshotCache;
pub use sqlite_cache::SqliteSnapshotCache;

use crate::errors::Result;
use fdsync_core::{ExError, ExErrorKind, Snapshot};

/// Key under which the baseline is stored when none is configured
pub const DEFAULT_CACHE_KEY: &str = "old";

/// Storage for the baseline snapshot
pub trait SnapshotCache {
    /// The stored baseline, or `None` on first run / after `clear`
    fn read(&self) -> Result<Option<Snapshot>>;

    /// Replace the baseline with `snapshot`.
    ///
    /// # Errors
    ///
    /// Always `CommitFailed`, with the backend error as source.
    fn commit(&self, snapshot: &Snapshot) -> Result<()>;

    /// Remove the baseline, forcing the next run to treat the feed as new
    fn clear(&self) -> Result<()>;

    fn key(&self) -> &str;
}

impl<C: SnapshotCache + ?Sized> SnapshotCache for Box<C> {
    fn read(&self) -> Result<Option<Snapshot>> {
        (**self).read()
    }

    fn commit(&self, snapshot: &Snapshot) -> Result<()> {
        (**self).commit(snapshot)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn key(&self) -> &str {
        (**self).key()
    }
}

pub(crate) fn commit_failed(key: &str, snapshot: &Snapshot, cause: ExError) -> ExError {
    ExError::new(ExErrorKind::CommitFailed)
        .with_op("cache_commit")
        .with_entity_id(key)
        .with_message(format!(
            "failed to advance baseline to digest {}",
            snapshot.digest()
        ))
        .with_source(cause)
}
