use super::{commit_failed, SnapshotCache};
use crate::errors::{from_redis, Result};
use fdsync_core::Snapshot;
use redis::Commands;
use std::time::Duration;

/// Baseline stored under a single Redis key, without expiry
pub struct RedisSnapshotCache {
    client: redis::Client,
    key: String,
    timeout: Duration,
}

impl RedisSnapshotCache {
    /// Create a cache for `url` (e.g. `redis://127.0.0.1/`). No connection is
    /// made until the first operation.
    pub fn open(url: &str, key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| from_redis("cache_open", e))?;
        Ok(Self {
            client,
            key: key.into(),
            timeout,
        })
    }

    fn connection(&self, op: &str) -> Result<redis::Connection> {
        self.client
            .get_connection_with_timeout(self.timeout)
            .map_err(|e| from_redis(op, e).with_entity_id(self.key.clone()))
    }
}

impl SnapshotCache for RedisSnapshotCache {
    fn read(&self) -> Result<Option<Snapshot>> {
        let mut con = self.connection("cache_read")?;
        let content: Option<Vec<u8>> = con
            .get(&self.key)
            .map_err(|e| from_redis("cache_read", e).with_entity_id(self.key.clone()))?;
        Ok(content.map(Snapshot::from_bytes))
    }

    fn commit(&self, snapshot: &Snapshot) -> Result<()> {
        let mut con = self
            .connection("cache_commit")
            .map_err(|e| commit_failed(&self.key, snapshot, e))?;
        con.set::<_, _, ()>(&self.key, snapshot.as_bytes())
            .map_err(|e| commit_failed(&self.key, snapshot, from_redis("cache_commit", e)))
    }

    fn clear(&self) -> Result<()> {
        let mut con = self.connection("cache_clear")?;
        con.del::<_, ()>(&self.key)
            .map_err(|e| from_redis("cache_clear", e).with_entity_id(self.key.clone()))
    }

    fn key(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fdsync_core::ExErrorKind;

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = RedisSnapshotCache::open("not a url", "old", Duration::from_millis(50))
            .err()
            .unwrap();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }

    #[test]
    fn test_unreachable_server_commit_is_commit_failed() {
        // Port 1 is reserved; nothing listens there.
        let cache =
            RedisSnapshotCache::open("redis://127.0.0.1:1/", "old", Duration::from_millis(200))
                .unwrap();
        let err = cache.commit(&Snapshot::from("a")).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::CommitFailed);
        assert_eq!(cache.key(), "old");
    }
}
