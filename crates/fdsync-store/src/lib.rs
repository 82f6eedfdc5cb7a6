//! fdsync Store - Persistence layer for the disclosure feed pipeline
//!
//! Provides:
//! - SQLite connection helpers and an embedded migrations framework
//! - Person resolution and person-to-record link persistence
//! - Bulk append of transaction records
//! - The single-slot snapshot cache (SQLite or Redis backed)
//! - Run-level mutual exclusion and the run ledger

pub mod cache;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod persons;
pub mod records;
pub mod run_ledger;
pub mod run_lock;

// Re-export key types
pub use cache::{RedisSnapshotCache, SnapshotCache, SqliteSnapshotCache, DEFAULT_CACHE_KEY};
pub use errors::Result;
