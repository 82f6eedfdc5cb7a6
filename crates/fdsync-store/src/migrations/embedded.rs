//! Embedded SQL migrations
//!
//! Migrations are embedded at compile time using include_str!

pub struct Migration {
    pub id: &'static str,
    pub sql: &'static str,
}

/// All embedded migrations, in application order
pub fn get_migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_initial_schema",
            sql: include_str!("../../migrations/001_initial_schema.sql"),
        },
        Migration {
            id: "002_snapshot_cache",
            sql: include_str!("../../migrations/002_snapshot_cache.sql"),
        },
        Migration {
            id: "003_run_ledger",
            sql: include_str!("../../migrations/003_run_ledger.sql"),
        },
    ]
}
