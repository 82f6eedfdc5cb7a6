//! Error handling for fdsync-store
//!
//! Wraps fdsync-core ExError with store-specific helpers

use fdsync_core::errors::{ExError, ExErrorKind};

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error for an already-applied migration
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::ConstraintViolation)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: recorded {}, embedded {}",
            migration_id, expected, actual
        ))
}

/// Create a duplicate link error for a doc_id that is already linked
pub fn duplicate_link(doc_id: &str) -> ExError {
    ExError::new(ExErrorKind::DuplicateLink)
        .with_op("link_document")
        .with_entity_id(doc_id)
        .with_message("person_to_record already has a row for this doc_id")
}

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a database error from rusqlite::Error, tagged with the failing operation
pub fn sqlite_op(op: &str) -> impl FnOnce(rusqlite::Error) -> ExError + '_ {
    move |err| {
        ExError::new(ExErrorKind::Persistence)
            .with_op(op)
            .with_message(err.to_string())
    }
}

/// Create a cache backend error from redis::RedisError
pub fn from_redis(op: &str, err: redis::RedisError) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op(op.to_string())
        .with_message(format!("redis: {}", err))
}

/// True when the error is a UNIQUE / PRIMARY KEY constraint violation
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
    )
}
