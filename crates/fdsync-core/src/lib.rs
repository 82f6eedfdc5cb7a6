//! fdsync Core - domain kernel for the disclosure feed pipeline
//!
//! This crate provides the pieces of the pipeline that do not touch I/O:
//! - Snapshot, period, filing, person and transaction record models
//! - Line-level snapshot diffing and filing-row extraction
//! - The canonical error facility (`ExError` / `ExErrorKind` / `ErrorClass`)
//! - The structured logging facility and its test capture layer

pub mod diff;
pub mod errors;
pub mod logging_facility;
pub mod model;

pub use fdsync_core_types::schema;

// Re-export commonly used types
pub use diff::{extract_filings, Extraction, ParseSkip, SkipReason};
pub use errors::{ErrorClass, ExError, ExErrorKind, Result};
pub use model::{
    FilingKey, FilingRow, Period, Person, PersonId, PersonLink, Snapshot, TransactionRecord,
};
