//! Domain model for the disclosure feed pipeline

pub mod filing;
pub mod period;
pub mod person;
pub mod record;
pub mod snapshot;

pub use filing::{FilingKey, FilingRow};
pub use period::Period;
pub use person::{Person, PersonId, PersonLink};
pub use record::TransactionRecord;
pub use snapshot::Snapshot;
