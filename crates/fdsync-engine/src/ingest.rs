//! Transaction ingestion
//!
//! Hands the run's filing keys to the extraction collaborator and appends the
//! returned rows in one transaction. Keys whose documents already have rows
//! in `record` are left out, so a retried run neither loses nor duplicates
//! transactions.

#![allow(clippy::result_large_err)]

use crate::extractor::TransactionExtractor;
use fdsync_core::errors::Result;
use fdsync_core::schema::EVENT_SKIP;
use fdsync_core::FilingKey;
use fdsync_store::records;
use fdsync_store::run_lock::RunLease;
use rusqlite::Connection;

/// What one ingest call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Keys sent to the extractor
    pub requested: usize,
    /// Keys dropped because their records were stored by an earlier run
    pub already_ingested: usize,
    /// Rows appended to `record`
    pub appended: usize,
}

pub struct TransactionIngestor<'a> {
    extractor: &'a dyn TransactionExtractor,
    lease: Option<&'a RunLease>,
}

impl<'a> TransactionIngestor<'a> {
    pub fn new(extractor: &'a dyn TransactionExtractor) -> Self {
        Self {
            extractor,
            lease: None,
        }
    }

    /// Append only while `lease` still holds the run lock
    pub fn with_lease(mut self, lease: &'a RunLease) -> Self {
        self.lease = Some(lease);
        self
    }

    /// Extract and append transactions for `keys`.
    ///
    /// An empty pending batch makes no collaborator call. Either every
    /// returned row is appended or none is.
    ///
    /// # Errors
    ///
    /// Collaborator failures (`ExternalService`), store failures
    /// (`Persistence`) and a lost lease (`RunLocked`) are returned unchanged;
    /// nothing has been written.
    pub fn ingest(&self, conn: &mut Connection, keys: &[FilingKey]) -> Result<IngestOutcome> {
        let existing = records::existing_doc_ids(conn, keys.iter().map(|k| k.doc_id.as_str()))?;

        let pending: Vec<FilingKey> = keys
            .iter()
            .filter(|k| {
                let done = existing.contains(&k.doc_id);
                if done {
                    tracing::debug!(
                        event = EVENT_SKIP,
                        doc_id = %k.doc_id,
                        "Records already stored for document"
                    );
                }
                !done
            })
            .cloned()
            .collect();

        let already_ingested = keys.len() - pending.len();
        if pending.is_empty() {
            return Ok(IngestOutcome {
                requested: 0,
                already_ingested,
                appended: 0,
            });
        }

        let rows = self.extractor.extract(&pending)?;
        let appended = match self.lease {
            Some(lease) => records::append_records_under_lease(conn, &rows, lease)?,
            None => records::append_records(conn, &rows)?,
        };

        Ok(IngestOutcome {
            requested: pending.len(),
            already_ingested,
            appended,
        })
    }
}
