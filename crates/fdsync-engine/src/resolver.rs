//! Person resolution and document linking
//!
//! Each filing row is handled in its own transaction: the document is
//! checked against existing links first, then its filer is found or
//! created, then the link is written. A row that fails leaves nothing behind.

#![allow(clippy::result_large_err)]

use fdsync_core::errors::Result;
use fdsync_core::{FilingRow, PersonId, PersonLink};
use fdsync_store::errors::{duplicate_link, sqlite_op};
use fdsync_store::persons;
use rusqlite::{Connection, TransactionBehavior};

/// Outcome of resolving one filing row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub person_id: PersonId,
    /// A new person row was inserted for this filer
    pub created: bool,
}

pub struct PersonResolver;

impl PersonResolver {
    /// Find the person a row's filer matches, creating one if none does
    pub fn resolve(conn: &Connection, row: &FilingRow) -> Result<Resolution> {
        if let Some(person) = persons::find_matching_person(conn, &row.first_name, &row.last_name)?
        {
            return Ok(Resolution {
                person_id: person.person_id,
                created: false,
            });
        }

        let person_id = persons::insert_person(conn, &row.first_name, &row.last_name)?;
        Ok(Resolution {
            person_id,
            created: true,
        })
    }

    /// Link a document to a person.
    ///
    /// # Errors
    ///
    /// `DuplicateLink` when the document is already linked.
    pub fn link(conn: &Connection, doc_id: &str, person_id: PersonId, url: &str) -> Result<()> {
        persons::insert_link(
            conn,
            &PersonLink {
                doc_id: doc_id.to_string(),
                person_id,
                url: url.to_string(),
            },
        )
    }

    /// Resolve the filer and link the document in one transaction.
    ///
    /// # Errors
    ///
    /// `DuplicateLink` (recoverable, nothing written) when an earlier run
    /// already linked the document; any other error is a store failure.
    pub fn resolve_and_link(conn: &mut Connection, row: &FilingRow) -> Result<Resolution> {
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(sqlite_op("resolve_and_link"))?;

        if persons::link_exists(&tx, &row.doc_id)? {
            return Err(duplicate_link(&row.doc_id));
        }

        let resolution = Self::resolve(&tx, row)?;
        Self::link(&tx, &row.doc_id, resolution.person_id, &row.url)?;

        tx.commit().map_err(sqlite_op("resolve_and_link"))?;
        Ok(resolution)
    }
}
