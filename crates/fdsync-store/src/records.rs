//! Transaction record persistence

#![allow(clippy::result_large_err)]

use crate::errors::{sqlite_op, Result};
use crate::run_lock::{self, RunLease};
use fdsync_core::TransactionRecord;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashSet;

/// Append records in a single transaction; either all rows land or none do.
///
/// Returns the number of rows written.
pub fn append_records(conn: &mut Connection, records: &[TransactionRecord]) -> Result<usize> {
    append(conn, records, None)
}

/// As [`append_records`], but only while `lease` still holds its run lock.
///
/// The lease is checked inside the append transaction.
///
/// # Errors
///
/// `RunLocked` when the lease expired or was taken over; nothing is written.
pub fn append_records_under_lease(
    conn: &mut Connection,
    records: &[TransactionRecord],
    lease: &RunLease,
) -> Result<usize> {
    append(conn, records, Some(lease))
}

fn append(
    conn: &mut Connection,
    records: &[TransactionRecord],
    lease: Option<&RunLease>,
) -> Result<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(sqlite_op("append_records"))?;
    if let Some(lease) = lease {
        run_lock::ensure_held(&tx, lease)?;
    }
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO record
                    (doc_id, date, owner, transaction_date, ticker, company, transaction_type, amount)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(sqlite_op("append_records"))?;

        for record in records {
            stmt.execute(rusqlite::params![
                record.doc_id,
                record.date,
                record.owner,
                record.transaction_date,
                record.ticker,
                record.company,
                record.transaction_type,
                record.amount,
            ])
            .map_err(|e| sqlite_op("append_records")(e).with_entity_id(record.doc_id.clone()))?;
        }
    }
    tx.commit().map_err(sqlite_op("append_records"))?;

    Ok(records.len())
}

/// The subset of `doc_ids` that already has rows in `record`
pub fn existing_doc_ids<'a, I>(conn: &Connection, doc_ids: I) -> Result<HashSet<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut stmt = conn
        .prepare_cached("SELECT 1 FROM record WHERE doc_id = ?1 LIMIT 1")
        .map_err(sqlite_op("existing_doc_ids"))?;

    let mut found = HashSet::new();
    for doc_id in doc_ids {
        if stmt.exists([doc_id]).map_err(sqlite_op("existing_doc_ids"))? {
            found.insert(doc_id.to_string());
        }
    }
    Ok(found)
}

/// Records stored for one filing document, in insertion order
pub fn records_for_doc(conn: &Connection, doc_id: &str) -> Result<Vec<TransactionRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT doc_id, date, owner, transaction_date, ticker, company, transaction_type, amount
             FROM record WHERE doc_id = ?1 ORDER BY record_id",
        )
        .map_err(sqlite_op("records_for_doc"))?;

    let rows = stmt
        .query_map([doc_id], |row| {
            Ok(TransactionRecord {
                doc_id: row.get(0)?,
                date: row.get(1)?,
                owner: row.get(2)?,
                transaction_date: row.get(3)?,
                ticker: row.get(4)?,
                company: row.get(5)?,
                transaction_type: row.get(6)?,
                amount: row.get(7)?,
            })
        })
        .map_err(sqlite_op("records_for_doc"))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(sqlite_op("records_for_doc"))?;

    Ok(rows)
}

pub fn count_records(conn: &Connection) -> Result<u64> {
    conn.query_row("SELECT COUNT(*) FROM record", [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(sqlite_op("count_records"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use fdsync_core::ExErrorKind;
    use std::time::Duration;

    #[test]
    fn test_append_and_existing_doc_ids() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();

        let mut buy = TransactionRecord::new("20240001234", "01/02/2024");
        buy.ticker = Some("ACME".to_string());
        let sell = TransactionRecord::new("20240001234", "01/02/2024");

        assert_eq!(append_records(&mut conn, &[buy.clone(), sell]).unwrap(), 2);
        assert_eq!(count_records(&conn).unwrap(), 2);

        let existing = existing_doc_ids(&conn, ["20240001234", "20240009999"]).unwrap();
        assert_eq!(existing.len(), 1);
        assert!(existing.contains("20240001234"));

        let stored = records_for_doc(&conn, "20240001234").unwrap();
        assert_eq!(stored[0], buy);
    }

    #[test]
    fn test_append_under_lost_lease_writes_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        let record = TransactionRecord::new("20240001234", "01/02/2024");

        let lease = run_lock::acquire(&conn, "old", "run-a", Duration::from_secs(60)).unwrap();
        assert_eq!(
            append_records_under_lease(&mut conn, &[record.clone()], &lease).unwrap(),
            1
        );

        run_lock::release(&conn, lease.clone()).unwrap();
        let err = append_records_under_lease(&mut conn, &[record], &lease).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::RunLocked);
        assert_eq!(count_records(&conn).unwrap(), 1);
    }

    #[test]
    fn test_empty_append_writes_nothing() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_migrations(&mut conn).unwrap();
        assert_eq!(append_records(&mut conn, &[]).unwrap(), 0);
        assert_eq!(count_records(&conn).unwrap(), 0);
    }
}
