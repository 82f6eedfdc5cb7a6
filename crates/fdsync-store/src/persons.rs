//! Person and person-to-record persistence
//!
//! All functions take a `&Connection` so they run equally on a plain
//! connection or inside a `Transaction` (which derefs to one).

#![allow(clippy::result_large_err)]

use crate::errors::{duplicate_link, is_unique_violation, sqlite_op, Result};
use fdsync_core::{Person, PersonId, PersonLink};
use rusqlite::{Connection, OptionalExtension};

/// Find the person a filing row resolves to.
///
/// Matches when the stored first name contains `first_name` (case-sensitive)
/// and the last name is equal. Several candidates resolve to the lowest id.
pub fn find_matching_person(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
) -> Result<Option<Person>> {
    conn.query_row(
        "SELECT person_id, first_name, last_name FROM person
         WHERE instr(first_name, ?1) > 0 AND last_name = ?2
         ORDER BY person_id
         LIMIT 1",
        rusqlite::params![first_name, last_name],
        |row| {
            Ok(Person {
                person_id: PersonId(row.get(0)?),
                first_name: row.get(1)?,
                last_name: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(sqlite_op("find_matching_person"))
}

/// Insert a new person and return its id
pub fn insert_person(conn: &Connection, first_name: &str, last_name: &str) -> Result<PersonId> {
    conn.execute(
        "INSERT INTO person (first_name, last_name) VALUES (?1, ?2)",
        rusqlite::params![first_name, last_name],
    )
    .map_err(sqlite_op("insert_person"))?;

    Ok(PersonId(conn.last_insert_rowid()))
}

/// True when a filing document is already linked to a person
pub fn link_exists(conn: &Connection, doc_id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT 1 FROM person_to_record WHERE doc_id = ?1",
        [doc_id],
        |_| Ok(()),
    )
    .optional()
    .map(|found| found.is_some())
    .map_err(sqlite_op("link_exists"))
}

/// Insert a person-to-record link.
///
/// # Errors
///
/// `DuplicateLink` when `doc_id` is already linked; `Persistence` otherwise.
pub fn insert_link(conn: &Connection, link: &PersonLink) -> Result<()> {
    let now = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO person_to_record (doc_id, person_id, url, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![link.doc_id, link.person_id.0, link.url, now],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            duplicate_link(&link.doc_id)
        } else {
            sqlite_op("insert_link")(e).with_entity_id(link.doc_id.clone())
        }
    })?;

    Ok(())
}

/// Load the link for a filing document
pub fn get_link(conn: &Connection, doc_id: &str) -> Result<Option<PersonLink>> {
    conn.query_row(
        "SELECT doc_id, person_id, url FROM person_to_record WHERE doc_id = ?1",
        [doc_id],
        |row| {
            Ok(PersonLink {
                doc_id: row.get(0)?,
                person_id: PersonId(row.get(1)?),
                url: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(sqlite_op("get_link"))
}

pub fn count_persons(conn: &Connection) -> Result<u64> {
    count(conn, "SELECT COUNT(*) FROM person", "count_persons")
}

pub fn count_links(conn: &Connection) -> Result<u64> {
    count(conn, "SELECT COUNT(*) FROM person_to_record", "count_links")
}

fn count(conn: &Connection, sql: &str, op: &str) -> Result<u64> {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .map(|n| n as u64)
        .map_err(sqlite_op(op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::apply_migrations;
    use fdsync_core::ExErrorKind;

    fn setup() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON").unwrap();
        apply_migrations(&mut conn).unwrap();
        conn
    }

    #[test]
    fn test_match_is_substring_on_first_name_and_exact_on_last() {
        let conn = setup();
        let id = insert_person(&conn, "John Q.", "Smith").unwrap();

        let found = find_matching_person(&conn, "John", "Smith").unwrap().unwrap();
        assert_eq!(found.person_id, id);

        assert!(find_matching_person(&conn, "john", "Smith").unwrap().is_none());
        assert!(find_matching_person(&conn, "John", "Smithers").unwrap().is_none());
    }

    #[test]
    fn test_ambiguous_match_picks_lowest_id() {
        let conn = setup();
        let first = insert_person(&conn, "Ann Marie", "Lee").unwrap();
        let _second = insert_person(&conn, "Ann", "Lee").unwrap();

        let found = find_matching_person(&conn, "Ann", "Lee").unwrap().unwrap();
        assert_eq!(found.person_id, first);
    }

    #[test]
    fn test_duplicate_link_is_reported_as_duplicate() {
        let conn = setup();
        let person_id = insert_person(&conn, "John", "Smith").unwrap();
        let link = PersonLink {
            doc_id: "20240001234".to_string(),
            person_id,
            url: "u".to_string(),
        };

        insert_link(&conn, &link).unwrap();
        assert!(link_exists(&conn, "20240001234").unwrap());

        let err = insert_link(&conn, &link).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::DuplicateLink);
        assert!(err.is_row_recoverable());
        assert_eq!(count_links(&conn).unwrap(), 1);
    }

    #[test]
    fn test_link_to_unknown_person_is_not_a_duplicate() {
        let conn = setup();
        let link = PersonLink {
            doc_id: "20240009999".to_string(),
            person_id: PersonId(42),
            url: "u".to_string(),
        };

        let err = insert_link(&conn, &link).unwrap_err();
        assert_eq!(err.kind(), ExErrorKind::Persistence);
    }
}
