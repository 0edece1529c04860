//! Review store schema.
//!
//! The snapshot refresh usually creates `ticket_table` and the two account
//! tables before any reviewer opens the file, and knows nothing of `users` or
//! of the decision columns. Opening such a file adopts it: a copy is taken,
//! the missing tables and columns are added, and the file is stamped with
//! `SCHEMA_VERSION`. A file with no review tables gets the whole baseline.

use rusqlite::{Connection, DatabaseName};

use super::DbError;

pub const SCHEMA_VERSION: i32 = 1;

const BASELINE: &str = include_str!("baseline.sql");

/// Columns the reviewer writes; a refresh-created `ticket_table` may lack them.
const DECISION_COLUMNS: &[&str] = &["status", "approver"];

/// What `ensure_schema` had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaSetup {
    /// Already stamped with the current version.
    Current,
    /// Empty file; the baseline was applied.
    Created,
    /// Review tables existed without a version stamp and were completed.
    Adopted,
}

fn stamped_version(conn: &Connection) -> Result<i32, DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool, DbError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn ticket_columns(conn: &Connection) -> Result<Vec<String>, DbError> {
    let mut stmt = conn.prepare("PRAGMA table_info(ticket_table)")?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    Ok(names.collect::<Result<Vec<_>, _>>()?)
}

/// Copy the file aside as `<db>.pre-adopt.bak` before it is altered.
/// In-memory stores have nothing to copy.
fn backup_before_adopt(conn: &Connection) -> Result<(), DbError> {
    let Some(path) = conn.path().filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    let backup_path = format!("{path}.pre-adopt.bak");
    conn.backup(DatabaseName::Main, &backup_path, None)?;
    log::info!("Copied refresh-created store to {}", backup_path);
    Ok(())
}

/// Bring the store at `conn` to `SCHEMA_VERSION`.
///
/// Refuses a file stamped by a newer build rather than guessing at its layout.
pub fn ensure_schema(conn: &Connection) -> Result<SchemaSetup, DbError> {
    let version = stamped_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(DbError::Migration(format!(
            "store is at schema v{version}, this build of upreview knows v{SCHEMA_VERSION}"
        )));
    }
    if version == SCHEMA_VERSION {
        return Ok(SchemaSetup::Current);
    }

    let adopting = table_exists(conn, "ticket_table")?;
    if adopting {
        backup_before_adopt(conn)?;
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(BASELINE)?;
    if adopting {
        let present = ticket_columns(&tx)?;
        for column in DECISION_COLUMNS {
            if !present.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                tx.execute_batch(&format!("ALTER TABLE ticket_table ADD COLUMN {column} TEXT"))?;
                log::info!("Added ticket_table.{} to refresh-created store", column);
            }
        }
    }
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;
    tx.commit()?;

    Ok(if adopting {
        SchemaSetup::Adopted
    } else {
        SchemaSetup::Created
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mem_db() -> Connection {
        Connection::open_in_memory().expect("in-memory db")
    }

    #[test]
    fn test_empty_store_gets_baseline() {
        let conn = mem_db();
        assert_eq!(ensure_schema(&conn).unwrap(), SchemaSetup::Created);
        assert_eq!(stamped_version(&conn).unwrap(), SCHEMA_VERSION);

        for table in ["ticket_table", "current_accounts", "future_accounts", "users"] {
            assert!(table_exists(&conn, table).unwrap(), "{table} missing");
        }
        assert_eq!(ensure_schema(&conn).unwrap(), SchemaSetup::Current);
    }

    #[test]
    fn test_refresh_created_store_is_adopted() {
        let conn = mem_db();
        // Layout the snapshot refresh writes: no users table, no decision columns
        conn.execute_batch(
            "CREATE TABLE ticket_table (
                ticket_id INTEGER PRIMARY KEY,
                profile_id TEXT,
                previous_gu_duns TEXT,
                previous_gu_name TEXT,
                new_gu_duns TEXT,
                new_gu_name TEXT,
                reason TEXT
            );
            INSERT INTO ticket_table (ticket_id, reason) VALUES (7, 'Merge');",
        )
        .unwrap();

        assert_eq!(ensure_schema(&conn).unwrap(), SchemaSetup::Adopted);

        let columns = ticket_columns(&conn).unwrap();
        assert!(columns.iter().any(|c| c == "status"));
        assert!(columns.iter().any(|c| c == "approver"));
        assert!(table_exists(&conn, "users").unwrap());

        conn.execute(
            "UPDATE ticket_table SET status = 'Approved', approver = 'alice' WHERE ticket_id = 7",
            [],
        )
        .expect("decision columns are writable");
        let reason: String = conn
            .query_row("SELECT reason FROM ticket_table WHERE ticket_id = 7", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(reason, "Merge");
    }

    #[test]
    fn test_newer_store_is_refused() {
        let conn = mem_db();
        stamped_version(&conn).unwrap();
        conn.execute("INSERT INTO schema_version (version) VALUES (2)", [])
            .unwrap();

        let err = ensure_schema(&conn).unwrap_err();
        assert!(matches!(err, DbError::Migration(ref msg) if msg.contains("v2")));
    }

    #[test]
    fn test_adopting_a_file_leaves_a_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("review.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("CREATE TABLE ticket_table (ticket_id INTEGER PRIMARY KEY, reason TEXT);")
            .unwrap();

        assert_eq!(ensure_schema(&conn).unwrap(), SchemaSetup::Adopted);
        assert!(dir.path().join("review.db.pre-adopt.bak").exists());
    }
}
