//! SQLite-backed review store: tickets, the current/future account snapshots,
//! and reviewer credentials.
//!
//! The database lives at `~/.upreview/upreview.db` unless the config names
//! another path. Tickets and snapshot rows are written by an external refresh
//! process; the reviewer only ever updates `status` and `approver`.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::types::Config;

pub mod schema;
pub mod snapshots;
pub mod tickets;
pub mod types;
pub mod users;
pub use types::*;

pub struct ReviewDb {
    conn: Connection,
}

impl ReviewDb {
    /// Open (or create) the database named by `config`, falling back to
    /// `~/.upreview/upreview.db`, and apply the schema.
    pub fn open(config: &Config) -> Result<Self, DbError> {
        let path = Self::db_path(config)?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL keeps the refresh process's writes from blocking reviewer reads
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        match schema::ensure_schema(&conn)? {
            schema::SchemaSetup::Current => {}
            schema::SchemaSetup::Created => {
                log::info!("Created review schema v{}", schema::SCHEMA_VERSION)
            }
            schema::SchemaSetup::Adopted => {
                log::info!("Adopted refresh-created store at {}", path.display())
            }
        }

        log::info!("Opened review database at {}", path.display());
        Ok(Self { conn })
    }

    /// Resolve the database path: the configured one, else `~/.upreview/upreview.db`.
    pub fn db_path(config: &Config) -> Result<PathBuf, DbError> {
        if let Some(ref explicit) = config.database_path {
            let trimmed = explicit.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".upreview").join("upreview.db"))
    }
}
