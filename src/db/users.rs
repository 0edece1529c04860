use rusqlite::params;

use super::*;
use crate::types::ReviewerIdentity;

impl ReviewDb {
    // =========================================================================
    // Reviewers
    // =========================================================================

    /// Insert or replace a reviewer's stored credential hash.
    pub fn insert_user(&self, username: &str, password_hash: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO users (username, password) VALUES (?1, ?2)
             ON CONFLICT(username) DO UPDATE SET password = excluded.password",
            params![username, password_hash],
        )?;
        Ok(())
    }

    /// Look up a reviewer by exact username.
    pub fn get_user(&self, username: &str) -> Result<Option<ReviewerIdentity>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, password FROM users WHERE username = ?1")?;
        let mut rows = stmt.query_map(params![username], |row| {
            Ok(ReviewerIdentity {
                username: row.get(0)?,
                credential_hash: row.get(1)?,
            })
        })?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }
}
