use rusqlite::params;

use super::*;
use crate::types::{Decision, Ticket, TicketId};

const TICKET_COLUMNS: &str = "ticket_id, profile_id, previous_gu_duns, previous_gu_name,
                              new_gu_duns, new_gu_name, reason, status, approver";

impl ReviewDb {
    // =========================================================================
    // Tickets
    // =========================================================================

    /// Insert or replace a ticket. Used by seeding and tests; the review
    /// workflow itself never creates tickets.
    pub fn insert_ticket(&self, ticket: &Ticket) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO ticket_table (
                ticket_id, profile_id, previous_gu_duns, previous_gu_name,
                new_gu_duns, new_gu_name, reason, status, approver
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(ticket_id) DO UPDATE SET
                profile_id = excluded.profile_id,
                previous_gu_duns = excluded.previous_gu_duns,
                previous_gu_name = excluded.previous_gu_name,
                new_gu_duns = excluded.new_gu_duns,
                new_gu_name = excluded.new_gu_name,
                reason = excluded.reason,
                status = excluded.status,
                approver = excluded.approver",
            params![
                ticket.id.0,
                ticket.profile_id,
                ticket.previous_gu_duns,
                ticket.previous_gu_name,
                ticket.new_gu_duns,
                ticket.new_gu_name,
                ticket.reason,
                ticket.status,
                ticket.approver,
            ],
        )?;
        Ok(())
    }

    /// Get every ticket in table order.
    pub fn get_all_tickets(&self) -> Result<Vec<Ticket>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM ticket_table ORDER BY rowid"
        ))?;
        let rows = stmt.query_map([], Self::map_ticket_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Get a ticket by ID.
    pub fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TICKET_COLUMNS} FROM ticket_table WHERE ticket_id = ?1"
        ))?;
        let mut rows = stmt.query_map(params![id.0], Self::map_ticket_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Set `status` and `approver` on one ticket. No version check: the last
    /// writer wins, and a ticket that was already decided is overwritten.
    pub fn update_ticket_decision(
        &self,
        id: TicketId,
        decision: Decision,
        approver: &str,
    ) -> Result<(), DbError> {
        let updated = self.conn.execute(
            "UPDATE ticket_table SET status = ?1, approver = ?2 WHERE ticket_id = ?3",
            params![decision.as_str(), approver, id.0],
        )?;
        if updated == 0 {
            return Err(DbError::TicketNotFound(id.0));
        }
        Ok(())
    }

    fn map_ticket_row(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        Ok(Ticket {
            id: TicketId(row.get(0)?),
            profile_id: row.get(1)?,
            previous_gu_duns: row.get(2)?,
            previous_gu_name: row.get(3)?,
            new_gu_duns: row.get(4)?,
            new_gu_name: row.get(5)?,
            reason: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
            status: row.get(7)?,
            approver: row.get(8)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{sample_ticket, seeded_db, test_db};
    use super::*;

    #[test]
    fn test_get_all_tickets_in_table_order() {
        let db = test_db();
        db.insert_ticket(&sample_ticket(5, "Merge")).unwrap();
        db.insert_ticket(&sample_ticket(2, "Dup")).unwrap();

        let tickets = db.get_all_tickets().expect("query");
        let ids: Vec<i64> = tickets.iter().map(|t| t.id.0).collect();
        assert_eq!(ids, vec![2, 5]);
        assert_eq!(tickets[1].reason, "Merge");
        assert!(tickets[0].status.is_none());
    }

    #[test]
    fn test_update_ticket_decision_sets_status_and_approver() {
        let db = seeded_db();
        db.update_ticket_decision(TicketId(1), Decision::Approved, "alice")
            .expect("update");

        let ticket = db.get_ticket(TicketId(1)).unwrap().expect("ticket 1");
        assert_eq!(ticket.status.as_deref(), Some("Approved"));
        assert_eq!(ticket.approver.as_deref(), Some("alice"));

        let untouched = db.get_ticket(TicketId(2)).unwrap().expect("ticket 2");
        assert!(untouched.status.is_none());
    }

    #[test]
    fn test_redecision_overwrites_previous_outcome() {
        let db = seeded_db();
        db.update_ticket_decision(TicketId(3), Decision::Approved, "alice")
            .unwrap();
        db.update_ticket_decision(TicketId(3), Decision::Denied, "bob")
            .unwrap();

        let ticket = db.get_ticket(TicketId(3)).unwrap().unwrap();
        assert_eq!(ticket.status.as_deref(), Some("Denied"));
        assert_eq!(ticket.approver.as_deref(), Some("bob"));
    }

    #[test]
    fn test_update_missing_ticket_is_an_error() {
        let db = seeded_db();
        let err = db
            .update_ticket_decision(TicketId(99), Decision::Denied, "alice")
            .unwrap_err();
        assert!(matches!(err, DbError::TicketNotFound(99)));
    }

    #[test]
    fn test_null_reason_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refresh.db");
        {
            // The refresh writes reason without a NOT NULL constraint
            let conn = rusqlite::Connection::open(&path).unwrap();
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
                 INSERT INTO ticket_table (ticket_id, reason) VALUES (4, NULL);",
            )
            .unwrap();
        }

        let db = ReviewDb::open_at(path).unwrap();
        let ticket = db.get_ticket(TicketId(4)).unwrap().unwrap();
        assert_eq!(ticket.reason, "");
        assert!(ticket.profile_id.is_none());
        assert!(ticket.status.is_none());
    }
}
