//! Data gateway: the three record sets the review session reads, and the one
//! write it performs.
//!
//! Every read returns the full set; callers re-read on each refresh instead
//! of fetching deltas. Writes are a single statement with no version check.

use crate::db::{DbError, ReviewDb};
use crate::error::ReviewError;
use crate::types::{AccountSnapshotRow, Decision, SnapshotKind, Ticket, TicketId};

pub trait DataGateway {
    fn fetch_all_tickets(&self) -> Result<Vec<Ticket>, ReviewError>;

    fn fetch_current_snapshot(&self) -> Result<Vec<AccountSnapshotRow>, ReviewError>;

    fn fetch_future_snapshot(&self) -> Result<Vec<AccountSnapshotRow>, ReviewError>;

    /// Persist `Status = decision` and `Approver = approver` for one ticket.
    /// Any failure is `ReviewError::Persistence`.
    fn update_ticket_decision(
        &self,
        ticket_id: TicketId,
        decision: Decision,
        approver: &str,
    ) -> Result<(), ReviewError>;
}

fn load_error(e: DbError) -> ReviewError {
    ReviewError::Load(e.to_string())
}

impl DataGateway for ReviewDb {
    fn fetch_all_tickets(&self) -> Result<Vec<Ticket>, ReviewError> {
        self.get_all_tickets().map_err(load_error)
    }

    fn fetch_current_snapshot(&self) -> Result<Vec<AccountSnapshotRow>, ReviewError> {
        self.get_snapshot(SnapshotKind::Current).map_err(load_error)
    }

    fn fetch_future_snapshot(&self) -> Result<Vec<AccountSnapshotRow>, ReviewError> {
        self.get_snapshot(SnapshotKind::Future).map_err(load_error)
    }

    fn update_ticket_decision(
        &self,
        ticket_id: TicketId,
        decision: Decision,
        approver: &str,
    ) -> Result<(), ReviewError> {
        ReviewDb::update_ticket_decision(self, ticket_id, decision, approver)
            .map_err(|e| ReviewError::Persistence(e.to_string()))
    }
}
