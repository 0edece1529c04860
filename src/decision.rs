//! Decision recorder.
//!
//! Commits an Approve/Deny outcome through the data gateway. The write is a
//! single best-effort attempt with no optimistic lock: two reviewers deciding
//! the same ticket race and the later write wins, and an already-decided
//! ticket can be decided again.

use crate::error::ReviewError;
use crate::gateway::DataGateway;
use crate::types::{Decision, ReviewerIdentity, Ticket, TicketId};

/// Persist `decision` for `ticket_id`, attributed to `approver`.
///
/// On error nothing local has changed; the caller must leave the queue where
/// it is so the reviewer can retry.
pub fn record_decision<G: DataGateway + ?Sized>(
    gateway: &G,
    ticket_id: TicketId,
    decision: Decision,
    approver: &ReviewerIdentity,
) -> Result<(), ReviewError> {
    if approver.username.trim().is_empty() {
        return Err(ReviewError::NotAuthenticated);
    }

    match gateway.update_ticket_decision(ticket_id, decision, &approver.username) {
        Ok(()) => {
            log::info!(
                "Ticket {} {} by {}",
                ticket_id,
                decision.as_str().to_lowercase(),
                approver.username
            );
            Ok(())
        }
        Err(e) => {
            log::warn!("Decision for ticket {} not saved: {}", ticket_id, e);
            Err(match e {
                ReviewError::Persistence(_) => e,
                other => ReviewError::Persistence(other.to_string()),
            })
        }
    }
}

/// Mirror a committed decision onto the session's loaded copy of the tickets,
/// so the grid reflects it before the next refresh.
pub fn mark_decided(tickets: &mut [Ticket], ticket_id: TicketId, decision: Decision, approver: &str) {
    if let Some(ticket) = tickets.iter_mut().find(|t| t.id == ticket_id) {
        ticket.status = Some(decision.as_str().to_string());
        ticket.approver = Some(approver.to_string());
    }
}
