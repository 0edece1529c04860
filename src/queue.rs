//! Ticket queue engine.
//!
//! Derives the ordered sequence of ticket ids visible to the reviewer from the
//! loaded tickets and the active reason filter, and keeps the current position
//! and selection consistent with it. Holds ids only; ticket rows stay with the
//! session's loaded data so a refresh can swap them wholesale.
//!
//! Invariants held after every operation:
//! - `ordered_ids` is ascending and matches the filter exactly;
//! - `position < ordered_ids.len()` whenever the list is non-empty;
//! - `selected` is either `None` or `Some(ordered_ids[position])`.

use std::collections::BTreeSet;

use crate::error::ReviewError;
use crate::types::{Ticket, TicketId};

/// How a refresh left the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refreshed {
    /// The selection (or lack of one) carried over.
    Kept,
    /// The selected ticket left the queue; the first id took its place.
    Reselected { lost: TicketId, now: TicketId },
    /// Nothing matches the filter any more.
    Empty,
}

/// Step direction for queue navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// Ticket ids whose reason is in `reason_filter` (every ticket when the filter
/// is empty), ascending.
pub fn compute_ordered_ids(tickets: &[Ticket], reason_filter: &[String]) -> Vec<TicketId> {
    let ids: BTreeSet<TicketId> = tickets
        .iter()
        .filter(|t| reason_filter.is_empty() || reason_filter.iter().any(|r| *r == t.reason))
        .map(|t| t.id)
        .collect();
    ids.into_iter().collect()
}

/// Distinct reasons in order of first appearance.
pub fn distinct_reasons(tickets: &[Ticket]) -> Vec<String> {
    let mut seen = Vec::new();
    for ticket in tickets {
        if !seen.contains(&ticket.reason) {
            seen.push(ticket.reason.clone());
        }
    }
    seen
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueState {
    ordered_ids: Vec<TicketId>,
    position: usize,
    reason_filter: Vec<String>,
    selected: Option<TicketId>,
}

impl QueueState {
    /// Unfiltered queue over `tickets`, positioned on the first id with
    /// nothing selected yet.
    pub fn new(tickets: &[Ticket]) -> Self {
        Self {
            ordered_ids: compute_ordered_ids(tickets, &[]),
            position: 0,
            reason_filter: Vec::new(),
            selected: None,
        }
    }

    pub fn ordered_ids(&self) -> &[TicketId] {
        &self.ordered_ids
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reason_filter(&self) -> &[String] {
        &self.reason_filter
    }

    pub fn selected(&self) -> Option<TicketId> {
        self.selected
    }

    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }

    /// True when the position sits on the final id of a non-empty queue.
    pub fn is_at_end(&self) -> bool {
        !self.is_empty() && self.position + 1 == self.len()
    }

    /// Replace the active filter and reset to the first matching ticket.
    ///
    /// Every reason must be one of `known_reasons`; otherwise nothing changes.
    /// A filter that matches nothing is kept but leaves the queue empty with no
    /// selection and returns `EmptyFilterResult`.
    pub fn apply_filter(
        &mut self,
        tickets: &[Ticket],
        known_reasons: &[String],
        reason_filter: Vec<String>,
    ) -> Result<TicketId, ReviewError> {
        if let Some(unknown) = reason_filter.iter().find(|r| !known_reasons.contains(r)) {
            return Err(ReviewError::UnknownReason(unknown.clone()));
        }

        let mut filter: Vec<String> = Vec::with_capacity(reason_filter.len());
        for reason in reason_filter {
            if !filter.contains(&reason) {
                filter.push(reason);
            }
        }

        self.reason_filter = filter;
        self.ordered_ids = compute_ordered_ids(tickets, &self.reason_filter);
        log::debug!(
            "Queue filter {:?} matches {} ticket(s)",
            self.reason_filter,
            self.ordered_ids.len()
        );
        self.reset_to_first()
    }

    /// Drop the filter and reset to the first ticket overall.
    pub fn clear_filter(&mut self, tickets: &[Ticket]) -> Result<TicketId, ReviewError> {
        self.reason_filter.clear();
        self.ordered_ids = compute_ordered_ids(tickets, &[]);
        self.reset_to_first()
    }

    /// Select `id` if it is in the current queue.
    pub fn select_ticket(&mut self, id: TicketId) -> Result<(), ReviewError> {
        match self.ordered_ids.binary_search(&id) {
            Ok(index) => {
                self.position = index;
                self.selected = Some(id);
                Ok(())
            }
            Err(_) => Err(ReviewError::InvalidSelection(id)),
        }
    }

    /// Start over at the first id. Used when entering the queue without an
    /// explicit pick.
    pub fn select_first(&mut self) -> Option<TicketId> {
        self.reset_to_first().ok()
    }

    /// Move one step. Returns false, changing nothing, at either boundary.
    pub fn advance(&mut self, direction: Direction) -> bool {
        let target = match direction {
            Direction::Previous if self.position > 0 => self.position - 1,
            Direction::Next if self.position + 1 < self.ordered_ids.len() => self.position + 1,
            _ => return false,
        };
        self.position = target;
        self.selected = Some(self.ordered_ids[target]);
        log::debug!("Queue moved {:?} to position {}", direction, target);
        true
    }

    /// Forget the selection without touching the list or filter.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Recompute the list from freshly loaded tickets under the current
    /// filter. A selection that survives keeps its ticket (its position may
    /// move); one that vanished falls back to the first id.
    pub fn refresh(&mut self, tickets: &[Ticket]) -> Refreshed {
        self.ordered_ids = compute_ordered_ids(tickets, &self.reason_filter);
        if self.ordered_ids.is_empty() {
            self.position = 0;
            self.selected = None;
            return Refreshed::Empty;
        }

        match self.selected {
            Some(id) => match self.select_ticket(id) {
                Ok(()) => Refreshed::Kept,
                Err(_) => {
                    log::warn!("Ticket {} left the queue on refresh; reselecting first", id);
                    let first = self.ordered_ids[0];
                    self.position = 0;
                    self.selected = Some(first);
                    Refreshed::Reselected { lost: id, now: first }
                }
            },
            None => {
                self.position = self.position.min(self.ordered_ids.len() - 1);
                Refreshed::Kept
            }
        }
    }

    fn reset_to_first(&mut self) -> Result<TicketId, ReviewError> {
        self.position = 0;
        match self.ordered_ids.first().copied() {
            Some(first) => {
                self.selected = Some(first);
                Ok(first)
            }
            None => {
                self.selected = None;
                Err(ReviewError::EmptyFilterResult)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::sample_ticket;

    fn tickets() -> Vec<Ticket> {
        vec![
            sample_ticket(1, "Dup"),
            sample_ticket(2, "Merge"),
            sample_ticket(3, "Dup"),
        ]
    }

    fn reasons(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn ids(list: &[i64]) -> Vec<TicketId> {
        list.iter().copied().map(TicketId).collect()
    }

    #[test]
    fn test_compute_ordered_ids_sorts_and_filters() {
        let shuffled = vec![
            sample_ticket(30, "Merge"),
            sample_ticket(4, "Dup"),
            sample_ticket(12, "Split"),
            sample_ticket(1, "Merge"),
        ];

        assert_eq!(compute_ordered_ids(&shuffled, &[]), ids(&[1, 4, 12, 30]));
        assert_eq!(
            compute_ordered_ids(&shuffled, &reasons(&["Merge"])),
            ids(&[1, 30])
        );
        assert_eq!(
            compute_ordered_ids(&shuffled, &reasons(&["Split", "Dup"])),
            ids(&[4, 12])
        );
        assert!(compute_ordered_ids(&shuffled, &reasons(&["Other"])).is_empty());
    }

    #[test]
    fn test_distinct_reasons_keep_first_appearance_order() {
        assert_eq!(distinct_reasons(&tickets()), reasons(&["Dup", "Merge"]));
    }

    #[test]
    fn test_filter_then_next() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);

        let first = queue
            .apply_filter(&all, &known, reasons(&["Dup"]))
            .expect("Dup matches");
        assert_eq!(first, TicketId(1));
        assert_eq!(queue.ordered_ids(), ids(&[1, 3]).as_slice());
        assert_eq!(queue.position(), 0);

        assert!(queue.advance(Direction::Next));
        assert_eq!(queue.position(), 1);
        assert_eq!(queue.selected(), Some(TicketId(3)));
    }

    #[test]
    fn test_apply_then_clear_restores_full_list() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);
        let unfiltered = queue.ordered_ids().to_vec();

        queue.apply_filter(&all, &known, reasons(&["Merge"])).unwrap();
        assert_eq!(queue.ordered_ids(), ids(&[2]).as_slice());

        let first = queue.clear_filter(&all).unwrap();
        assert_eq!(first, TicketId(1));
        assert_eq!(queue.ordered_ids(), unfiltered.as_slice());
        assert!(queue.reason_filter().is_empty());
        assert_eq!(queue.position(), 0);
    }

    #[test]
    fn test_advance_is_clamped_at_both_ends() {
        let all = tickets();
        let mut queue = QueueState::new(&all);
        queue.select_ticket(TicketId(1)).unwrap();

        assert!(!queue.advance(Direction::Previous));
        assert_eq!(queue.position(), 0);
        assert_eq!(queue.selected(), Some(TicketId(1)));

        queue.select_ticket(TicketId(3)).unwrap();
        assert!(queue.is_at_end());
        assert!(!queue.advance(Direction::Next));
        assert_eq!(queue.position(), 2);
        assert_eq!(queue.selected(), Some(TicketId(3)));
    }

    #[test]
    fn test_select_ticket_outside_queue_fails() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);
        queue.apply_filter(&all, &known, reasons(&["Dup"])).unwrap();

        let err = queue.select_ticket(TicketId(2)).unwrap_err();
        assert!(matches!(err, ReviewError::InvalidSelection(TicketId(2))));
        assert_eq!(queue.selected(), Some(TicketId(1)), "selection untouched");

        queue.select_ticket(TicketId(3)).unwrap();
        assert_eq!(queue.position(), 1);
    }

    #[test]
    fn test_filter_change_reselects_when_selection_drops_out() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);
        queue.select_ticket(TicketId(2)).unwrap();

        queue.apply_filter(&all, &known, reasons(&["Dup"])).unwrap();
        let selected = queue.selected().expect("something selected");
        assert!(queue.ordered_ids().contains(&selected));
        assert_eq!(selected, TicketId(1));
    }

    #[test]
    fn test_empty_filter_result_clears_selection() {
        let all = vec![sample_ticket(1, "Dup"), sample_ticket(2, "Merge")];
        let known = reasons(&["Dup", "Merge", "Orphan"]);
        let mut queue = QueueState::new(&all);
        queue.select_ticket(TicketId(2)).unwrap();

        let err = queue
            .apply_filter(&all, &known, reasons(&["Orphan"]))
            .unwrap_err();
        assert!(matches!(err, ReviewError::EmptyFilterResult));
        assert!(queue.is_empty());
        assert_eq!(queue.selected(), None);
        assert_eq!(queue.reason_filter(), reasons(&["Orphan"]).as_slice());
    }

    #[test]
    fn test_unknown_reason_is_rejected_without_change() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);
        let before = queue.clone();

        let err = queue
            .apply_filter(&all, &known, reasons(&["Dup", "Typo"]))
            .unwrap_err();
        assert!(matches!(err, ReviewError::UnknownReason(ref r) if r == "Typo"));
        assert_eq!(queue, before);
    }

    #[test]
    fn test_duplicate_reasons_collapse() {
        let all = tickets();
        let known = distinct_reasons(&all);
        let mut queue = QueueState::new(&all);
        queue
            .apply_filter(&all, &known, reasons(&["Dup", "Dup"]))
            .unwrap();
        assert_eq!(queue.reason_filter(), reasons(&["Dup"]).as_slice());
    }

    #[test]
    fn test_refresh_follows_selected_ticket() {
        let mut all = tickets();
        let mut queue = QueueState::new(&all);
        queue.select_ticket(TicketId(3)).unwrap();
        assert_eq!(queue.position(), 2);

        // A ticket with a lower id arrives from the refresh process
        all.push(sample_ticket(0, "Merge"));
        assert_eq!(queue.refresh(&all), Refreshed::Kept);
        assert_eq!(queue.selected(), Some(TicketId(3)));
        assert_eq!(queue.position(), 3);
    }

    #[test]
    fn test_refresh_falls_back_when_selection_vanishes() {
        let all = tickets();
        let mut queue = QueueState::new(&all);
        queue.select_ticket(TicketId(3)).unwrap();

        let shrunk = vec![sample_ticket(1, "Dup"), sample_ticket(2, "Merge")];
        assert_eq!(
            queue.refresh(&shrunk),
            Refreshed::Reselected {
                lost: TicketId(3),
                now: TicketId(1)
            }
        );
        assert_eq!(queue.selected(), Some(TicketId(1)));
        assert_eq!(queue.position(), 0);

        assert_eq!(queue.refresh(&[]), Refreshed::Empty);
        assert_eq!(queue.selected(), None);
    }

    #[test]
    fn test_select_first_ignores_stale_position() {
        let all = tickets();
        let mut queue = QueueState::new(&all);
        assert_eq!(queue.selected(), None);
        queue.select_ticket(TicketId(3)).unwrap();
        queue.clear_selection();
        assert_eq!(queue.position(), 2);

        assert_eq!(queue.select_first(), Some(TicketId(1)));
        assert_eq!(queue.position(), 0);

        let mut empty = QueueState::new(&[]);
        assert_eq!(empty.select_first(), None);
        assert!(!empty.is_at_end());
    }
}
