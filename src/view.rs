//! View models handed to the presentation layer.
//!
//! Nothing here renders; it projects session state into the shapes the
//! dashboard shows: the ticket grid with per-reason counts, and the
//! single-ticket page with two transposed snapshot tables side by side.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::session::ReviewSession;
use crate::types::{AccountSnapshotRow, Ticket, TicketId};

/// Fields of the current snapshot shown on the ticket page, in display order.
pub const CURRENT_DETAIL_FIELDS: &[&str] = &[
    "Enterprise ID",
    "Account Name",
    "Record Type ID",
    "Ultimate Parent Name",
    "Ultimate Parent Enterprise ID",
    "Billing Street",
    "D&B Connect DUNS Number",
    "D&B Connect GU DUNS",
    "D&B Connect GU Name",
    "D&B Connect Company Profile",
    "Previous GU DUNS",
    "New GU DUNS",
    "Previous GU Name",
    "New GU Name",
];

/// The future snapshot shows the account attributes only.
pub const FUTURE_DETAIL_FIELDS: &[&str] = &[
    "Enterprise ID",
    "Account Name",
    "Record Type ID",
    "Ultimate Parent Name",
    "Ultimate Parent Enterprise ID",
    "Billing Street",
    "D&B Connect DUNS Number",
    "D&B Connect GU DUNS",
    "D&B Connect GU Name",
    "D&B Connect Company Profile",
];

pub const TICKET_GRID_COLUMNS: &[&str] = &[
    "TicketID",
    "D&B ProfileID",
    "Previous GU DUNS",
    "Previous GU Name",
    "New GU DUNS",
    "New GU Name",
    "Reason",
];

pub const CURRENT_PANEL_TITLE: &str = "Accounts linked to D&B Profile";
pub const FUTURE_PANEL_TITLE: &str = "Accounts Linked to D&B GU Profile";

fn snapshot_field<'a>(row: &'a AccountSnapshotRow, field: &str) -> Option<&'a str> {
    let value = match field {
        "Enterprise ID" => &row.enterprise_id,
        "Account Name" => &row.account_name,
        "Record Type ID" => &row.record_type_id,
        "Ultimate Parent Name" => &row.ultimate_parent_name,
        "Ultimate Parent Enterprise ID" => &row.ultimate_parent_enterprise_id,
        "Billing Street" => &row.billing_street,
        "D&B Connect DUNS Number" => &row.duns_number,
        "D&B Connect GU DUNS" => &row.gu_duns,
        "D&B Connect GU Name" => &row.gu_name,
        "D&B Connect Company Profile" => &row.company_profile,
        "Previous GU DUNS" => &row.previous_gu_duns,
        "New GU DUNS" => &row.new_gu_duns,
        "Previous GU Name" => &row.previous_gu_name,
        "New GU Name" => &row.new_gu_name,
        _ => return None,
    };
    value.as_deref()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketGridRow {
    pub ticket_id: TicketId,
    pub profile_id: String,
    pub previous_gu_duns: String,
    pub previous_gu_name: String,
    pub new_gu_duns: String,
    pub new_gu_name: String,
    pub reason: String,
    /// Not a grid column; lets the console mark decided rows.
    pub status: Option<String>,
}

impl TicketGridRow {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            ticket_id: ticket.id,
            profile_id: text(&ticket.profile_id),
            previous_gu_duns: text(&ticket.previous_gu_duns),
            previous_gu_name: text(&ticket.previous_gu_name),
            new_gu_duns: text(&ticket.new_gu_duns),
            new_gu_name: text(&ticket.new_gu_name),
            reason: ticket.reason.clone(),
            status: ticket.status.clone(),
        }
    }

    /// Cells in `TICKET_GRID_COLUMNS` order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.ticket_id.to_string(),
            self.profile_id.clone(),
            self.previous_gu_duns.clone(),
            self.previous_gu_name.clone(),
            self.new_gu_duns.clone(),
            self.new_gu_name.clone(),
            self.reason.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasonCount {
    pub reason: String,
    pub count: usize,
}

/// Per-reason ticket counts, most frequent first; ties keep first appearance.
pub fn reason_counts(tickets: &[&Ticket]) -> Vec<ReasonCount> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for ticket in tickets {
        let entry = counts.entry(ticket.reason.as_str()).or_insert(0);
        if *entry == 0 {
            order.push(ticket.reason.as_str());
        }
        *entry += 1;
    }

    let mut result: Vec<ReasonCount> = order
        .into_iter()
        .map(|reason| ReasonCount {
            reason: reason.to_string(),
            count: counts[reason],
        })
        .collect();
    // sort_by is stable, so equal counts stay in first-appearance order
    result.sort_by(|a, b| b.count.cmp(&a.count));
    result
}

#[derive(Debug, Clone)]
pub struct FullTableView {
    pub rows: Vec<TicketGridRow>,
    pub reason_counts: Vec<ReasonCount>,
    pub all_reasons: Vec<String>,
    pub active_filter: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

pub fn full_table(session: &ReviewSession) -> FullTableView {
    let tickets = session.table_tickets();
    FullTableView {
        rows: tickets.iter().map(|t| TicketGridRow::from_ticket(t)).collect(),
        reason_counts: reason_counts(&tickets),
        all_reasons: session.all_reasons().to_vec(),
        active_filter: session.queue().reason_filter().to_vec(),
        loaded_at: session.data().loaded_at,
    }
}

/// A snapshot transposed for display: one row per field, one value column
/// per joined snapshot row. `headers` is `["Field", "1", "2", ...]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<FieldRow>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub field: String,
    pub values: Vec<String>,
}

impl FieldTable {
    /// True when the ticket joined to no snapshot rows.
    pub fn is_empty(&self) -> bool {
        self.headers.len() <= 1
    }
}

pub fn transpose_snapshot(
    title: &str,
    snapshot_rows: &[&AccountSnapshotRow],
    fields: &[&str],
) -> FieldTable {
    let mut headers = vec!["Field".to_string()];
    headers.extend((1..=snapshot_rows.len()).map(|i| i.to_string()));

    let rows = fields
        .iter()
        .map(|field| FieldRow {
            field: field.to_string(),
            values: snapshot_rows
                .iter()
                .map(|row| snapshot_field(row, field).unwrap_or_default().to_string())
                .collect(),
        })
        .collect();

    FieldTable {
        title: title.to_string(),
        headers,
        rows,
    }
}

#[derive(Debug, Clone)]
pub struct TicketDetailView {
    pub ticket_id: TicketId,
    /// "N/A" when the ticket row is missing from the loaded data.
    pub reason: String,
    pub status: Option<String>,
    pub approver: Option<String>,
    /// "Ticket 2 of 5"
    pub position_label: String,
    /// "Filtered by: Dup, Merge" when a filter is active.
    pub filter_label: Option<String>,
    pub current: FieldTable,
    pub future: FieldTable,
}

fn joined_rows(rows: &[AccountSnapshotRow], ticket_id: TicketId) -> Vec<&AccountSnapshotRow> {
    rows.iter()
        .filter(|r| r.ticket_id == Some(ticket_id))
        .collect()
}

/// Detail for the selected ticket, or `None` outside single-ticket view.
pub fn ticket_detail(session: &ReviewSession) -> Option<TicketDetailView> {
    let ticket_id = session.queue().selected()?;
    let ticket = session.ticket(ticket_id);
    let queue = session.queue();

    let data = session.data();

    let filter = queue.reason_filter();
    Some(TicketDetailView {
        ticket_id,
        reason: ticket
            .map(|t| t.reason.clone())
            .unwrap_or_else(|| "N/A".to_string()),
        status: ticket.and_then(|t| t.status.clone()),
        approver: ticket.and_then(|t| t.approver.clone()),
        position_label: format!("Ticket {} of {}", queue.position() + 1, queue.len()),
        filter_label: (!filter.is_empty()).then(|| format!("Filtered by: {}", filter.join(", "))),
        current: transpose_snapshot(
            CURRENT_PANEL_TITLE,
            &joined_rows(&data.current, ticket_id),
            CURRENT_DETAIL_FIELDS,
        ),
        future: transpose_snapshot(
            FUTURE_PANEL_TITLE,
            &joined_rows(&data.future, ticket_id),
            FUTURE_DETAIL_FIELDS,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provision_reviewer;
    use crate::db::test_utils::{sample_snapshot_row, sample_ticket, seeded_db};
    use crate::session::Command;
    use crate::types::SnapshotKind;

    fn session_for(db: &crate::db::ReviewDb) -> ReviewSession {
        provision_reviewer(db, "alice", "pw").unwrap();
        let mut session = ReviewSession::new();
        session
            .handle(
                Command::Login {
                    username: "alice".to_string(),
                    password: "pw".to_string(),
                },
                db,
                db,
            )
            .unwrap();
        session
    }

    #[test]
    fn test_reason_counts_most_frequent_first() {
        let tickets = [
            sample_ticket(1, "Merge"),
            sample_ticket(2, "Dup"),
            sample_ticket(3, "Dup"),
            sample_ticket(4, "Split"),
        ];
        let refs: Vec<&Ticket> = tickets.iter().collect();
        let counts = reason_counts(&refs);
        let flat: Vec<(&str, usize)> = counts.iter().map(|c| (c.reason.as_str(), c.count)).collect();
        assert_eq!(flat, vec![("Dup", 2), ("Merge", 1), ("Split", 1)]);
    }

    #[test]
    fn test_full_table_follows_filter() {
        let db = seeded_db();
        let mut session = session_for(&db);
        session
            .handle(Command::ApplyFilter(vec!["Merge".to_string()]), &db, &db)
            .unwrap();

        let view = full_table(&session);
        assert_eq!(view.rows.len(), 1);
        assert_eq!(view.rows[0].ticket_id, TicketId(2));
        assert_eq!(view.rows[0].cells().len(), TICKET_GRID_COLUMNS.len());
        assert_eq!(view.reason_counts, vec![ReasonCount { reason: "Merge".to_string(), count: 1 }]);
        assert_eq!(view.all_reasons, vec!["Dup".to_string(), "Merge".to_string()]);
    }

    #[test]
    fn test_transpose_one_column_per_joined_row() {
        let a = sample_snapshot_row(1, "Acme Ltd");
        let b = sample_snapshot_row(1, "Acme GmbH");
        let table = transpose_snapshot("t", &[&a, &b], FUTURE_DETAIL_FIELDS);

        assert_eq!(table.headers, vec!["Field", "1", "2"]);
        assert_eq!(table.rows.len(), FUTURE_DETAIL_FIELDS.len());
        let names = table.rows.iter().find(|r| r.field == "Account Name").unwrap();
        assert_eq!(names.values, vec!["Acme Ltd", "Acme GmbH"]);
        let street = table.rows.iter().find(|r| r.field == "Billing Street").unwrap();
        assert_eq!(street.values, vec!["", ""]);
    }

    #[test]
    fn test_ticket_detail_for_selected_ticket() {
        let db = seeded_db();
        db.insert_snapshot_row(SnapshotKind::Current, &sample_snapshot_row(1, "Acme GmbH"))
            .unwrap();
        let mut session = session_for(&db);
        assert!(ticket_detail(&session).is_none(), "table view has no detail");

        session.handle(Command::OpenTicket(TicketId(1)), &db, &db).unwrap();
        let detail = ticket_detail(&session).expect("detail");
        assert_eq!(detail.reason, "Dup");
        assert_eq!(detail.position_label, "Ticket 1 of 3");
        assert!(detail.filter_label.is_none());
        assert_eq!(detail.current.headers.len(), 3);
        assert_eq!(detail.current.rows.len(), CURRENT_DETAIL_FIELDS.len());
        assert_eq!(detail.future.headers.len(), 2);
        assert_eq!(detail.future.rows.len(), FUTURE_DETAIL_FIELDS.len());
    }

    #[test]
    fn test_ticket_without_snapshot_rows_has_empty_tables() {
        let db = seeded_db();
        let mut session = session_for(&db);
        session
            .handle(Command::ApplyFilter(vec!["Dup".to_string()]), &db, &db)
            .unwrap();
        session.handle(Command::OpenTicket(TicketId(3)), &db, &db).unwrap();

        let detail = ticket_detail(&session).unwrap();
        assert_eq!(detail.position_label, "Ticket 2 of 2");
        assert_eq!(detail.filter_label.as_deref(), Some("Filtered by: Dup"));
        assert!(detail.current.is_empty());
        assert!(detail.future.is_empty());
        assert!(detail.current.rows.iter().all(|r| r.values.is_empty()));
    }
}
