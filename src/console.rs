//! Line-oriented terminal front end for a review session.
//!
//! Parses one command per line into a session `Command` (or a console-local
//! action) and renders view models and effects as plain text.

use std::fmt::Write as _;

use crate::error::{ErrorType, ReviewError, ReviewErrorPayload};
use crate::session::{Command, Effect, NoticeLevel, ReviewSession, View};
use crate::types::{Decision, TicketId};
use crate::view::{self, FieldTable, FullTableView, TicketDetailView, TICKET_GRID_COLUMNS};

pub const HELP: &str = "\
Commands:
  login <user>           log in (password is prompted)
  logout                 end the session
  table                  show the ticket table
  reasons                list the reasons available for filtering
  filter <r1>[,<r2>...]  filter tickets by reason
  clear                  clear the reason filter
  open <row>             open a row of the ticket table (1-based)
  ticket <id>            open a ticket by id
  queue                  open the queue at the current position
  next | prev            move through the queue
  approve | deny         record a decision for the open ticket
  back                   return to the ticket table
  refresh                reload tickets and snapshots
  help                   show this text
  quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Needs a password prompt before it becomes `Command::Login`.
    Login(String),
    Session(Command),
    ShowTable,
    ShowReasons,
    Help,
    Quit,
    Empty,
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ConsoleInput, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ConsoleInput::Empty);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "login" => {
            if rest.is_empty() {
                return Err("usage: login <user>".to_string());
            }
            ConsoleInput::Login(rest.to_string())
        }
        "logout" => ConsoleInput::Session(Command::Logout),
        "table" | "list" => ConsoleInput::ShowTable,
        "reasons" => ConsoleInput::ShowReasons,
        "filter" => {
            let reasons: Vec<String> = rest
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
            if reasons.is_empty() {
                return Err("usage: filter <reason>[,<reason>...]".to_string());
            }
            ConsoleInput::Session(Command::ApplyFilter(reasons))
        }
        "clear" => ConsoleInput::Session(Command::ClearFilter),
        "open" => {
            let row: usize = rest
                .parse()
                .map_err(|_| "usage: open <row>".to_string())?;
            if row == 0 {
                return Err("rows are numbered from 1".to_string());
            }
            ConsoleInput::Session(Command::SelectRow(row - 1))
        }
        "ticket" => {
            let id: TicketId = rest
                .parse()
                .map_err(|_| "usage: ticket <id>".to_string())?;
            ConsoleInput::Session(Command::OpenTicket(id))
        }
        "queue" => ConsoleInput::Session(Command::OpenQueue),
        "next" | "n" => ConsoleInput::Session(Command::Next),
        "prev" | "previous" | "p" => ConsoleInput::Session(Command::Previous),
        "approve" => ConsoleInput::Session(Command::Decide(Decision::Approved)),
        "deny" => ConsoleInput::Session(Command::Decide(Decision::Denied)),
        "back" => ConsoleInput::Session(Command::Back),
        "refresh" => ConsoleInput::Session(Command::Refresh),
        "help" | "?" => ConsoleInput::Help,
        "quit" | "exit" => ConsoleInput::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(input)
}

pub fn render_effects(effects: &[Effect]) -> String {
    let mut out = String::new();
    for effect in effects {
        if let Effect::Notice(notice) = effect {
            let tag = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "ok",
                NoticeLevel::Warning => "warning",
            };
            let _ = writeln!(out, "[{tag}] {}", notice.message);
        }
    }
    out
}

pub fn render_error(err: &ReviewError) -> String {
    let payload = ReviewErrorPayload::from(err);
    let tag = match payload.error_type {
        ErrorType::RequiresUserAction => "login",
        ErrorType::Retryable | ErrorType::Recoverable => "error",
    };
    let mut out = format!("[{tag}] {}. {}\n", payload.message, payload.recovery_suggestion);
    if payload.can_retry {
        out.push_str("        Repeat the command to retry.\n");
    }
    out
}

fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.as_slice()));
    }
    out
}

pub fn render_full_table(view: &FullTableView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "All Tickets (loaded {})", view.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));
    if !view.active_filter.is_empty() {
        let _ = writeln!(out, "Filtered by: {}", view.active_filter.join(", "));
    }

    let _ = writeln!(out, "\nTickets by Reason");
    let widest = view.reason_counts.iter().map(|c| c.count).max().unwrap_or(0);
    for count in &view.reason_counts {
        // Scale bars to 40 columns
        let bar = if widest == 0 { 0 } else { (count.count * 40).div_ceil(widest) };
        let _ = writeln!(out, "  {:<24} {:>4} {}", count.reason, count.count, "#".repeat(bar));
    }

    let mut headers = vec!["#".to_string()];
    headers.extend(TICKET_GRID_COLUMNS.iter().map(|c| c.to_string()));
    headers.push("Status".to_string());
    let rows: Vec<Vec<String>> = view
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let mut cells = vec![(i + 1).to_string()];
            cells.extend(row.cells());
            cells.push(row.status.clone().unwrap_or_default());
            cells
        })
        .collect();

    let _ = writeln!(out);
    if rows.is_empty() {
        let _ = writeln!(out, "(no tickets)");
    } else {
        out.push_str(&render_grid(&headers, &rows));
    }
    out
}

fn render_field_table(table: &FieldTable) -> String {
    let mut out = format!("### {}\n", table.title);
    if table.is_empty() {
        out.push_str("(no matching accounts)\n");
        return out;
    }
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut cells = vec![r.field.clone()];
            cells.extend(r.values.iter().cloned());
            cells
        })
        .collect();
    out.push_str(&render_grid(&table.headers, &rows));
    out
}

pub fn render_detail(view: &TicketDetailView) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", view.position_label);
    if let Some(ref filter) = view.filter_label {
        let _ = write!(out, "    {filter}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Ticket: {}", view.ticket_id);
    let _ = writeln!(out, "Reason: {}", view.reason);
    if let Some(ref status) = view.status {
        let approver = view.approver.as_deref().unwrap_or("unknown");
        let _ = writeln!(out, "Status: {status} (by {approver})");
    }
    let _ = writeln!(out);
    out.push_str(&render_field_table(&view.current));
    let _ = writeln!(out);
    out.push_str(&render_field_table(&view.future));
    out
}

/// Render whatever the session's current view shows.
pub fn render_session(session: &ReviewSession) -> String {
    match session.view() {
        View::Unauthenticated => "Login required (login <user>)\n".to_string(),
        View::FullTable => render_full_table(&view::full_table(session)),
        View::SingleTicket => match view::ticket_detail(session) {
            Some(detail) => render_detail(&detail),
            None => "(no ticket selected)\n".to_string(),
        },
    }
}

pub fn render_reasons(session: &ReviewSession) -> String {
    let active = session.queue().reason_filter();
    let mut out = String::new();
    for reason in session.all_reasons() {
        let mark = if active.contains(reason) { "*" } else { " " };
        let label = if reason.is_empty() { "(blank)" } else { reason.as_str() };
        let _ = writeln!(out, " {mark} {label}");
    }
    out
}
