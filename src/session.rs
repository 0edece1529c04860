//! Review session state machine.
//!
//! A `ReviewSession` is owned by whatever drives the reviewer's interaction
//! (the console, a web handler) and is mutated only through `handle`, which
//! takes one `Command` and returns the effects the presentation layer must
//! apply: notices to show and view changes to perform.
//!
//! ```text
//! Unauthenticated --login ok--> FullTable --row/open--> SingleTicket
//!        ^                          ^                        |
//!        +--------- logout ---------+---- back / empty ------+
//!                                   +---- queue complete ----+
//! ```

use chrono::{DateTime, Utc};

use crate::auth::CredentialVerifier;
use crate::decision::{mark_decided, record_decision};
use crate::error::ReviewError;
use crate::gateway::DataGateway;
use crate::queue::{distinct_reasons, Direction, QueueState, Refreshed};
use crate::types::{AccountSnapshotRow, Decision, ReviewerIdentity, Ticket, TicketId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Unauthenticated,
    FullTable,
    SingleTicket,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// An inline message for the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notice(Notice),
    ViewChanged(View),
}

impl Effect {
    fn info(message: impl Into<String>) -> Self {
        Effect::Notice(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        })
    }

    fn success(message: impl Into<String>) -> Self {
        Effect::Notice(Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        })
    }

    fn warning(message: impl Into<String>) -> Self {
        Effect::Notice(Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login { username: String, password: String },
    Logout,
    /// Re-read every record set from the store.
    Refresh,
    /// Pick a row of the full ticket table (zero-based, filtered table order).
    SelectRow(usize),
    OpenTicket(TicketId),
    /// Enter single-ticket view at the current queue position.
    OpenQueue,
    Back,
    ApplyFilter(Vec<String>),
    ClearFilter,
    Previous,
    Next,
    Decide(Decision),
}

/// The three record sets as read at `loaded_at`.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub tickets: Vec<Ticket>,
    pub current: Vec<AccountSnapshotRow>,
    pub future: Vec<AccountSnapshotRow>,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedData {
    pub fn fetch<G: DataGateway + ?Sized>(gateway: &G) -> Result<Self, ReviewError> {
        let data = Self {
            tickets: gateway.fetch_all_tickets()?,
            current: gateway.fetch_current_snapshot()?,
            future: gateway.fetch_future_snapshot()?,
            loaded_at: Utc::now(),
        };
        log::info!(
            "Loaded {} ticket(s), {} current and {} future snapshot row(s)",
            data.tickets.len(),
            data.current.len(),
            data.future.len()
        );
        Ok(data)
    }

    fn empty() -> Self {
        Self {
            tickets: Vec::new(),
            current: Vec::new(),
            future: Vec::new(),
            loaded_at: Utc::now(),
        }
    }
}

pub struct ReviewSession {
    view: View,
    reviewer: Option<ReviewerIdentity>,
    data: LoadedData,
    /// Reasons present when the session loaded; the filter vocabulary.
    all_reasons: Vec<String>,
    queue: QueueState,
}

impl Default for ReviewSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewSession {
    pub fn new() -> Self {
        Self {
            view: View::Unauthenticated,
            reviewer: None,
            data: LoadedData::empty(),
            all_reasons: Vec::new(),
            queue: QueueState::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn reviewer(&self) -> Option<&ReviewerIdentity> {
        self.reviewer.as_ref()
    }

    pub fn data(&self) -> &LoadedData {
        &self.data
    }

    pub fn all_reasons(&self) -> &[String] {
        &self.all_reasons
    }

    pub fn queue(&self) -> &QueueState {
        &self.queue
    }

    pub fn ticket(&self, id: TicketId) -> Option<&Ticket> {
        self.data.tickets.iter().find(|t| t.id == id)
    }

    pub fn selected_ticket(&self) -> Option<&Ticket> {
        self.queue.selected().and_then(|id| self.ticket(id))
    }

    /// Tickets shown in the full table: store order, narrowed by the filter.
    pub fn table_tickets(&self) -> Vec<&Ticket> {
        let filter = self.queue.reason_filter();
        self.data
            .tickets
            .iter()
            .filter(|t| filter.is_empty() || filter.contains(&t.reason))
            .collect()
    }

    /// Apply one reviewer command.
    ///
    /// Invalid selections and empty filter results are corrected here and
    /// reported as notices. Everything else that fails comes back as `Err`
    /// with the session exactly as it was before the call.
    pub fn handle<G, V>(
        &mut self,
        command: Command,
        gateway: &G,
        verifier: &V,
    ) -> Result<Vec<Effect>, ReviewError>
    where
        G: DataGateway + ?Sized,
        V: CredentialVerifier + ?Sized,
    {
        if self.reviewer.is_none() && !matches!(command, Command::Login { .. }) {
            return Err(ReviewError::NotAuthenticated);
        }

        match command {
            Command::Login { username, password } => {
                self.login(&username, &password, gateway, verifier)
            }
            Command::Logout => Ok(self.logout()),
            Command::Refresh => self.refresh(gateway),
            Command::SelectRow(index) => {
                let id = self
                    .table_tickets()
                    .get(index)
                    .map(|t| t.id)
                    .ok_or(ReviewError::RowOutOfRange(index.saturating_add(1)))?;
                Ok(self.open_ticket(id))
            }
            Command::OpenTicket(id) => Ok(self.open_ticket(id)),
            Command::OpenQueue => Ok(self.open_queue()),
            Command::Back => Ok(self.back()),
            Command::ApplyFilter(reasons) => {
                let result = self
                    .queue
                    .apply_filter(&self.data.tickets, &self.all_reasons, reasons);
                self.after_filter_change(result)
            }
            Command::ClearFilter => {
                let result = self.queue.clear_filter(&self.data.tickets);
                self.after_filter_change(result)
            }
            Command::Previous => self.step(Direction::Previous),
            Command::Next => self.step(Direction::Next),
            Command::Decide(decision) => self.decide(decision, gateway),
        }
    }

    fn set_view(&mut self, view: View, effects: &mut Vec<Effect>) {
        if self.view != view {
            self.view = view;
            effects.push(Effect::ViewChanged(view));
        }
    }

    fn login<G, V>(
        &mut self,
        username: &str,
        password: &str,
        gateway: &G,
        verifier: &V,
    ) -> Result<Vec<Effect>, ReviewError>
    where
        G: DataGateway + ?Sized,
        V: CredentialVerifier + ?Sized,
    {
        let identity = verifier.verify(username.trim(), password)?;
        let data = LoadedData::fetch(gateway)?;

        log::info!("Reviewer {} logged in", identity.username);
        self.all_reasons = distinct_reasons(&data.tickets);
        self.queue = QueueState::new(&data.tickets);
        self.data = data;

        let mut effects = vec![Effect::info(format!("Logged in as {}", identity.username))];
        self.reviewer = Some(identity);
        self.view = View::Unauthenticated;
        self.set_view(View::FullTable, &mut effects);
        Ok(effects)
    }

    fn logout(&mut self) -> Vec<Effect> {
        if let Some(ref reviewer) = self.reviewer {
            log::info!("Reviewer {} logged out", reviewer.username);
        }
        *self = Self::new();
        vec![Effect::ViewChanged(View::Unauthenticated)]
    }

    fn refresh<G: DataGateway + ?Sized>(&mut self, gateway: &G) -> Result<Vec<Effect>, ReviewError> {
        let data = LoadedData::fetch(gateway)?;
        self.data = data;

        let mut effects = vec![Effect::info(format!(
            "Reloaded {} ticket(s)",
            self.data.tickets.len()
        ))];
        match self.queue.refresh(&self.data.tickets) {
            Refreshed::Kept => {}
            Refreshed::Reselected { lost, now } => effects.push(Effect::warning(format!(
                "Ticket {lost} is no longer in the queue. Showing ticket {now} instead."
            ))),
            Refreshed::Empty if self.view == View::SingleTicket => {
                effects.push(Effect::warning(
                    "No tickets match the selected reasons. Showing the full ticket table.",
                ));
                self.set_view(View::FullTable, &mut effects);
            }
            Refreshed::Empty => {}
        }
        Ok(effects)
    }

    fn open_ticket(&mut self, id: TicketId) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Err(e) = self.queue.select_ticket(id) {
            match self.queue.ordered_ids().first().copied() {
                Some(first) => {
                    log::warn!("{e}; falling back to ticket {first}");
                    effects.push(Effect::warning(format!("{e}. Showing ticket {first} instead.")));
                    // first is in the queue by construction
                    let _ = self.queue.select_ticket(first);
                }
                None => {
                    effects.push(Effect::warning("No tickets match the selected reasons."));
                    return effects;
                }
            }
        }
        self.set_view(View::SingleTicket, &mut effects);
        effects
    }

    fn open_queue(&mut self) -> Vec<Effect> {
        if self.queue.is_empty() {
            return vec![Effect::warning("No tickets match the selected reasons.")];
        }
        if self.queue.selected().is_none() {
            self.queue.select_first();
        }
        let mut effects = Vec::new();
        self.set_view(View::SingleTicket, &mut effects);
        effects
    }

    fn back(&mut self) -> Vec<Effect> {
        self.queue.clear_selection();
        let mut effects = Vec::new();
        self.set_view(View::FullTable, &mut effects);
        effects
    }

    fn after_filter_change(
        &mut self,
        result: Result<TicketId, ReviewError>,
    ) -> Result<Vec<Effect>, ReviewError> {
        let mut effects = Vec::new();
        match result {
            Ok(_) => {
                if self.view != View::SingleTicket {
                    // The table view shows no selection
                    self.queue.clear_selection();
                }
                let filter = self.queue.reason_filter();
                if filter.is_empty() {
                    effects.push(Effect::info("Reason filter cleared"));
                } else {
                    effects.push(Effect::info(format!("Filtered by: {}", filter.join(", "))));
                }
            }
            Err(ReviewError::EmptyFilterResult) => {
                effects.push(Effect::warning(
                    "No tickets match the selected reasons. Showing the full ticket table.",
                ));
                self.set_view(View::FullTable, &mut effects);
            }
            Err(other) => return Err(other),
        }
        Ok(effects)
    }

    fn step(&mut self, direction: Direction) -> Result<Vec<Effect>, ReviewError> {
        if self.view != View::SingleTicket {
            return Err(ReviewError::NoSelection);
        }
        self.queue.advance(direction);
        Ok(Vec::new())
    }

    fn decide<G: DataGateway + ?Sized>(
        &mut self,
        decision: Decision,
        gateway: &G,
    ) -> Result<Vec<Effect>, ReviewError> {
        if self.view != View::SingleTicket {
            return Err(ReviewError::NoSelection);
        }
        let ticket_id = self.queue.selected().ok_or(ReviewError::NoSelection)?;
        let reviewer = self.reviewer.as_ref().ok_or(ReviewError::NotAuthenticated)?;

        record_decision(gateway, ticket_id, decision, reviewer)?;
        let approver = reviewer.username.clone();
        mark_decided(&mut self.data.tickets, ticket_id, decision, &approver);

        let mut effects = vec![match decision {
            Decision::Approved => Effect::success(format!("Ticket: {ticket_id} approved.")),
            Decision::Denied => Effect::warning(format!("Ticket: {ticket_id} denied.")),
        }];

        if self.queue.is_at_end() {
            effects.push(Effect::info(format!(
                "Queue complete: ticket {ticket_id} was the last of {}.",
                self.queue.len()
            )));
            self.queue.clear_selection();
            self.set_view(View::FullTable, &mut effects);
        } else {
            self.queue.advance(Direction::Next);
        }
        Ok(effects)
    }
}
