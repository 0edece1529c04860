use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Configuration loaded from `~/.upreview/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Explicit database location. Defaults to `~/.upreview/upreview.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<String>,
    /// Shown in the console banner instead of the login name when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_display_name: Option<String>,
}

/// Stable identifier of a review ticket (`TicketID` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TicketId(pub i64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TicketId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(TicketId)
    }
}

/// Reviewer outcome for a ticket. The label is what lands in `Status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "Approved",
            Decision::Denied => "Denied",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated reviewer. The hash is opaque to everything but the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewerIdentity {
    pub username: String,
    pub credential_hash: String,
}

/// A row from `ticket_table`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: TicketId,
    pub profile_id: Option<String>,
    pub previous_gu_duns: Option<String>,
    pub previous_gu_name: Option<String>,
    pub new_gu_duns: Option<String>,
    pub new_gu_name: Option<String>,
    pub reason: String,
    /// `None` while pending; otherwise the last recorded decision label.
    pub status: Option<String>,
    pub approver: Option<String>,
}

/// Which snapshot a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Current,
    Future,
}

impl SnapshotKind {
    pub fn table(&self) -> &'static str {
        match self {
            SnapshotKind::Current => "current_accounts",
            SnapshotKind::Future => "future_accounts",
        }
    }
}

/// A row from `current_accounts` or `future_accounts`, joined to a ticket by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSnapshotRow {
    pub ticket_id: Option<TicketId>,
    pub enterprise_id: Option<String>,
    pub account_name: Option<String>,
    pub record_type_id: Option<String>,
    pub ultimate_parent_name: Option<String>,
    pub ultimate_parent_enterprise_id: Option<String>,
    pub billing_street: Option<String>,
    pub duns_number: Option<String>,
    pub gu_duns: Option<String>,
    pub gu_name: Option<String>,
    pub company_profile: Option<String>,
    pub previous_gu_duns: Option<String>,
    pub new_gu_duns: Option<String>,
    pub previous_gu_name: Option<String>,
    pub new_gu_name: Option<String>,
}
