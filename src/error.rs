//! Error types for the review workflow
//!
//! Every variant is recovered at the boundary where it occurs and rendered
//! as an inline message; none of them ends the session.
//! - Retryable: persistence and load failures (the queue is left untouched)
//! - Corrected in place: invalid selection, empty filter result
//! - Requires user action: bad credentials, not logged in

use thiserror::Error;

use crate::types::TicketId;

/// Error types for review session commands
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("Invalid username or password")]
    AuthFailure,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Ticket {0} is not in the current queue")]
    InvalidSelection(TicketId),

    #[error("No tickets match the selected reasons")]
    EmptyFilterResult,

    #[error("Unknown reason: {0}")]
    UnknownReason(String),

    #[error("No ticket is selected")]
    NoSelection,

    #[error("There is no row {0} in the ticket table")]
    RowOutOfRange(usize),

    #[error("Failed to record decision: {0}")]
    Persistence(String),

    #[error("Failed to load review data: {0}")]
    Load(String),
}

impl ReviewError {
    /// Returns true if repeating the same command may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReviewError::Persistence(_) | ReviewError::Load(_))
    }

    /// Returns true if this error requires user action to resolve
    pub fn requires_user_action(&self) -> bool {
        matches!(
            self,
            ReviewError::AuthFailure | ReviewError::NotAuthenticated
        )
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ReviewError::AuthFailure => "Check your username and password.",
            ReviewError::NotAuthenticated => "Log in to continue.",
            ReviewError::InvalidSelection(_) => "Pick a ticket from the current queue.",
            ReviewError::EmptyFilterResult => "Choose different reasons or clear the filter.",
            ReviewError::UnknownReason(_) => "Use one of the listed reasons.",
            ReviewError::NoSelection => "Open a ticket first.",
            ReviewError::RowOutOfRange(_) => "Pick a row number shown in the table.",
            ReviewError::Persistence(_) => {
                "The decision was not saved. The ticket is still selected; try again."
            }
            ReviewError::Load(_) => "Check the database is reachable and refresh.",
        }
    }
}

/// Serializable error representation for presentation layers
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorType {
    Retryable,
    Recoverable,
    RequiresUserAction,
}

impl From<&ReviewError> for ReviewErrorPayload {
    fn from(err: &ReviewError) -> Self {
        let error_type = if err.requires_user_action() {
            ErrorType::RequiresUserAction
        } else if err.is_retryable() {
            ErrorType::Retryable
        } else {
            ErrorType::Recoverable
        };

        ReviewErrorPayload {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
