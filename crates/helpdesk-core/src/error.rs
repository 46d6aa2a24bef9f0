//! Local failures: raised before any request is sent.

use thiserror::Error;

use crate::model::{Role, TicketStatus};

/// Input rejected by local validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} {message}")]
    InvalidFormat {
        field: &'static str,
        message: &'static str,
    },

    #[error("A hold reason is required when putting a ticket on hold.")]
    HoldReasonRequired,

    #[error("No changes to save.")]
    NoChanges,
}

/// Action refused because of the actor's role or ownership.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PermissionError {
    #[error("role {role} cannot change ticket status")]
    StatusChangeDenied { role: Role },

    #[error("role {role} cannot move a ticket from {from} to {to}")]
    TransitionNotAllowed {
        from: TicketStatus,
        to: TicketStatus,
        role: Role,
    },

    #[error("{field} cannot be edited on this ticket")]
    FieldNotEditable { field: &'static str },

    #[error("this ticket cannot be cancelled")]
    CancelDenied,

    #[error("administrator access required")]
    AdminOnly,

    #[error("sign in required")]
    NotAuthenticated,
}

/// Any locally detected reason not to send a ticket request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Permission(#[from] PermissionError),
}
