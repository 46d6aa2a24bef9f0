//! Ticket status workflow.
//!
//! Two layers decide which status a ticket may move to next:
//!
//! 1. [`raw_transitions`]: the role-independent transition table.
//! 2. [`WorkflowPolicy::allowed_transitions`]: the role filter applied on top.
//!    The filter only ever removes candidates, so its output is always a
//!    subset of the table row.
//!
//! [`WorkflowPolicy::prepare_transition`] combines both with the local
//! validation rules and yields the request body to send, or the reason the
//! request must not be sent at all.

use crate::{
    error::{LifecycleError, PermissionError, ValidationError},
    model::{Actor, Role, StatusChangeRequest, Ticket, TicketStatus},
    validate,
};

/// Statuses an agent may move a ticket into.
const AGENT_TARGETS: &[TicketStatus] = &[TicketStatus::InProgress, TicketStatus::Resolved];

/// Upper bound on the free-text note attached to a status change.
pub const NOTE_MAX_CHARS: usize = 500;
/// Upper bound on the hold reason.
pub const HOLD_REASON_MAX_CHARS: usize = 250;

/// Returns the statuses reachable from `from` in one step, in display order.
pub const fn raw_transitions(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::{Cancelled, Closed, InProgress, New, OnHold, Reopened, Resolved};

    match from {
        New => &[InProgress, OnHold, Cancelled],
        InProgress => &[Resolved, OnHold, Cancelled],
        Resolved => &[Closed, Reopened],
        Closed => &[Reopened],
        OnHold => &[InProgress, Cancelled],
        Reopened => &[InProgress, Cancelled],
        Cancelled => &[],
    }
}

/// Whether `from -> to` is a row entry of the transition table.
pub fn is_raw_transition(from: TicketStatus, to: TicketStatus) -> bool {
    raw_transitions(from).contains(&to)
}

/// Role filter over the transition table.
///
/// Deployments disagree on whether agents may cancel tickets, so that single
/// rule is a switch; everything else is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkflowPolicy {
    /// Adds CANCELLED to the statuses an agent may set.
    pub agent_may_cancel: bool,
}

impl WorkflowPolicy {
    pub const fn new(agent_may_cancel: bool) -> Self {
        Self { agent_may_cancel }
    }

    fn agent_permits(self, status: TicketStatus) -> bool {
        AGENT_TARGETS.contains(&status) || (self.agent_may_cancel && status == TicketStatus::Cancelled)
    }

    /// Statuses `role` may move a ticket in status `from` into.
    pub fn allowed_transitions(self, from: TicketStatus, role: Role) -> Vec<TicketStatus> {
        let candidates = raw_transitions(from);
        match role {
            Role::Admin => candidates.to_vec(),
            Role::Agent => candidates
                .iter()
                .copied()
                .filter(|status| self.agent_permits(*status))
                .collect(),
            Role::EndUser => Vec::new(),
        }
    }

    /// Checks a requested status change and builds the request body.
    ///
    /// The note is trimmed and dropped when blank. A hold reason is required
    /// for ON_HOLD and never sent for any other target.
    pub fn prepare_transition(
        self,
        ticket: &Ticket,
        actor: Actor,
        to: TicketStatus,
        note: Option<&str>,
        hold_reason: Option<&str>,
    ) -> Result<StatusChangeRequest, LifecycleError> {
        if !actor.role.is_staff() {
            return Err(PermissionError::StatusChangeDenied { role: actor.role }.into());
        }

        if !self.allowed_transitions(ticket.status, actor.role).contains(&to) {
            return Err(PermissionError::TransitionNotAllowed {
                from: ticket.status,
                to,
                role: actor.role,
            }
            .into());
        }

        let note = validate::optional_text("note", note, NOTE_MAX_CHARS)?;

        let hold_reason = if to == TicketStatus::OnHold {
            let reason = validate::optional_text("holdReason", hold_reason, HOLD_REASON_MAX_CHARS)?
                .ok_or(ValidationError::HoldReasonRequired)?;
            Some(reason)
        } else {
            None
        };

        Ok(StatusChangeRequest {
            to_status: to,
            note,
            hold_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ticket;

    const ROLES: [Role; 3] = [Role::Admin, Role::Agent, Role::EndUser];

    #[test]
    fn test_allowed_transitions_never_leave_the_table() {
        for policy in [WorkflowPolicy::new(false), WorkflowPolicy::new(true)] {
            for from in TicketStatus::ALL {
                for role in ROLES {
                    let raw = raw_transitions(*from);
                    for status in policy.allowed_transitions(*from, role) {
                        assert!(
                            raw.contains(&status),
                            "{role} got {status} from {from} outside the table"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_cancelled_is_terminal_for_every_role() {
        assert!(raw_transitions(TicketStatus::Cancelled).is_empty());
        for policy in [WorkflowPolicy::new(false), WorkflowPolicy::new(true)] {
            for role in ROLES {
                assert!(
                    policy
                        .allowed_transitions(TicketStatus::Cancelled, role)
                        .is_empty()
                );
            }
        }
    }

    #[test]
    fn test_admin_gets_full_row_in_table_order() {
        let allowed = WorkflowPolicy::default().allowed_transitions(TicketStatus::New, Role::Admin);
        assert_eq!(
            allowed,
            vec![
                TicketStatus::InProgress,
                TicketStatus::OnHold,
                TicketStatus::Cancelled
            ]
        );
    }

    #[test]
    fn test_agent_on_new_ticket_can_only_start_work() {
        let allowed = WorkflowPolicy::default().allowed_transitions(TicketStatus::New, Role::Agent);
        assert_eq!(allowed, vec![TicketStatus::InProgress]);
    }

    #[test]
    fn test_agent_can_resolve_but_not_close() {
        let policy = WorkflowPolicy::default();
        assert_eq!(
            policy.allowed_transitions(TicketStatus::InProgress, Role::Agent),
            vec![TicketStatus::Resolved]
        );
        assert!(
            policy
                .allowed_transitions(TicketStatus::Resolved, Role::Agent)
                .is_empty()
        );
    }

    #[test]
    fn test_agent_cancel_switch_adds_cancelled_only_where_table_allows() {
        let policy = WorkflowPolicy::new(true);
        assert_eq!(
            policy.allowed_transitions(TicketStatus::OnHold, Role::Agent),
            vec![TicketStatus::InProgress, TicketStatus::Cancelled]
        );
        assert!(
            !policy
                .allowed_transitions(TicketStatus::Resolved, Role::Agent)
                .contains(&TicketStatus::Cancelled)
        );
    }

    #[test]
    fn test_end_user_never_changes_status() {
        for from in TicketStatus::ALL {
            assert!(
                WorkflowPolicy::new(true)
                    .allowed_transitions(*from, Role::EndUser)
                    .is_empty()
            );
        }
    }

    #[test]
    fn test_prepare_on_hold_requires_reason() {
        let policy = WorkflowPolicy::default();
        let admin = Actor::new(1, Role::Admin);
        let ticket = ticket(TicketStatus::InProgress);

        for reason in [None, Some(""), Some("   \t")] {
            let err = policy
                .prepare_transition(&ticket, admin, TicketStatus::OnHold, None, reason)
                .unwrap_err();
            assert_eq!(
                err,
                LifecycleError::Validation(ValidationError::HoldReasonRequired)
            );
        }
    }

    #[test]
    fn test_prepare_on_hold_trims_reason_and_note() {
        let request = WorkflowPolicy::default()
            .prepare_transition(
                &ticket(TicketStatus::InProgress),
                Actor::new(1, Role::Admin),
                TicketStatus::OnHold,
                Some("  waiting on vendor "),
                Some(" part on order "),
            )
            .unwrap();

        assert_eq!(request.to_status, TicketStatus::OnHold);
        assert_eq!(request.note.as_deref(), Some("waiting on vendor"));
        assert_eq!(request.hold_reason.as_deref(), Some("part on order"));
    }

    #[test]
    fn test_prepare_drops_hold_reason_for_other_targets() {
        let request = WorkflowPolicy::default()
            .prepare_transition(
                &ticket(TicketStatus::InProgress),
                Actor::new(2, Role::Agent),
                TicketStatus::Resolved,
                Some("   "),
                Some("ignored"),
            )
            .unwrap();

        assert_eq!(request.note, None);
        assert_eq!(request.hold_reason, None);
    }

    #[test]
    fn test_prepare_rejects_target_outside_role_filter() {
        let err = WorkflowPolicy::default()
            .prepare_transition(
                &ticket(TicketStatus::New),
                Actor::new(2, Role::Agent),
                TicketStatus::OnHold,
                None,
                Some("vendor"),
            )
            .unwrap_err();

        assert_eq!(
            err,
            LifecycleError::Permission(PermissionError::TransitionNotAllowed {
                from: TicketStatus::New,
                to: TicketStatus::OnHold,
                role: Role::Agent,
            })
        );
    }

    #[test]
    fn test_prepare_rejects_end_user() {
        let err = WorkflowPolicy::default()
            .prepare_transition(
                &ticket(TicketStatus::New),
                Actor::new(9, Role::EndUser),
                TicketStatus::Cancelled,
                None,
                None,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Permission(PermissionError::StatusChangeDenied {
                role: Role::EndUser
            })
        ));
    }

    #[test]
    fn test_prepare_rejects_overlong_note() {
        let note = "x".repeat(NOTE_MAX_CHARS + 1);
        let err = WorkflowPolicy::default()
            .prepare_transition(
                &ticket(TicketStatus::InProgress),
                Actor::new(1, Role::Admin),
                TicketStatus::Resolved,
                Some(&note),
                None,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            LifecycleError::Validation(ValidationError::TooLong { field: "note", .. })
        ));
    }
}
