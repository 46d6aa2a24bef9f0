//! What an actor may do to a ticket, as a plain value.

use std::fmt;

use crate::{
    error::PermissionError,
    model::{Actor, Role, Ticket, TicketStatus},
};

/// A single editable aspect of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Capability {
    Subject,
    Description,
    Priority,
    Assignee,
    Category,
    RelatedAsset,
    Cancel,
}

impl Capability {
    pub const ALL: [Self; 7] = [
        Self::Subject,
        Self::Description,
        Self::Priority,
        Self::Assignee,
        Self::Category,
        Self::RelatedAsset,
        Self::Cancel,
    ];

    /// Wire field name the capability guards.
    pub const fn field(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Description => "description",
            Self::Priority => "priority",
            Self::Assignee => "assignee",
            Self::Category => "category",
            Self::RelatedAsset => "relatedAsset",
            Self::Cancel => "cancel",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

/// Set of [`Capability`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn all() -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < Capability::ALL.len() {
            bits |= Capability::ALL[i].bit();
            i += 1;
        }
        Self(bits)
    }

    pub fn of(capabilities: &[Capability]) -> Self {
        capabilities.iter().copied().collect()
    }

    pub const fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn with(self, capability: Capability) -> Self {
        Self(self.0 | capability.bit())
    }

    /// Whether anything other than cancelling is editable.
    pub const fn can_save(self) -> bool {
        self.0 & !Capability::Cancel.bit() != 0
    }

    /// Fails with [`PermissionError::FieldNotEditable`] unless granted.
    pub fn require(self, capability: Capability) -> Result<(), PermissionError> {
        if self.contains(capability) {
            Ok(())
        } else if capability == Capability::Cancel {
            Err(PermissionError::CancelDenied)
        } else {
            Err(PermissionError::FieldNotEditable {
                field: capability.field(),
            })
        }
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL
            .into_iter()
            .filter(move |capability| self.contains(*capability))
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

/// Resolves the capability set for `actor_id` with `role` on a ticket in
/// `status` reported by `reporter_id`.
///
/// Staff get everything. The reporter gets subject, description and cancel
/// while the ticket is still NEW. Everyone else gets nothing.
pub fn resolve_capabilities(
    role: Role,
    status: TicketStatus,
    reporter_id: Option<u64>,
    actor_id: u64,
) -> CapabilitySet {
    match role {
        Role::Admin | Role::Agent => CapabilitySet::all(),
        Role::EndUser if status == TicketStatus::New && reporter_id == Some(actor_id) => {
            CapabilitySet::of(&[
                Capability::Subject,
                Capability::Description,
                Capability::Cancel,
            ])
        }
        Role::EndUser => CapabilitySet::empty(),
    }
}

/// [`resolve_capabilities`] for a loaded ticket.
pub fn ticket_capabilities(ticket: &Ticket, actor: Actor) -> CapabilitySet {
    resolve_capabilities(actor.role, ticket.status, ticket.reporter_id(), actor.id)
}

pub const fn can_change_status(role: Role) -> bool {
    role.is_staff()
}

pub const fn can_mark_internal(role: Role) -> bool {
    role.is_staff()
}

/// Gate for user and department administration.
pub fn require_admin(role: Role) -> Result<(), PermissionError> {
    if role == Role::Admin {
        Ok(())
    } else {
        Err(PermissionError::AdminOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_get_every_capability_in_any_status() {
        for role in [Role::Admin, Role::Agent] {
            for status in TicketStatus::ALL {
                let set = resolve_capabilities(role, *status, Some(5), 1);
                assert_eq!(set, CapabilitySet::all());
                assert_eq!(set.iter().count(), Capability::ALL.len());
            }
        }
    }

    #[test]
    fn test_reporter_on_new_ticket_gets_text_fields_and_cancel() {
        let set = resolve_capabilities(Role::EndUser, TicketStatus::New, Some(42), 42);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![
                Capability::Subject,
                Capability::Description,
                Capability::Cancel
            ]
        );
        assert!(set.can_save());
    }

    #[test]
    fn test_reporter_loses_everything_once_work_starts() {
        let set = resolve_capabilities(Role::EndUser, TicketStatus::InProgress, Some(42), 42);
        assert!(set.is_empty());
    }

    #[test]
    fn test_other_end_user_gets_nothing() {
        assert!(resolve_capabilities(Role::EndUser, TicketStatus::New, Some(42), 7).is_empty());
        assert!(resolve_capabilities(Role::EndUser, TicketStatus::New, None, 7).is_empty());
    }

    #[test]
    fn test_require_reports_specific_denials() {
        let set = CapabilitySet::of(&[Capability::Subject]);
        assert!(set.require(Capability::Subject).is_ok());
        assert_eq!(
            set.require(Capability::Priority),
            Err(PermissionError::FieldNotEditable { field: "priority" })
        );
        assert_eq!(
            set.require(Capability::Cancel),
            Err(PermissionError::CancelDenied)
        );
    }

    #[test]
    fn test_cancel_only_set_has_nothing_to_save() {
        assert!(!CapabilitySet::of(&[Capability::Cancel]).can_save());
    }

    #[test]
    fn test_ticket_capabilities_uses_resolved_reporter() {
        let mut ticket = crate::testing::ticket(TicketStatus::New);
        ticket.flat_reporter_id = Some(9);
        assert!(
            ticket_capabilities(&ticket, Actor::new(9, Role::EndUser)).contains(Capability::Cancel)
        );
    }

    #[test]
    fn test_require_admin() {
        assert!(require_admin(Role::Admin).is_ok());
        assert_eq!(require_admin(Role::Agent), Err(PermissionError::AdminOnly));
    }
}
