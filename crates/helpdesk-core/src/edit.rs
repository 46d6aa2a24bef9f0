//! Ticket edits.
//!
//! An [`EditDraft`] records only the fields a user touched. [`build_patch`]
//! turns it into the smallest [`TicketPatch`] that moves the cached ticket to
//! the drafted values, refusing fields outside the actor's capabilities.

use serde::{Serialize, Serializer};

use crate::{
    capability::{Capability, CapabilitySet},
    error::{LifecycleError, ValidationError},
    model::{Priority, Ticket, TicketCategory},
    validate,
};

/// Fields touched in an edit form. `None` means untouched; for the clearable
/// references, `Some(None)` means cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditDraft {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub assignee_id: Option<Option<u64>>,
    pub category: Option<TicketCategory>,
    pub related_asset_id: Option<Option<u64>>,
}

impl EditDraft {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Body of `PATCH /tickets/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "clearable"
    )]
    pub assignee_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<TicketCategory>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "clearable"
    )]
    pub related_asset_id: Option<Option<u64>>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[expect(
    clippy::ref_option,
    reason = "serde `serialize_with` receives a reference to the field"
)]
fn clearable<S: Serializer>(value: &Option<Option<u64>>, serializer: S) -> Result<S::Ok, S::Error> {
    value.flatten().serialize(serializer)
}

fn changed<T: PartialEq>(draft: Option<T>, current: &T) -> Option<T> {
    draft.filter(|value| value != current)
}

/// Builds the patch for `draft` against the cached `ticket`.
///
/// Fails when a touched field is not in `capabilities`, when text fails
/// validation, or when nothing differs from the cached ticket.
pub fn build_patch(
    ticket: &Ticket,
    draft: &EditDraft,
    capabilities: CapabilitySet,
) -> Result<TicketPatch, LifecycleError> {
    let touched = [
        (draft.subject.is_some(), Capability::Subject),
        (draft.description.is_some(), Capability::Description),
        (draft.priority.is_some(), Capability::Priority),
        (draft.assignee_id.is_some(), Capability::Assignee),
        (draft.category.is_some(), Capability::Category),
        (draft.related_asset_id.is_some(), Capability::RelatedAsset),
    ];
    for (_, capability) in touched.iter().filter(|(touched, _)| *touched) {
        capabilities.require(*capability)?;
    }

    let subject = draft
        .subject
        .as_deref()
        .map(validate::subject)
        .transpose()?;
    let description = draft
        .description
        .as_deref()
        .map(validate::description)
        .transpose()?;

    let patch = TicketPatch {
        subject: changed(subject, &ticket.subject),
        description: changed(description, &ticket.description),
        priority: changed(draft.priority, &ticket.priority),
        assignee_id: changed(draft.assignee_id, &ticket.assignee_id()),
        category: changed(draft.category, &ticket.category),
        related_asset_id: changed(draft.related_asset_id, &ticket.related_asset_id),
    };

    if patch.is_empty() {
        return Err(ValidationError::NoChanges.into());
    }
    Ok(patch)
}
