//! Ticket lifecycle rules for the helpdesk client.
//!
//! Everything in this crate is synchronous and free of I/O apart from reading
//! the configuration file. It decides what an actor may do to a ticket; the
//! `helpdesk-client` crate does it.
//!
//! # Key Components
//!
//! - **Workflow**: the status transition table and the role filter over it
//!   ([`WorkflowPolicy`])
//! - **Capabilities**: which fields an actor may edit ([`resolve_capabilities`])
//! - **Comments**: visibility and ordering ([`visible_comments`])
//! - **Edits**: minimal `PATCH` bodies from touched fields ([`build_patch`])
//! - **Validation**: the form rules for tickets, users and departments
//!
//! # Example
//!
//! ```
//! use helpdesk_core::{Role, TicketStatus, WorkflowPolicy};
//!
//! let next = WorkflowPolicy::default().allowed_transitions(TicketStatus::New, Role::Agent);
//! assert_eq!(next, vec![TicketStatus::InProgress]);
//! ```

pub mod capability;
pub mod comments;
pub mod config;
pub mod edit;
pub mod error;
pub mod model;
pub mod timestamp;
pub mod validate;
pub mod workflow;

pub use capability::{
    Capability, CapabilitySet, can_change_status, can_mark_internal, require_admin,
    resolve_capabilities, ticket_capabilities,
};
pub use comments::{CommentOrder, visible_comments};
pub use config::{ConfigError, HelpdeskConfig, WorkflowSettings};
pub use edit::{EditDraft, TicketPatch, build_patch};
pub use error::{LifecycleError, PermissionError, ValidationError};
/// Wire types shared with the REST API.
pub use model::{
    Actor, Department, DepartmentMinimal, DepartmentUpdate, NewComment, NewDepartment, NewTicket,
    NewUser, Page, PasswordChange, Priority, ResetPasswordRequest, ResetPasswordResult, Role,
    SlaFlag, StatusChangeRequest, Ticket, TicketCategory, TicketComment, TicketStatus,
    TicketSummary, User, UserUpdate,
};
pub use workflow::{WorkflowPolicy, is_raw_transition, raw_transitions};

#[cfg(test)]
pub(crate) mod testing {
    use chrono::Utc;

    use crate::model::{Priority, Ticket, TicketCategory, TicketStatus};

    pub(crate) fn ticket(status: TicketStatus) -> Ticket {
        Ticket {
            id: 1,
            ticket_number: "TCK-0001".to_string(),
            subject: "Broken keyboard".to_string(),
            description: "Keys stick after coffee".to_string(),
            status,
            priority: Priority::Medium,
            category: TicketCategory::Hardware,
            category_label: None,
            reporter: None,
            flat_reporter_id: Some(9),
            assignee: None,
            flat_assignee_id: None,
            related_asset_id: None,
            sla_response_deadline: None,
            sla_resolution_deadline: None,
            sla_flag: None,
            created_at: Utc::now(),
            updated_at: None,
            history: Vec::new(),
        }
    }
}
