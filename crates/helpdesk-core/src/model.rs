//! Wire types for the helpdesk REST API.
//!
//! Field names follow the backend's camelCase JSON and enum values its
//! SCREAMING_SNAKE_CASE names. The backend has shipped two shapes for people
//! on a ticket (nested `reporter: {id, ...}` references and flat `reporterId`
//! columns), so [`Ticket`] accepts both and exposes the resolved ids through
//! [`Ticket::reporter_id`] and [`Ticket::assignee_id`].

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Error returned when a string does not name a known enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every value, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The wire name of this value.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            /// Accepts the wire name case-insensitively, with `-` in place of `_`.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|value| value.as_str() == normalized)
                    .ok_or_else(|| ParseEnumError {
                        kind: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

wire_enum! {
    /// Lifecycle status of a ticket.
    TicketStatus {
        New => "NEW",
        InProgress => "IN_PROGRESS",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
        OnHold => "ON_HOLD",
        Reopened => "REOPENED",
        /// Terminal: no transitions leave this status.
        Cancelled => "CANCELLED",
    }
}

wire_enum! {
    Priority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Critical => "CRITICAL",
    }
}

wire_enum! {
    TicketCategory {
        Hardware => "HARDWARE",
        Software => "SOFTWARE",
        Network => "NETWORK",
        Security => "SECURITY",
        Access => "ACCESS",
        Services => "SERVICES",
    }
}

wire_enum! {
    /// Server-computed proximity to the SLA deadline.
    SlaFlag {
        Ok => "OK",
        Near => "NEAR",
        Breached => "BREACHED",
    }
}

wire_enum! {
    Role {
        Admin => "ADMIN",
        Agent => "AGENT",
        EndUser => "END_USER",
    }
}

impl TicketCategory {
    /// Human readable label, used when the server omits `categoryLabel`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hardware => "Hardware",
            Self::Software => "Software",
            Self::Network => "Network",
            Self::Security => "Security",
            Self::Access => "Access",
            Self::Services => "Services",
        }
    }
}

impl Role {
    /// Staff roles work tickets on behalf of others.
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Agent)
    }
}

/// A person referenced from a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUserRef {
    pub id: u64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

impl TicketUserRef {
    /// Best available display name.
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// One row of a ticket's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketHistoryEntry {
    pub id: u64,
    #[serde(default)]
    pub from_status: Option<TicketStatus>,
    pub to_status: TicketStatus,
    #[serde(default)]
    pub changed_by: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Full ticket representation returned by `GET /tickets/{id}` and by every
/// mutating ticket call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: u64,
    pub ticket_number: String,
    pub subject: String,
    #[serde(default)]
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub category: TicketCategory,
    #[serde(default)]
    pub category_label: Option<String>,
    #[serde(default)]
    pub reporter: Option<TicketUserRef>,
    #[serde(default, rename = "reporterId", skip_serializing_if = "Option::is_none")]
    pub flat_reporter_id: Option<u64>,
    #[serde(default)]
    pub assignee: Option<TicketUserRef>,
    #[serde(default, rename = "assigneeId", skip_serializing_if = "Option::is_none")]
    pub flat_assignee_id: Option<u64>,
    #[serde(default)]
    pub related_asset_id: Option<u64>,
    #[serde(default, with = "timestamp::option")]
    pub sla_response_deadline: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub sla_resolution_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sla_flag: Option<SlaFlag>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub history: Vec<TicketHistoryEntry>,
}

impl Ticket {
    pub fn reporter_id(&self) -> Option<u64> {
        self.reporter
            .as_ref()
            .map(|reporter| reporter.id)
            .or(self.flat_reporter_id)
    }

    pub fn assignee_id(&self) -> Option<u64> {
        self.assignee
            .as_ref()
            .map(|assignee| assignee.id)
            .or(self.flat_assignee_id)
    }

    pub fn category_label(&self) -> &str {
        self.category_label
            .as_deref()
            .unwrap_or_else(|| self.category.label())
    }
}

/// Row of the paged ticket list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketSummary {
    pub id: u64,
    pub ticket_number: String,
    pub subject: String,
    pub status: TicketStatus,
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<TicketCategory>,
    #[serde(default)]
    pub sla_flag: Option<SlaFlag>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub assignee_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketComment {
    pub id: u64,
    #[serde(default, alias = "author")]
    pub author_name: Option<String>,
    pub content: String,
    /// Internal comments are hidden from end users.
    #[serde(default, alias = "internal")]
    pub is_internal: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Spring-style page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number: u32,
}

/// Envelope used by the auth endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: Role,
    #[serde(default = "default_true", alias = "isActive")]
    pub active: bool,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default)]
    pub department_id: Option<u64>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Identity of whoever is acting on a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Actor {
    pub id: u64,
    pub role: Role,
}

impl Actor {
    pub const fn new(id: u64, role: Role) -> Self {
        Self { id, role }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: u64,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentMinimal {
    pub id: u64,
    pub code: String,
    pub name: String,
}

// ===== Request bodies =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTicket {
    pub subject: String,
    pub description: String,
    pub priority: Priority,
    pub category: TicketCategory,
}

/// Body of `POST /tickets/{id}/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    pub to_status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub content: String,
    pub is_internal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_password: Option<String>,
}

/// Partial user update. `department_id: Some(None)` clears the department.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<Option<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_password: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResult {
    #[serde(default)]
    pub must_change_password: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDepartment {
    pub code: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DepartmentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl DepartmentUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_wire_and_cli_spellings() {
        assert_eq!("IN_PROGRESS".parse(), Ok(TicketStatus::InProgress));
        assert_eq!("in-progress".parse(), Ok(TicketStatus::InProgress));
        assert_eq!(" on_hold ".parse(), Ok(TicketStatus::OnHold));
        assert!("DONE".parse::<TicketStatus>().is_err());
    }

    #[test]
    fn test_parse_error_names_the_enum() {
        let err = "boss".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "invalid Role value: boss");
    }

    #[test]
    fn test_ticket_accepts_nested_people_references() {
        let ticket: Ticket = serde_json::from_str(
            r#"{
              "id": 7,
              "ticketNumber": "TCK-0007",
              "subject": "Printer on fire",
              "description": "Third floor printer smokes",
              "status": "NEW",
              "priority": "HIGH",
              "category": "HARDWARE",
              "reporter": {"id": 3, "fullName": "Ana Silva", "username": "ana"},
              "assignee": null,
              "slaFlag": "NEAR",
              "slaResolutionDeadline": "2025-10-30T18:00:00Z",
              "createdAt": "2025-10-30T12:34:56.789"
            }"#,
        )
        .unwrap();

        assert_eq!(ticket.reporter_id(), Some(3));
        assert_eq!(ticket.assignee_id(), None);
        assert_eq!(ticket.sla_flag, Some(SlaFlag::Near));
        assert_eq!(ticket.category_label(), "Hardware");
        assert!(ticket.sla_resolution_deadline.is_some());
        assert!(ticket.history.is_empty());
    }

    #[test]
    fn test_ticket_accepts_flat_people_ids() {
        let ticket: Ticket = serde_json::from_str(
            r#"{
              "id": 8,
              "ticketNumber": "TCK-0008",
              "subject": "VPN drops",
              "status": "IN_PROGRESS",
              "priority": "MEDIUM",
              "category": "NETWORK",
              "categoryLabel": "Networking",
              "reporterId": 11,
              "assigneeId": 4,
              "createdAt": "2025-10-30T12:34:56",
              "history": [
                {"id": 1, "fromStatus": "NEW", "toStatus": "IN_PROGRESS",
                 "changedBy": "agent", "createdAt": "2025-10-30T13:00:00"}
              ]
            }"#,
        )
        .unwrap();

        assert_eq!(ticket.reporter_id(), Some(11));
        assert_eq!(ticket.assignee_id(), Some(4));
        assert_eq!(ticket.category_label(), "Networking");
        assert_eq!(ticket.history[0].to_status, TicketStatus::InProgress);
    }

    #[test]
    fn test_comment_accepts_backend_field_aliases() {
        let comment: TicketComment = serde_json::from_str(
            r#"{"id": 1, "author": "agent", "internal": true,
                "content": "checking logs", "createdAt": "2025-10-30T12:00:00"}"#,
        )
        .unwrap();

        assert!(comment.is_internal);
        assert_eq!(comment.author_name.as_deref(), Some("agent"));
    }

    #[test]
    fn test_status_change_omits_absent_optionals() {
        let body = serde_json::to_value(StatusChangeRequest {
            to_status: TicketStatus::Resolved,
            note: None,
            hold_reason: None,
        })
        .unwrap();

        assert_eq!(body, serde_json::json!({"toStatus": "RESOLVED"}));
    }

    #[test]
    fn test_user_update_serializes_explicit_department_clear() {
        let body = serde_json::to_value(UserUpdate {
            department_id: Some(None),
            ..UserUpdate::default()
        })
        .unwrap();

        assert_eq!(body, serde_json::json!({"departmentId": null}));
    }

    #[test]
    fn test_user_defaults_active_when_missing() {
        let user: User = serde_json::from_str(
            r#"{"id": 1, "username": "root", "role": "ADMIN"}"#,
        )
        .unwrap();

        assert!(user.active);
        assert_eq!(Actor::from(&user), Actor::new(1, Role::Admin));
    }
}
