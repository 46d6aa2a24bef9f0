use helpdesk_core::{LifecycleError, PermissionError, ValidationError};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Structured error payload returned by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Extracts the non-blank `message` field of a response body, if any.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<Self>(body)
            .ok()
            .and_then(|payload| payload.message)
            .map(|message| message.trim().to_string())
            .filter(|message| !message.is_empty())
    }
}

/// Failure of a client operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Rejected locally; no request was sent.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// 401 or 403. `return_to` is the login path that leads back to the
    /// resource that was being opened.
    #[error("authentication required ({status})")]
    Unauthorized {
        status: StatusCode,
        return_to: Option<String>,
    },

    #[error("Invalid username or password.")]
    LoginRejected { message: Option<String> },

    #[error("Ticket not found.")]
    TicketNotFound { id: u64 },

    #[error("resource not found")]
    NotFound { message: Option<String> },

    #[error("{}", .message.as_deref().unwrap_or("resource already exists"))]
    Conflict { message: Option<String> },

    #[error("request failed ({status})")]
    Api {
        status: StatusCode,
        message: Option<String>,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("no ticket loaded")]
    NotLoaded,

    #[error("ticket view closed")]
    Closed,
}

impl From<ValidationError> for ClientError {
    fn from(err: ValidationError) -> Self {
        Self::Lifecycle(err.into())
    }
}

impl From<PermissionError> for ClientError {
    fn from(err: PermissionError) -> Self {
        Self::Lifecycle(err.into())
    }
}

impl ClientError {
    /// Classifies a non-success response.
    pub(crate) fn from_response(status: StatusCode, body: &str) -> Self {
        let message = ApiErrorBody::message_from(body);
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized {
                status,
                return_to: None,
            },
            StatusCode::NOT_FOUND => Self::NotFound { message },
            StatusCode::CONFLICT => Self::Conflict { message },
            _ => Self::Api { status, message },
        }
    }

    /// Text to show the user. Server supplied messages win; `fallback` covers
    /// everything the server did not explain.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Lifecycle(err) => err.to_string(),
            Self::TicketNotFound { .. } => self.to_string(),
            Self::Unauthorized { .. } => "Please sign in to continue.".to_string(),
            Self::LoginRejected { message } => message
                .clone()
                .unwrap_or_else(|| "Invalid username or password.".to_string()),
            Self::NotFound { message } | Self::Conflict { message } | Self::Api { message, .. } => {
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            Self::Http(_) | Self::InvalidEndpoint(_) | Self::NotLoaded | Self::Closed => {
                fallback.to_string()
            }
        }
    }

    /// Login path to continue from, for authentication failures.
    pub fn login_redirect(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { return_to, .. } => return_to.as_deref(),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Replaces the payload message of a conflict.
    pub(crate) fn conflict_message(self, message: &str) -> Self {
        match self {
            Self::Conflict { .. } => Self::Conflict {
                message: Some(message.to_string()),
            },
            other => other,
        }
    }

    /// Supplies a message for a conflict the server did not explain.
    pub(crate) fn conflict_fallback(self, message: &str) -> Self {
        match self {
            Self::Conflict { message: None } => Self::Conflict {
                message: Some(message.to_string()),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_message_is_preferred() {
        let err = ClientError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":"VALIDATION","message":"Subject is too long"}"#,
        );
        assert_eq!(err.user_message("Unable to save."), "Subject is too long");
    }

    #[test]
    fn test_fallback_when_body_is_not_structured() {
        let err = ClientError::from_response(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert_eq!(err.user_message("Unable to save."), "Unable to save.");

        let err = ClientError::from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"message":"  "}"#);
        assert_eq!(err.user_message("Unable to save."), "Unable to save.");
    }

    #[test]
    fn test_status_classification() {
        assert!(ClientError::from_response(StatusCode::FORBIDDEN, "").is_unauthorized());
        assert!(matches!(
            ClientError::from_response(StatusCode::NOT_FOUND, ""),
            ClientError::NotFound { message: None }
        ));
        assert!(matches!(
            ClientError::from_response(StatusCode::CONFLICT, r#"{"message":"dup"}"#),
            ClientError::Conflict { message: Some(_) }
        ));
    }

    #[test]
    fn test_conflict_fallback_keeps_server_message() {
        let err = ClientError::from_response(StatusCode::CONFLICT, r#"{"message":"Email taken"}"#)
            .conflict_fallback("Username or email already exists.");
        assert_eq!(err.to_string(), "Email taken");

        let err = ClientError::from_response(StatusCode::CONFLICT, "")
            .conflict_fallback("Username or email already exists.");
        assert_eq!(err.to_string(), "Username or email already exists.");
    }

    #[test]
    fn test_lifecycle_errors_show_their_own_text() {
        let err = ClientError::from(ValidationError::NoChanges);
        assert_eq!(err.user_message("ignored"), "No changes to save.");
    }
}
