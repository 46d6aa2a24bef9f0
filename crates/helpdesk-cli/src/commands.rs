//! Command implementations for `helpdesk`.
//!
//! - **`account`**: sign-in check and self-service password change
//! - **`tickets`**: list, show, create, transition, edit, cancel, comment and
//!   watch tickets
//! - **`users`**: user administration
//! - **`departments`**: department administration
//!
//! Every command runs against a [`Session`] opened by [`connect`].

use anyhow::{Context, Result, anyhow};
use console::style;
use helpdesk_client::{ClientError, HelpdeskClient, SessionContext};
use helpdesk_core::{HelpdeskConfig, User};
use tracing::debug;

use crate::GlobalArgs;

pub mod account;
pub mod departments;
pub mod tickets;
pub mod users;

/// A signed-in connection to the helpdesk.
pub struct Session {
    pub config: HelpdeskConfig,
    pub client: HelpdeskClient,
    pub context: SessionContext,
    pub user: User,
}

/// Loads the config named by `--config`, or the resolved one, and applies
/// the endpoint override.
pub fn load_config(global: &GlobalArgs) -> Result<HelpdeskConfig> {
    let mut config = match &global.config {
        Some(path) => HelpdeskConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => HelpdeskConfig::load_resolved().context("failed to load config")?,
    };

    if let Some(endpoint) = global.endpoint.as_deref().map(str::trim)
        && !endpoint.is_empty()
    {
        config.endpoint = endpoint.to_string();
        config.validate().context("invalid --endpoint")?;
    }
    Ok(config)
}

pub async fn connect(global: &GlobalArgs) -> Result<Session> {
    let config = load_config(global)?;
    let username = global
        .username
        .as_deref()
        .context("no username given; pass --username or set HELPDESK_USERNAME")?;
    let password = global
        .password
        .as_deref()
        .context("no password given; pass --password or set HELPDESK_PASSWORD")?;

    let client = HelpdeskClient::from_config(&config).context("failed to create client")?;
    debug!(endpoint = %client.base_url(), "connecting");
    let context = SessionContext::new(client.clone());
    let user = context
        .login(username, password)
        .await
        .map_err(|err| failure(&err, "Unable to sign in."))?;

    if user.must_change_password {
        eprintln!(
            "{} Your password must be changed. Run `helpdesk change-password`.",
            style("!").yellow().bold()
        );
    }

    Ok(Session {
        config,
        client,
        context,
        user,
    })
}

/// Turns a client error into the message a user should see.
pub fn failure(err: &ClientError, fallback: &str) -> anyhow::Error {
    debug!(error = %err, "command failed");
    let message = err.user_message(fallback);
    match err.login_redirect() {
        Some(path) => anyhow!("{message} (sign in again: {path})"),
        None => anyhow!(message),
    }
}

pub fn success(message: &str) {
    println!("{} {message}", style("✓").green().bold());
}

/// Cuts `text` to `max` characters, ending in `...` when shortened.
pub fn truncate(text: &str, max: usize) -> String {
    const ELLIPSIS: &str = "...";

    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max).collect();
    if chars.next().is_none() {
        return head;
    }
    let prefix: String = head.chars().take(max.saturating_sub(ELLIPSIS.len())).collect();
    format!("{prefix}{ELLIPSIS}")
}

pub fn display_name(user: &User) -> &str {
    user.full_name.as_deref().unwrap_or(&user.username)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("Broken keyboard", 40), "Broken keyboard");
        assert_eq!(truncate("", 5), "");
    }

    #[test]
    fn test_truncate_marks_cut_text() {
        let cut = truncate("Printer on floor three jams on every duplex job", 20);
        assert_eq!(cut, "Printer on floor ...");
        assert_eq!(cut.chars().count(), 20);
    }

    #[test]
    fn test_explicit_config_and_endpoint_override() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helpdesk.toml");
        fs::write(
            &path,
            "endpoint = \"http://file.example.com\"\npoll_interval_secs = 30\n",
        )
        .unwrap();

        let global = GlobalArgs {
            config: Some(path.clone()),
            ..GlobalArgs::default()
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.endpoint, "http://file.example.com");
        assert_eq!(config.poll_interval_secs, 30);

        let global = GlobalArgs {
            config: Some(path),
            endpoint: Some("https://flag.example.com".to_string()),
            ..GlobalArgs::default()
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.endpoint, "https://flag.example.com");
        assert_eq!(config.poll_interval_secs, 30);
    }

    #[test]
    fn test_bad_endpoint_override_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("helpdesk.toml");
        fs::write(&path, "").unwrap();

        let global = GlobalArgs {
            config: Some(path),
            endpoint: Some("ftp://files.example.com".to_string()),
            ..GlobalArgs::default()
        };
        assert!(load_config(&global).is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let global = GlobalArgs {
            config: Some(dir.path().join("absent.toml")),
            ..GlobalArgs::default()
        };
        assert!(load_config(&global).is_err());
    }

    #[test]
    fn test_failure_prefers_server_message() {
        let err = ClientError::Conflict {
            message: Some("Email already registered".to_string()),
        };
        assert_eq!(
            failure(&err, "Unable to save user.").to_string(),
            "Email already registered"
        );

        let err = ClientError::TicketNotFound { id: 5 };
        assert_eq!(
            failure(&err, "Unable to load ticket.").to_string(),
            "Ticket not found."
        );
    }
}
