//! `helpdesk login` and `helpdesk change-password`.

use anyhow::{Context, Result};
use clap::Args;
use console::style;

use super::{Session, display_name, failure, success};
use crate::GlobalArgs;

#[derive(Debug, Args)]
pub struct ChangePasswordArgs {
    /// The new password: 8-64 characters with upper, lower, digit and
    /// special character.
    #[arg(long, env = "HELPDESK_NEW_PASSWORD", hide_env_values = true)]
    pub new_password: String,
}

pub fn whoami(session: &Session) {
    let user = &session.user;
    success(&format!(
        "Signed in as {} ({})",
        style(display_name(user)).bold(),
        user.username
    ));
    println!("  {:<12} {}", style("Role").dim(), user.role);
    if !user.email.is_empty() {
        println!("  {:<12} {}", style("Email").dim(), user.email);
    }
    if let Some(department_id) = user.department_id {
        println!("  {:<12} {department_id}", style("Department").dim());
    }
}

pub async fn change_password(
    session: &Session,
    global: &GlobalArgs,
    args: &ChangePasswordArgs,
) -> Result<()> {
    let current = global
        .password
        .as_deref()
        .context("the current password is required")?;
    session
        .context
        .change_password(current, &args.new_password)
        .await
        .map_err(|err| failure(&err, "Unable to change password."))?;
    success("Password changed. Use the new password from now on.");
    Ok(())
}
