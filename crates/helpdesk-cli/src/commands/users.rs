//! `helpdesk users` subcommands. Administrators only.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use helpdesk_client::UserQuery;
use helpdesk_core::{NewUser, Role, User, UserUpdate, require_admin};

use super::{Session, display_name, failure, success, truncate};

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users
    List(ListArgs),

    /// Show one user
    Show(UserArg),

    /// Create a user
    Create(CreateArgs),

    /// Update a user
    Update(UpdateArgs),

    /// Reset a user's password
    ResetPassword(ResetPasswordArgs),
}

#[derive(Debug, Args)]
pub struct UserArg {
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub role: Option<Role>,

    /// Only active users.
    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    /// Only deactivated users.
    #[arg(long)]
    pub inactive: bool,

    #[arg(long)]
    pub department: Option<u64>,

    /// Search username, name and email.
    #[arg(short, long)]
    pub query: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, default_value_t = 20)]
    pub size: u32,

    #[arg(long)]
    pub sort: Option<String>,
}

impl ListArgs {
    fn query(&self) -> UserQuery {
        UserQuery {
            role: self.role,
            active: active_filter(self.active, self.inactive),
            department_id: self.department,
            q: self.query.clone(),
            page: self.page,
            size: Some(self.size),
            sort: self.sort.clone(),
        }
    }
}

pub(crate) fn active_filter(active: bool, inactive: bool) -> Option<bool> {
    match (active, inactive) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    pub username: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub full_name: String,

    #[arg(long)]
    pub role: Role,

    #[arg(long)]
    pub department: Option<u64>,

    /// Create the account deactivated.
    #[arg(long)]
    pub inactive: bool,

    /// Initial password. The server generates one when omitted.
    #[arg(long)]
    pub temp_password: Option<String>,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: u64,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub full_name: Option<String>,

    #[arg(long)]
    pub role: Option<Role>,

    #[arg(long, conflicts_with = "no_department")]
    pub department: Option<u64>,

    /// Remove the user from their department.
    #[arg(long)]
    pub no_department: bool,

    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,

    #[arg(long)]
    pub deactivate: bool,
}

impl UpdateArgs {
    fn update(&self) -> UserUpdate {
        UserUpdate {
            email: self.email.clone(),
            role: self.role,
            department_id: if self.no_department {
                Some(None)
            } else {
                self.department.map(Some)
            },
            active: active_filter(self.activate, self.deactivate),
            full_name: self.full_name.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct ResetPasswordArgs {
    pub id: u64,

    /// New temporary password. The server generates one when omitted.
    #[arg(long)]
    pub temp_password: Option<String>,
}

pub async fn run(session: &Session, command: &UserCommand) -> Result<()> {
    require_admin(session.user.role)?;
    let client = &session.client;

    match command {
        UserCommand::List(args) => {
            let page = client
                .list_users(&args.query())
                .await
                .map_err(|err| failure(&err, "Unable to load users."))?;
            if page.content.is_empty() {
                println!("{}", style("No users found.").dim());
                return Ok(());
            }
            println!(
                "{:<6} {:<20} {:<9} {:<8} {}",
                style("ID").bold(),
                style("USERNAME").bold(),
                style("ROLE").bold(),
                style("ACTIVE").bold(),
                style("NAME").bold()
            );
            for user in &page.content {
                println!(
                    "{:<6} {:<20} {:<9} {:<8} {}",
                    user.id,
                    truncate(&user.username, 20),
                    user.role,
                    if user.active { "yes" } else { "no" },
                    display_name(user)
                );
            }
            println!(
                "{}",
                style(format!("{} users", page.total_elements)).dim()
            );
        }
        UserCommand::Show(args) => {
            let user = client
                .get_user(args.id)
                .await
                .map_err(|err| failure(&err, "Unable to load user."))?;
            print_user(&user);
        }
        UserCommand::Create(args) => {
            let user = client
                .create_user(NewUser {
                    username: args.username.clone(),
                    email: args.email.clone(),
                    full_name: args.full_name.clone(),
                    role: args.role,
                    department_id: args.department,
                    active: args.inactive.then_some(false),
                    temp_password: args.temp_password.clone(),
                })
                .await
                .map_err(|err| failure(&err, "Unable to create user."))?;
            success(&format!("Created user {} (#{})", user.username, user.id));
        }
        UserCommand::Update(args) => {
            let user = client
                .update_user(args.id, args.update())
                .await
                .map_err(|err| failure(&err, "Unable to update user."))?;
            success(&format!("Updated user {}", user.username));
        }
        UserCommand::ResetPassword(args) => {
            let result = client
                .reset_password(args.id, args.temp_password.as_deref())
                .await
                .map_err(|err| failure(&err, "Unable to reset password."))?;
            success("Password reset.");
            if result.must_change_password {
                println!("  The user must choose a new password at next sign-in.");
            }
        }
    }
    Ok(())
}

fn print_user(user: &User) {
    println!("{} {}", style(&user.username).cyan().bold(), display_name(user));
    println!("  {:<12} {}", style("Id").dim(), user.id);
    println!("  {:<12} {}", style("Role").dim(), user.role);
    println!("  {:<12} {}", style("Email").dim(), user.email);
    println!(
        "  {:<12} {}",
        style("Active").dim(),
        if user.active { "yes" } else { "no" }
    );
    if let Some(department_id) = user.department_id {
        println!("  {:<12} {department_id}", style("Department").dim());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_filter() {
        assert_eq!(active_filter(false, false), None);
        assert_eq!(active_filter(true, false), Some(true));
        assert_eq!(active_filter(false, true), Some(false));
    }

    #[test]
    fn test_update_maps_department_flags() {
        let args = UpdateArgs {
            id: 3,
            email: None,
            full_name: None,
            role: None,
            department: None,
            no_department: true,
            activate: false,
            deactivate: false,
        };
        let update = args.update();
        assert_eq!(update.department_id, Some(None));
        assert!(!update.is_empty());

        let args = UpdateArgs {
            no_department: false,
            department: Some(5),
            ..args
        };
        assert_eq!(args.update().department_id, Some(Some(5)));
    }
}
