//! `helpdesk departments` subcommands. Administrators only.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use helpdesk_client::DepartmentQuery;
use helpdesk_core::{Department, DepartmentUpdate, NewDepartment, require_admin};

use super::{Session, failure, success, truncate, users::active_filter};

#[derive(Debug, Subcommand)]
pub enum DepartmentCommand {
    /// List departments
    List(ListArgs),

    /// Show one department
    Show(DepartmentArg),

    /// Create a department
    Create(CreateArgs),

    /// Update a department
    Update(UpdateArgs),

    /// Id, code and name of every department
    Minimal(MinimalArgs),
}

#[derive(Debug, Args)]
pub struct DepartmentArg {
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Search code and name.
    #[arg(short, long)]
    pub query: Option<String>,

    #[arg(long, conflicts_with = "inactive")]
    pub active: bool,

    #[arg(long)]
    pub inactive: bool,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, default_value_t = 20)]
    pub size: u32,

    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// 2-32 letters, digits, `_` or `-`.
    pub code: String,

    pub name: String,

    #[arg(long)]
    pub description: Option<String>,

    /// Create the department deactivated.
    #[arg(long)]
    pub inactive: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    pub id: u64,

    #[arg(long)]
    pub code: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,

    #[arg(long)]
    pub clear_description: bool,

    #[arg(long, conflicts_with = "deactivate")]
    pub activate: bool,

    #[arg(long)]
    pub deactivate: bool,
}

#[derive(Debug, Args)]
pub struct MinimalArgs {
    /// Include deactivated departments.
    #[arg(long)]
    pub all: bool,
}

pub async fn run(session: &Session, command: &DepartmentCommand) -> Result<()> {
    require_admin(session.user.role)?;
    let client = &session.client;

    match command {
        DepartmentCommand::List(args) => {
            let page = client
                .list_departments(&DepartmentQuery {
                    q: args.query.clone(),
                    active: active_filter(args.active, args.inactive),
                    page: args.page,
                    size: Some(args.size),
                    sort: args.sort.clone(),
                })
                .await
                .map_err(|err| failure(&err, "Unable to load departments."))?;
            if page.content.is_empty() {
                println!("{}", style("No departments found.").dim());
                return Ok(());
            }
            println!(
                "{:<6} {:<12} {:<8} {}",
                style("ID").bold(),
                style("CODE").bold(),
                style("ACTIVE").bold(),
                style("NAME").bold()
            );
            for department in &page.content {
                println!(
                    "{:<6} {:<12} {:<8} {}",
                    department.id,
                    department.code,
                    if department.active { "yes" } else { "no" },
                    truncate(&department.name, 48)
                );
            }
        }
        DepartmentCommand::Show(args) => {
            let department = client
                .get_department(args.id)
                .await
                .map_err(|err| failure(&err, "Unable to load department."))?;
            print_department(&department);
        }
        DepartmentCommand::Create(args) => {
            let department = client
                .create_department(&NewDepartment {
                    code: args.code.clone(),
                    name: args.name.clone(),
                    description: args.description.clone(),
                    active: args.inactive.then_some(false),
                })
                .await
                .map_err(|err| failure(&err, "Unable to save department."))?;
            success(&format!(
                "Created department {} (#{})",
                department.code, department.id
            ));
        }
        DepartmentCommand::Update(args) => {
            let update = DepartmentUpdate {
                code: args.code.clone(),
                name: args.name.clone(),
                description: if args.clear_description {
                    Some(None)
                } else {
                    args.description.clone().map(Some)
                },
                active: active_filter(args.activate, args.deactivate),
            };
            let department = client
                .update_department(args.id, &update)
                .await
                .map_err(|err| failure(&err, "Unable to save department."))?;
            success(&format!("Updated department {}", department.code));
        }
        DepartmentCommand::Minimal(args) => {
            let departments = client
                .minimal_departments((!args.all).then_some(true))
                .await
                .map_err(|err| failure(&err, "Unable to load departments."))?;
            for department in &departments {
                println!("{:<6} {:<12} {}", department.id, department.code, department.name);
            }
        }
    }
    Ok(())
}

fn print_department(department: &Department) {
    println!(
        "{} {}",
        style(&department.code).cyan().bold(),
        department.name
    );
    println!("  {:<12} {}", style("Id").dim(), department.id);
    println!(
        "  {:<12} {}",
        style("Active").dim(),
        if department.active { "yes" } else { "no" }
    );
    if let Some(description) = &department.description {
        println!("  {:<12} {description}", style("Description").dim());
    }
}
