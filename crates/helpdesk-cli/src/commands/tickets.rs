//! `helpdesk tickets` subcommands.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;
use helpdesk_client::{HelpdeskClient, Poller, TicketController, TicketQuery};
use helpdesk_core::{
    Actor, Capability, EditDraft, NewTicket, Priority, SlaFlag, Ticket, TicketCategory,
    TicketComment, TicketStatus, timestamp,
};
use tracing::debug;

use super::{Session, failure, success, truncate};

const SUBJECT_WIDTH: usize = 40;

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// List tickets
    List(ListArgs),

    /// Show a ticket with its comments and what you may do next
    Show(TicketArg),

    /// Open a new ticket
    Create(CreateArgs),

    /// Move a ticket to another status
    Status(StatusArgs),

    /// Edit ticket fields
    Edit(EditArgs),

    /// Cancel a ticket
    Cancel(TicketArg),

    /// Add a comment
    Comment(CommentArgs),

    /// Follow a ticket, printing changes until Ctrl-C
    Watch(WatchArgs),
}

#[derive(Debug, Args)]
pub struct TicketArg {
    pub id: u64,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<TicketStatus>,

    #[arg(long)]
    pub priority: Option<Priority>,

    /// Zero-based page number.
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long, default_value_t = 20)]
    pub size: u32,

    /// Sort expression, e.g. `createdAt,desc`.
    #[arg(long)]
    pub sort: Option<String>,

    /// Only tickets you reported.
    #[arg(long)]
    pub mine: bool,

    /// Only tickets assigned to you.
    #[arg(long)]
    pub assigned: bool,
}

impl ListArgs {
    fn query(&self, actor: Actor) -> TicketQuery {
        TicketQuery {
            status: self.status,
            priority: self.priority,
            page: self.page,
            size: Some(self.size),
            sort: self.sort.clone(),
            reporter_id: self.mine.then_some(actor.id),
            assignee_id: self.assigned.then_some(actor.id),
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Short summary, 5-200 characters.
    pub subject: String,

    /// What happened, 10-4000 characters.
    #[arg(short, long)]
    pub description: String,

    #[arg(short, long, default_value = "MEDIUM")]
    pub priority: Priority,

    #[arg(short, long)]
    pub category: TicketCategory,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    pub id: u64,

    /// Target status, e.g. `IN_PROGRESS` or `on-hold`.
    pub to: TicketStatus,

    /// Note recorded with the status change.
    #[arg(long)]
    pub note: Option<String>,

    /// Required when moving to `ON_HOLD`.
    #[arg(long)]
    pub hold_reason: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    pub id: u64,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub priority: Option<Priority>,

    #[arg(long)]
    pub category: Option<TicketCategory>,

    /// Assign the ticket to this user id.
    #[arg(long, conflicts_with = "unassign")]
    pub assignee: Option<u64>,

    /// Remove the current assignee.
    #[arg(long)]
    pub unassign: bool,

    /// Link the ticket to this asset id.
    #[arg(long, conflicts_with = "clear_asset")]
    pub asset: Option<u64>,

    /// Remove the linked asset.
    #[arg(long)]
    pub clear_asset: bool,
}

impl EditArgs {
    pub fn draft(&self) -> EditDraft {
        EditDraft {
            subject: self.subject.clone(),
            description: self.description.clone(),
            priority: self.priority,
            assignee_id: clearable(self.assignee, self.unassign),
            category: self.category,
            related_asset_id: clearable(self.asset, self.clear_asset),
        }
    }
}

fn clearable(value: Option<u64>, clear: bool) -> Option<Option<u64>> {
    if clear { Some(None) } else { value.map(Some) }
}

#[derive(Debug, Args)]
pub struct CommentArgs {
    pub id: u64,

    pub content: String,

    /// Hide the comment from end users. Ignored for end users.
    #[arg(long)]
    pub internal: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    pub id: u64,

    /// Seconds between refreshes; defaults to the configured poll interval.
    #[arg(long)]
    pub interval: Option<u64>,
}

pub async fn run(session: &Session, command: &TicketCommand) -> Result<()> {
    match command {
        TicketCommand::List(args) => list(session, args).await,
        TicketCommand::Show(args) => show(session, args.id).await,
        TicketCommand::Create(args) => create(session, args).await,
        TicketCommand::Status(args) => {
            let controller = open(session, args.id).await?;
            let ticket = controller
                .submit_transition(args.to, args.note.as_deref(), args.hold_reason.as_deref())
                .await
                .map_err(|err| failure(&err, "Unable to update status. Please try again."))?;
            success(&format!(
                "{} is now {}",
                ticket.ticket_number,
                style(ticket.status).bold()
            ));
            Ok(())
        }
        TicketCommand::Edit(args) => {
            let controller = open(session, args.id).await?;
            let ticket = controller
                .submit_edit(&args.draft())
                .await
                .map_err(|err| failure(&err, "Unable to save changes."))?;
            success(&format!("{} updated", ticket.ticket_number));
            Ok(())
        }
        TicketCommand::Cancel(args) => {
            let controller = open(session, args.id).await?;
            let ticket = controller
                .cancel_ticket()
                .await
                .map_err(|err| failure(&err, "Unable to cancel ticket."))?;
            success(&format!("{} cancelled", ticket.ticket_number));
            Ok(())
        }
        TicketCommand::Comment(args) => {
            let controller = open(session, args.id).await?;
            let comment = controller
                .add_comment(&args.content, args.internal)
                .await
                .map_err(|err| failure(&err, "Unable to add comment."))?;
            let visibility = if comment.is_internal {
                "internal"
            } else {
                "public"
            };
            success(&format!("Added {visibility} comment #{}", comment.id));
            Ok(())
        }
        TicketCommand::Watch(args) => watch(session, args).await,
    }
}

/// Opens a controller for ticket `id` and loads it.
async fn open(session: &Session, id: u64) -> Result<TicketController<HelpdeskClient>> {
    let controller =
        TicketController::new(session.client.clone(), id, Actor::from(&session.user))
            .with_policy(session.config.policy())
            .with_comment_order(session.config.comment_order());
    controller
        .load()
        .await
        .map_err(|err| failure(&err, "Unable to load ticket."))?;
    Ok(controller)
}

async fn list(session: &Session, args: &ListArgs) -> Result<()> {
    let page = session
        .client
        .list_tickets(&args.query(Actor::from(&session.user)))
        .await
        .map_err(|err| failure(&err, "Unable to load tickets."))?;

    if page.content.is_empty() {
        println!("{}", style("No tickets found.").dim());
        return Ok(());
    }

    println!(
        "{:<10} {:<12} {:<9} {:<9} {}",
        style("NUMBER").bold(),
        style("STATUS").bold(),
        style("PRIORITY").bold(),
        style("SLA").bold(),
        style("SUBJECT").bold()
    );
    for ticket in &page.content {
        let sla = ticket.sla_flag.map_or("-", SlaFlag::as_str);
        println!(
            "{:<10} {:<12} {:<9} {:<9} {}",
            ticket.ticket_number,
            ticket.status,
            ticket.priority,
            sla,
            truncate(&ticket.subject, SUBJECT_WIDTH)
        );
    }
    println!(
        "{}",
        style(format!(
            "Page {} of {} ({} tickets)",
            page.number + 1,
            page.total_pages.max(1),
            page.total_elements
        ))
        .dim()
    );
    Ok(())
}

async fn show(session: &Session, id: u64) -> Result<()> {
    let controller = open(session, id).await?;
    let ticket = controller.ticket().context("ticket was not loaded")?;
    print_ticket(&ticket);

    let next = controller.allowed_transitions();
    if !next.is_empty() {
        let next: Vec<String> = next.iter().map(ToString::to_string).collect();
        println!("  {:<12} {}", style("Next").dim(), next.join(", "));
    }
    let editable: Vec<&str> = controller
        .capabilities()
        .iter()
        .map(Capability::field)
        .collect();
    if !editable.is_empty() {
        println!("  {:<12} {}", style("You can").dim(), editable.join(", "));
    }

    println!();
    if let Some(err) = controller.take_comments_error() {
        println!(
            "{}",
            style(err.user_message("Unable to load comments. Please try again later.")).red()
        );
    } else {
        print_comments(&controller.comments());
    }
    Ok(())
}

fn print_ticket(ticket: &Ticket) {
    println!(
        "{} {}",
        style(&ticket.ticket_number).cyan().bold(),
        style(&ticket.subject).bold()
    );
    println!("  {:<12} {}", style("Status").dim(), ticket.status);
    println!("  {:<12} {}", style("Priority").dim(), ticket.priority);
    println!("  {:<12} {}", style("Category").dim(), ticket.category_label());
    if let Some(reporter) = &ticket.reporter {
        println!("  {:<12} {}", style("Reporter").dim(), reporter.display_name());
    }
    match &ticket.assignee {
        Some(assignee) => {
            println!("  {:<12} {}", style("Assignee").dim(), assignee.display_name());
        }
        None => println!("  {:<12} unassigned", style("Assignee").dim()),
    }
    if let Some(flag) = ticket.sla_flag {
        println!("  {:<12} {flag}", style("SLA").dim());
    }
    if let Some(deadline) = ticket.sla_resolution_deadline {
        println!(
            "  {:<12} {}",
            style("Resolve by").dim(),
            timestamp::format(&deadline)
        );
    }
    println!(
        "  {:<12} {}",
        style("Opened").dim(),
        timestamp::format(&ticket.created_at)
    );
    println!();
    println!("{}", ticket.description);
}

fn print_comments(comments: &[TicketComment]) {
    if comments.is_empty() {
        println!("{}", style("No comments.").dim());
        return;
    }
    for comment in comments {
        let author = comment.author_name.as_deref().unwrap_or("unknown");
        let marker = if comment.is_internal {
            style(" [internal]").yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "{} {}{marker}",
            style(author).bold(),
            style(timestamp::format(&comment.created_at)).dim()
        );
        println!("  {}", comment.content);
    }
}

async fn create(session: &Session, args: &CreateArgs) -> Result<()> {
    let ticket = session
        .client
        .create_ticket(&NewTicket {
            subject: args.subject.clone(),
            description: args.description.clone(),
            priority: args.priority,
            category: args.category,
        })
        .await
        .map_err(|err| failure(&err, "Unable to create ticket."))?;
    success(&format!(
        "Created {} ({})",
        style(&ticket.ticket_number).bold(),
        ticket.status
    ));
    Ok(())
}

async fn watch(session: &Session, args: &WatchArgs) -> Result<()> {
    let period = args
        .interval
        .filter(|secs| *secs > 0)
        .map_or_else(|| session.config.poll_interval(), Duration::from_secs);
    let controller = Arc::new(open(session, args.id).await?);
    let Some(mut last) = controller.ticket() else {
        return Ok(());
    };
    let mut seen_comments = controller.comments().len();

    print_ticket(&last);
    println!(
        "\n{} Watching {} every {}s, Ctrl-C to stop",
        style("→").cyan(),
        last.ticket_number,
        period.as_secs()
    );

    let poller = Poller::spawn(Arc::clone(&controller), period);
    let mut check = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for Ctrl-C")?;
                break;
            }
            _ = check.tick() => {
                let Some(current) = controller.ticket() else {
                    continue;
                };
                if current.status != last.status {
                    println!(
                        "{} {} → {}",
                        style("•").cyan(),
                        last.status,
                        style(current.status).bold()
                    );
                } else if current.updated_at != last.updated_at {
                    println!("{} ticket updated", style("•").cyan());
                }
                last = current;

                let comments = controller.comments();
                if comments.len() != seen_comments {
                    debug!(before = seen_comments, after = comments.len(), "comments changed");
                    println!("{} {} comment(s)", style("•").cyan(), comments.len());
                    seen_comments = comments.len();
                }
            }
        }
    }

    controller.close();
    poller.stop().await;
    Ok(())
}
