//! Ticket and comment endpoints.

use async_trait::async_trait;
use helpdesk_core::{
    NewComment, NewTicket, Page, Priority, StatusChangeRequest, Ticket, TicketComment,
    TicketPatch, TicketStatus, TicketSummary, validate,
};
use tracing::{info, instrument};

use crate::{client::HelpdeskClient, controller::TicketBackend, error::ClientError};

/// Filters and paging for `GET /tickets`. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<Priority>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
    pub reporter_id: Option<u64>,
    pub assignee_id: Option<u64>,
}

impl TicketQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = self.status {
            query.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            query.push(("priority", priority.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            query.push(("size", size.to_string()));
        }
        if let Some(sort) = self.sort.as_deref().map(str::trim)
            && !sort.is_empty()
        {
            query.push(("sort", sort.to_string()));
        }
        if let Some(reporter_id) = self.reporter_id {
            query.push(("reporterId", reporter_id.to_string()));
        }
        if let Some(assignee_id) = self.assignee_id {
            query.push(("assigneeId", assignee_id.to_string()));
        }
        query
    }
}

/// Login path that returns to ticket `id`.
pub fn ticket_login_path(id: u64) -> String {
    format!("/login?next=/tickets/{id}")
}

impl HelpdeskClient {
    pub async fn list_tickets(
        &self,
        query: &TicketQuery,
    ) -> Result<Page<TicketSummary>, ClientError> {
        let url = self.url_with_segments(&["tickets"])?;
        self.get_json(url, &query.to_query()).await
    }

    /// Fetches one ticket.
    ///
    /// A 404 becomes [`ClientError::TicketNotFound`]; a 401 or 403 carries
    /// the login path leading back to this ticket.
    #[instrument(skip(self))]
    pub async fn get_ticket(&self, id: u64) -> Result<Ticket, ClientError> {
        let url = self.url_with_segments(&["tickets", &id.to_string()])?;
        self.get_json(url, &[])
            .await
            .map_err(|err| ticket_error(err, id))
    }

    /// Validates and creates a ticket.
    #[instrument(skip_all)]
    pub async fn create_ticket(&self, ticket: &NewTicket) -> Result<Ticket, ClientError> {
        let ticket = validate::new_ticket(ticket)?;
        let url = self.url_with_segments(&["tickets"])?;
        let created: Ticket = self.post_json(url, &ticket).await?;
        info!(ticket_id = created.id, number = %created.ticket_number, "ticket created");
        Ok(created)
    }

    pub async fn update_ticket(&self, id: u64, patch: &TicketPatch) -> Result<Ticket, ClientError> {
        let url = self.url_with_segments(&["tickets", &id.to_string()])?;
        self.patch_json(url, patch)
            .await
            .map_err(|err| ticket_error(err, id))
    }

    pub async fn list_comments(&self, id: u64) -> Result<Vec<TicketComment>, ClientError> {
        let url = self.url_with_segments(&["tickets", &id.to_string(), "comments"])?;
        self.get_json(url, &[])
            .await
            .map_err(|err| ticket_error(err, id))
    }

    pub async fn add_comment(
        &self,
        id: u64,
        comment: &NewComment,
    ) -> Result<TicketComment, ClientError> {
        let url = self.url_with_segments(&["tickets", &id.to_string(), "comments"])?;
        self.post_json(url, comment)
            .await
            .map_err(|err| ticket_error(err, id))
    }

    pub async fn change_status(
        &self,
        id: u64,
        request: &StatusChangeRequest,
    ) -> Result<Ticket, ClientError> {
        let url = self.url_with_segments(&["tickets", &id.to_string(), "status"])?;
        self.post_json(url, request)
            .await
            .map_err(|err| ticket_error(err, id))
    }
}

fn ticket_error(err: ClientError, id: u64) -> ClientError {
    match err {
        ClientError::NotFound { .. } => ClientError::TicketNotFound { id },
        ClientError::Unauthorized { status, .. } => ClientError::Unauthorized {
            status,
            return_to: Some(ticket_login_path(id)),
        },
        other => other,
    }
}

#[async_trait]
impl TicketBackend for HelpdeskClient {
    async fn fetch_ticket(&self, id: u64) -> Result<Ticket, ClientError> {
        self.get_ticket(id).await
    }

    async fn fetch_comments(&self, id: u64) -> Result<Vec<TicketComment>, ClientError> {
        self.list_comments(id).await
    }

    async fn patch_ticket(&self, id: u64, patch: &TicketPatch) -> Result<Ticket, ClientError> {
        self.update_ticket(id, patch).await
    }

    async fn post_status(
        &self,
        id: u64,
        request: &StatusChangeRequest,
    ) -> Result<Ticket, ClientError> {
        self.change_status(id, request).await
    }

    async fn post_comment(&self, id: u64, comment: &NewComment) -> Result<TicketComment, ClientError> {
        self.add_comment(id, comment).await
    }
}
