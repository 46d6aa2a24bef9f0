//! Ticket lifecycle controller.
//!
//! A [`TicketController`] owns the cached view of one ticket for one actor:
//! the last server-confirmed ticket and its comments. Every operation checks
//! the local rules first and only then talks to the backend; a failed call
//! leaves the cache as it was.
//!
//! # Stale refreshes
//!
//! Refreshes and mutations can overlap (the poller refreshes in the
//! background while the user submits a change). Each refresh records the
//! cache generation when it is issued, and every committed mutation advances
//! the generation, so a refresh issued before a mutation is discarded when it
//! lands. [`TicketController::close`] advances the generation too, which
//! makes any response arriving after close a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use helpdesk_core::{
    Actor, Capability, CapabilitySet, CommentOrder, EditDraft, NewComment, PermissionError,
    StatusChangeRequest, Ticket, TicketComment, TicketPatch, TicketStatus, WorkflowPolicy,
    build_patch, can_mark_internal, comments::sort_comments, is_raw_transition,
    ticket_capabilities, validate, visible_comments,
};
use tracing::{debug, info, instrument, warn};

use crate::error::ClientError;

/// The ticket endpoints the controller depends on.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn fetch_ticket(&self, id: u64) -> Result<Ticket, ClientError>;

    async fn fetch_comments(&self, id: u64) -> Result<Vec<TicketComment>, ClientError>;

    async fn patch_ticket(&self, id: u64, patch: &TicketPatch) -> Result<Ticket, ClientError>;

    async fn post_status(
        &self,
        id: u64,
        request: &StatusChangeRequest,
    ) -> Result<Ticket, ClientError>;

    async fn post_comment(&self, id: u64, comment: &NewComment)
    -> Result<TicketComment, ClientError>;
}

#[async_trait]
impl<T: TicketBackend + ?Sized> TicketBackend for Arc<T> {
    async fn fetch_ticket(&self, id: u64) -> Result<Ticket, ClientError> {
        (**self).fetch_ticket(id).await
    }

    async fn fetch_comments(&self, id: u64) -> Result<Vec<TicketComment>, ClientError> {
        (**self).fetch_comments(id).await
    }

    async fn patch_ticket(&self, id: u64, patch: &TicketPatch) -> Result<Ticket, ClientError> {
        (**self).patch_ticket(id, patch).await
    }

    async fn post_status(
        &self,
        id: u64,
        request: &StatusChangeRequest,
    ) -> Result<Ticket, ClientError> {
        (**self).post_status(id, request).await
    }

    async fn post_comment(
        &self,
        id: u64,
        comment: &NewComment,
    ) -> Result<TicketComment, ClientError> {
        (**self).post_comment(id, comment).await
    }
}

#[derive(Debug, Default)]
struct State {
    ticket: Option<Ticket>,
    comments: Vec<TicketComment>,
    comments_error: Option<ClientError>,
    generation: u64,
    loading: bool,
    closed: bool,
}

/// Clears the loading flag when the load finishes or its future is dropped.
struct LoadingGuard<'a> {
    state: &'a Mutex<State>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .loading = false;
    }
}

#[derive(Debug)]
pub struct TicketController<B> {
    backend: B,
    ticket_id: u64,
    actor: Actor,
    policy: WorkflowPolicy,
    comment_order: CommentOrder,
    state: Mutex<State>,
}

impl<B: TicketBackend> TicketController<B> {
    pub fn new(backend: B, ticket_id: u64, actor: Actor) -> Self {
        Self {
            backend,
            ticket_id,
            actor,
            policy: WorkflowPolicy::default(),
            comment_order: CommentOrder::default(),
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: WorkflowPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_comment_order(mut self, order: CommentOrder) -> Self {
        self.comment_order = order;
        self
    }

    pub fn ticket_id(&self) -> u64 {
        self.ticket_id
    }

    pub fn actor(&self) -> Actor {
        self.actor
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached ticket, if loaded.
    pub fn ticket(&self) -> Option<Ticket> {
        self.state().ticket.clone()
    }

    /// Cached comments the actor may read, in the configured order.
    pub fn comments(&self) -> Vec<TicketComment> {
        visible_comments(&self.state().comments, self.actor.role, self.comment_order)
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Why the comments of the last load could not be fetched, if they could
    /// not. Cleared by the next successful comment fetch.
    pub fn take_comments_error(&self) -> Option<ClientError> {
        self.state().comments_error.take()
    }

    fn loaded_ticket(&self) -> Result<Ticket, ClientError> {
        let state = self.state();
        if state.closed {
            return Err(ClientError::Closed);
        }
        state.ticket.clone().ok_or(ClientError::NotLoaded)
    }

    /// Statuses the actor may move the cached ticket into.
    pub fn allowed_transitions(&self) -> Vec<TicketStatus> {
        self.state()
            .ticket
            .as_ref()
            .map(|ticket| self.policy.allowed_transitions(ticket.status, self.actor.role))
            .unwrap_or_default()
    }

    /// Fields the actor may edit on the cached ticket.
    pub fn capabilities(&self) -> CapabilitySet {
        self.state()
            .ticket
            .as_ref()
            .map(|ticket| ticket_capabilities(ticket, self.actor))
            .unwrap_or_default()
    }

    /// Initial fetch of the ticket and its comments.
    ///
    /// A comment failure does not fail the load; the ticket is still shown
    /// and the failure is kept for [`TicketController::take_comments_error`].
    #[instrument(skip(self), fields(ticket_id = self.ticket_id))]
    pub async fn load(&self) -> Result<Ticket, ClientError> {
        self.state().loading = true;
        let _loading = LoadingGuard { state: &self.state };
        self.refresh_inner(true).await?;
        self.loaded_ticket()
    }

    /// Re-fetches ticket and comments. Returns `false` when the response was
    /// discarded because a mutation or close happened meanwhile.
    #[instrument(skip(self), fields(ticket_id = self.ticket_id))]
    pub async fn refresh(&self) -> Result<bool, ClientError> {
        self.refresh_inner(false).await
    }

    async fn refresh_inner(&self, keep_comment_error: bool) -> Result<bool, ClientError> {
        let generation = {
            let state = self.state();
            if state.closed {
                return Err(ClientError::Closed);
            }
            state.generation
        };

        let ticket = self.backend.fetch_ticket(self.ticket_id).await?;
        let comments = self.backend.fetch_comments(self.ticket_id).await;

        let mut state = self.state();
        if state.closed || state.generation != generation {
            debug!(
                issued = generation,
                current = state.generation,
                "discarding stale refresh"
            );
            return Ok(false);
        }
        state.ticket = Some(ticket);
        match comments {
            Ok(comments) => {
                state.comments = comments;
                state.comments_error = None;
            }
            Err(err) if keep_comment_error => {
                warn!(error = %err, "comment fetch failed");
                state.comments_error = Some(err);
            }
            Err(err) => debug!(error = %err, "comment fetch failed, keeping cached comments"),
        }
        Ok(true)
    }

    /// Re-fetches comments only.
    #[instrument(skip(self), fields(ticket_id = self.ticket_id))]
    pub async fn refresh_comments(&self) -> Result<bool, ClientError> {
        let generation = {
            let state = self.state();
            if state.closed {
                return Err(ClientError::Closed);
            }
            state.generation
        };

        let comments = self.backend.fetch_comments(self.ticket_id).await?;

        let mut state = self.state();
        if state.closed || state.generation != generation {
            debug!("discarding stale comment refresh");
            return Ok(false);
        }
        state.comments = comments;
        state.comments_error = None;
        Ok(true)
    }

    /// Applies a confirmed mutation and invalidates in-flight refreshes.
    fn commit(&self, apply: impl FnOnce(&mut State)) {
        let mut state = self.state();
        if state.closed {
            return;
        }
        state.generation += 1;
        apply(&mut state);
    }

    /// Moves the ticket to `to`.
    ///
    /// Role, table and hold-reason checks run before any request is sent.
    #[instrument(skip(self, note, hold_reason), fields(ticket_id = self.ticket_id))]
    pub async fn submit_transition(
        &self,
        to: TicketStatus,
        note: Option<&str>,
        hold_reason: Option<&str>,
    ) -> Result<Ticket, ClientError> {
        let ticket = self.loaded_ticket()?;
        let request = self
            .policy
            .prepare_transition(&ticket, self.actor, to, note, hold_reason)?;

        let updated = self.backend.post_status(self.ticket_id, &request).await?;
        info!(from = %ticket.status, to = %updated.status, "status changed");
        self.commit(|state| state.ticket = Some(updated.clone()));
        Ok(updated)
    }

    /// Sends the changed fields of `draft`.
    #[instrument(skip(self, draft), fields(ticket_id = self.ticket_id))]
    pub async fn submit_edit(&self, draft: &EditDraft) -> Result<Ticket, ClientError> {
        let ticket = self.loaded_ticket()?;
        let patch = build_patch(&ticket, draft, ticket_capabilities(&ticket, self.actor))?;

        let updated = self.backend.patch_ticket(self.ticket_id, &patch).await?;
        info!("ticket updated");
        self.commit(|state| state.ticket = Some(updated.clone()));
        Ok(updated)
    }

    /// Cancels the ticket on behalf of its reporter, or staff.
    ///
    /// Staff go through the role filter like any other status change, so an
    /// agent can only cancel when the policy lets agents cancel.
    #[instrument(skip(self), fields(ticket_id = self.ticket_id))]
    pub async fn cancel_ticket(&self) -> Result<Ticket, ClientError> {
        let ticket = self.loaded_ticket()?;
        ticket_capabilities(&ticket, self.actor).require(Capability::Cancel)?;
        if self.actor.role.is_staff() {
            if !self
                .policy
                .allowed_transitions(ticket.status, self.actor.role)
                .contains(&TicketStatus::Cancelled)
            {
                return Err(PermissionError::TransitionNotAllowed {
                    from: ticket.status,
                    to: TicketStatus::Cancelled,
                    role: self.actor.role,
                }
                .into());
            }
        } else if !is_raw_transition(ticket.status, TicketStatus::Cancelled) {
            return Err(PermissionError::CancelDenied.into());
        }

        let request = StatusChangeRequest {
            to_status: TicketStatus::Cancelled,
            note: None,
            hold_reason: None,
        };
        let updated = self.backend.post_status(self.ticket_id, &request).await?;
        info!("ticket cancelled");
        self.commit(|state| state.ticket = Some(updated.clone()));
        Ok(updated)
    }

    /// Posts a comment. End users cannot post internal comments; the flag is
    /// silently dropped for them.
    #[instrument(skip(self, content), fields(ticket_id = self.ticket_id))]
    pub async fn add_comment(
        &self,
        content: &str,
        internal: bool,
    ) -> Result<TicketComment, ClientError> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let comment = NewComment {
            content: validate::comment(content)?,
            is_internal: internal && can_mark_internal(self.actor.role),
        };

        let created = self.backend.post_comment(self.ticket_id, &comment).await?;
        info!(comment_id = created.id, internal = created.is_internal, "comment added");
        let order = self.comment_order;
        self.commit(|state| {
            state.comments.push(created.clone());
            sort_comments(&mut state.comments, order);
        });
        Ok(created)
    }

    /// Stops accepting responses. In-flight refreshes are discarded.
    pub fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.generation += 1;
    }
}
