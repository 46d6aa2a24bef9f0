//! Async client for the helpdesk REST API.
//!
//! [`HelpdeskClient`] speaks HTTP: it holds the cookie session, attaches the
//! CSRF header to mutating requests and maps error statuses onto
//! [`ClientError`]. On top of it sit [`SessionContext`], which caches the
//! signed-in identity, and [`TicketController`], which owns one open ticket
//! and applies the rules from `helpdesk-core` before anything reaches the
//! network. [`Poller`] keeps a controller fresh in the background.
//!
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use helpdesk_client::{HelpdeskClient, Poller, SessionContext, TicketController};
//!
//! # async fn run() -> Result<(), helpdesk_client::ClientError> {
//! let client = HelpdeskClient::new("http://localhost:8080", Duration::from_secs(30))?;
//! let session = SessionContext::new(client.clone());
//! session.login("agent", "Secr3t!pass").await?;
//!
//! let controller = Arc::new(TicketController::new(client, 42, session.actor().await?));
//! controller.load().await?;
//! let poller = Poller::spawn(Arc::clone(&controller), Duration::from_secs(120));
//! // ...
//! poller.stop().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod controller;
mod departments;
mod error;
mod poller;
mod session;
mod tickets;
mod users;

pub use client::HelpdeskClient;
pub use controller::{TicketBackend, TicketController};
pub use departments::DepartmentQuery;
pub use error::{ApiErrorBody, ClientError};
pub use poller::{PollHandle, Poller};
pub use session::SessionContext;
pub use tickets::{TicketQuery, ticket_login_path};
pub use users::UserQuery;
