//! Comment visibility and ordering.
//!
//! Internal comments are staff-only. Both helpers here are pure; the client
//! applies them to whatever the server returned.

use serde::{Deserialize, Serialize};

use crate::model::{Role, TicketComment};

/// Direction comments are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Comments `role` may read, sorted by creation time.
///
/// End users never see internal comments. The sort is stable, so comments
/// sharing a timestamp keep their input order in both directions.
pub fn visible_comments(
    comments: &[TicketComment],
    role: Role,
    order: CommentOrder,
) -> Vec<TicketComment> {
    let mut visible: Vec<TicketComment> = comments
        .iter()
        .filter(|comment| role.is_staff() || !comment.is_internal)
        .cloned()
        .collect();
    sort_comments(&mut visible, order);
    visible
}

pub fn sort_comments(comments: &mut [TicketComment], order: CommentOrder) {
    match order {
        CommentOrder::NewestFirst => comments.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        CommentOrder::OldestFirst => comments.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
    }
}
