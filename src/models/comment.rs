//! Comment model for ticket discussions.

use super::{null_as_default, Attachment, TicketState, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reply appended to a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,

    #[serde(rename = "tiketti", default)]
    pub ticket_id: Option<i64>,

    #[serde(rename = "lahettaja", default)]
    pub author: Option<User>,

    #[serde(rename = "viesti", default, deserialize_with = "null_as_default")]
    pub body: String,

    /// State the comment moved the ticket into, if any.
    #[serde(rename = "tila", default)]
    pub state: Option<TicketState>,

    #[serde(rename = "aikaleima", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "muokattu", default)]
    pub edited_at: Option<DateTime<Utc>>,

    #[serde(rename = "liitteet", default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
}

impl Comment {
    /// Owners and privileged roles may edit or remove a comment.
    pub fn can_edit(&self, user: Option<&User>) -> bool {
        let Some(user) = user else {
            return false;
        };
        let is_owner = self.author.as_ref().is_some_and(|a| a.id == user.id);
        is_owner || user.role.is_some_and(|r| r.is_privileged())
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }
}

/// Request body for a new comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewComment {
    #[serde(rename = "viesti")]
    pub body: String,
    #[serde(rename = "tila", skip_serializing_if = "Option::is_none")]
    pub state: Option<TicketState>,
}

/// Response of a new comment; the id addresses attachment uploads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddCommentResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "kommentti", default)]
    pub comment_id: Option<i64>,
}
