//! Ticket, FAQ and ticket-field models.

use super::{null_as_default, Attachment, Comment, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a ticket or comment.
///
/// Travels as a small integer on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TicketState {
    Sent,
    Read,
    InfoRequested,
    Commented,
    ProposedSolution,
    Resolved,
    Archived,
}

impl TicketState {
    /// Localization key for the state label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Sent => "state.sent",
            Self::Read => "state.read",
            Self::InfoRequested => "state.info-requested",
            Self::Commented => "state.commented",
            Self::ProposedSolution => "state.proposed-solution",
            Self::Resolved => "state.resolved",
            Self::Archived => "state.archived",
        }
    }
}

impl TryFrom<u8> for TicketState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Sent),
            2 => Ok(Self::Read),
            3 => Ok(Self::InfoRequested),
            4 => Ok(Self::Commented),
            5 => Ok(Self::ProposedSolution),
            6 => Ok(Self::Resolved),
            7 => Ok(Self::Archived),
            other => Err(format!("unknown ticket state {}", other)),
        }
    }
}

impl From<TicketState> for u8 {
    fn from(state: TicketState) -> Self {
        match state {
            TicketState::Sent => 1,
            TicketState::Read => 2,
            TicketState::InfoRequested => 3,
            TicketState::Commented => 4,
            TicketState::ProposedSolution => 5,
            TicketState::Resolved => 6,
            TicketState::Archived => 7,
        }
    }
}

/// Course-defined additional field, either as a template (no value yet) or
/// filled in on a ticket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketField {
    /// Stripped before a template is saved; the backend assigns new ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    #[serde(rename = "otsikko")]
    pub title: String,

    #[serde(rename = "arvo", default, deserialize_with = "null_as_default")]
    pub value: String,

    #[serde(rename = "tyyppi", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<i64>,

    #[serde(rename = "ohje", default, deserialize_with = "null_as_default")]
    pub help: String,

    #[serde(rename = "pakollinen", default)]
    pub required: bool,

    #[serde(rename = "esitaytettava", default)]
    pub prefillable: bool,

    #[serde(rename = "valinnat", default, deserialize_with = "null_as_default")]
    pub choices: Vec<String>,
}

/// A submitted question. FAQs are tickets with `is_faq` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,

    #[serde(rename = "otsikko")]
    pub title: String,

    /// Question text; list rows leave it out.
    #[serde(rename = "viesti", default)]
    pub body: Option<String>,

    #[serde(rename = "tila")]
    pub state: TicketState,

    #[serde(rename = "kurssi", default)]
    pub course_id: Option<i64>,

    #[serde(rename = "aloittaja", default)]
    pub author: Option<User>,

    #[serde(rename = "aikaleima")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "viimeisin", default)]
    pub last_activity: Option<DateTime<Utc>>,

    #[serde(rename = "kentat", default, deserialize_with = "null_as_default")]
    pub fields: Vec<TicketField>,

    #[serde(rename = "kommentit", default, deserialize_with = "null_as_default")]
    pub comments: Vec<Comment>,

    #[serde(rename = "liitteet", default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,

    #[serde(rename = "ukk", default)]
    pub is_faq: bool,

    #[serde(rename = "arkistoitava", default)]
    pub archivable: bool,
}

impl Ticket {
    /// Text of the last comment proposing a solution, used as the default
    /// answer when a ticket is copied into an FAQ.
    pub fn proposed_answer(&self) -> Option<&str> {
        self.comments
            .iter()
            .rev()
            .find(|c| c.state == Some(TicketState::ProposedSolution))
            .map(|c| c.body.as_str())
    }

    /// The first comment carries the answer of an FAQ and its attachments.
    pub fn answer_comment(&self) -> Option<&Comment> {
        self.comments.first()
    }

    /// Case-insensitive title match used by the list filter.
    pub fn matches_filter(&self, filter: &str) -> bool {
        let filter = filter.trim().to_lowercase();
        filter.is_empty() || self.title.to_lowercase().contains(&filter)
    }
}

/// Value of one additional field in a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub id: i64,
    #[serde(rename = "arvo")]
    pub value: String,
}

/// Request body for a new ticket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTicket {
    #[serde(rename = "otsikko")]
    pub title: String,
    #[serde(rename = "viesti")]
    pub message: String,
    #[serde(rename = "kentat")]
    pub fields: Vec<FieldValue>,
}

/// Request body for a new or edited FAQ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewFaq {
    #[serde(rename = "otsikko")]
    pub title: String,
    #[serde(rename = "viesti")]
    pub question: String,
    #[serde(rename = "vastaus")]
    pub answer: String,
    #[serde(rename = "kentat")]
    pub fields: Vec<FieldValue>,
}

/// Ids of what the backend created for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIds {
    #[serde(rename = "tiketti")]
    pub ticket_id: i64,
    #[serde(rename = "kommentti")]
    pub comment_id: i64,
}

/// Response of ticket and FAQ submissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddTicketResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(rename = "uusi", default)]
    pub created: Option<CreatedIds>,
}

/// Plain `{ "success": bool }` response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
}
