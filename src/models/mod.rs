//! Data models for the application.
//!
//! These are the request/response shapes of the ticket backend. The backend
//! uses Finnish keys on the wire; fields are renamed with serde so the rest
//! of the crate works with English names and typed values.

pub mod attachment;
pub mod comment;
pub mod course;
pub mod ticket;
pub mod user;

// Re-exports for convenient access
pub use attachment::{Attachment, FileInfo, SelectedFile, UploadEvent};
pub use comment::{AddCommentResponse, Comment, NewComment};
pub use course::{Course, InvitationResponse, InvitedInfo, JoinRequest, MyCourse, NewInvitation};
pub use ticket::{
    AddTicketResponse, CreatedIds, FieldValue, NewFaq, NewTicket, SuccessResponse, Ticket,
    TicketField, TicketState,
};
pub use user::{Role, User};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
