//! Ticket, FAQ, comment and attachment operations.

use crate::error::AppError;
use crate::models::{
    AddCommentResponse, AddTicketResponse, Comment, NewComment, NewFaq, NewTicket, SelectedFile,
    SuccessResponse, Ticket, TicketField, TicketState, UploadEvent,
};
use crate::services::api_client::ApiClient;
use crate::services::endpoints;
use crate::services::error_handler::ErrorHandler;
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct TicketService {
    api: Arc<ApiClient>,
    errors: Arc<ErrorHandler>,
}

impl TicketService {
    pub fn new(api: Arc<ApiClient>, errors: Arc<ErrorHandler>) -> Self {
        Self { api, errors }
    }

    fn report(&self, err: AppError) -> AppError {
        self.errors.report(err)
    }

    /// FAQ entries of a course.
    pub async fn get_faq(&self, course_id: i64) -> Result<Vec<Ticket>, AppError> {
        self.api
            .get(&endpoints::faqs(course_id))
            .await
            .map_err(|e| self.report(e))
    }

    /// Tickets of a course visible to the signed-in user.
    pub async fn get_ticket_list(&self, course_id: i64) -> Result<Vec<Ticket>, AppError> {
        self.api
            .get(&endpoints::all_tickets(course_id))
            .await
            .map_err(|e| self.report(e))
    }

    /// A ticket with its additional fields and comments, fetched concurrently.
    pub async fn get_ticket_info(&self, ticket_id: i64) -> Result<Ticket, AppError> {
        let ticket_path = endpoints::ticket(ticket_id);
        let fields_path = endpoints::ticket_fields(ticket_id);
        let comments_path = endpoints::ticket_comments(ticket_id);

        let (mut ticket, fields, comments) = tokio::try_join!(
            self.api.get::<Ticket>(&ticket_path),
            self.api.get::<Option<Vec<TicketField>>>(&fields_path),
            self.api.get::<Option<Vec<Comment>>>(&comments_path),
        )
        .map_err(|e| self.report(e))?;

        ticket.fields = fields.unwrap_or_default();
        ticket.comments = comments.unwrap_or_default();
        Ok(ticket)
    }

    pub async fn add_ticket(
        &self,
        course_id: i64,
        ticket: &NewTicket,
    ) -> Result<AddTicketResponse, AppError> {
        self.api
            .post(&endpoints::new_ticket(course_id), ticket)
            .await
            .map_err(|e| self.report(e))
    }

    /// Create an FAQ on course `id`, or with `edit_existing` overwrite the
    /// FAQ whose ticket id is `id`.
    pub async fn add_faq(
        &self,
        id: i64,
        faq: &NewFaq,
        edit_existing: bool,
    ) -> Result<AddTicketResponse, AppError> {
        let result = if edit_existing {
            self.api.put(&endpoints::edit_faq(id), faq).await
        } else {
            self.api.post(&endpoints::faqs(id), faq).await
        };
        result.map_err(|e| self.report(e))
    }

    /// FAQs are never deleted, only archived.
    pub async fn archive_faq(&self, ticket_id: i64) -> Result<SuccessResponse, AppError> {
        self.api
            .post(&endpoints::archive_faq(ticket_id), &serde_json::json!({}))
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn add_comment(
        &self,
        ticket_id: i64,
        comment: &NewComment,
    ) -> Result<AddCommentResponse, AppError> {
        self.api
            .post(&endpoints::new_comment(ticket_id), comment)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn edit_comment(
        &self,
        ticket_id: i64,
        comment_id: i64,
        body: &str,
        state: Option<TicketState>,
        course_id: i64,
    ) -> Result<SuccessResponse, AppError> {
        let request = NewComment {
            body: body.to_string(),
            state,
        };
        self.api
            .put(&endpoints::comment(course_id, ticket_id, comment_id), &request)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn remove_comment(
        &self,
        ticket_id: i64,
        comment_id: i64,
        course_id: i64,
    ) -> Result<SuccessResponse, AppError> {
        self.api
            .delete(&endpoints::comment(course_id, ticket_id, comment_id))
            .await
            .map_err(|e| self.report(e))
    }

    /// Upload one attachment to a comment, reporting progress on `progress`.
    pub async fn upload_file(
        &self,
        ticket_id: i64,
        comment_id: i64,
        file: &SelectedFile,
        progress: &mpsc::UnboundedSender<UploadEvent>,
    ) -> Result<SuccessResponse, AppError> {
        log::debug!(
            "[upload] {} ({} bytes) to ticket {} comment {}",
            file.name,
            file.size(),
            ticket_id,
            comment_id
        );
        self.api
            .upload(&endpoints::attachments(ticket_id, comment_id), file, progress)
            .await
            .map_err(|e| self.report(e))
    }

    pub async fn remove_attachment(
        &self,
        ticket_id: i64,
        comment_id: i64,
        file_id: &str,
    ) -> Result<SuccessResponse, AppError> {
        self.api
            .delete(&endpoints::attachment(ticket_id, comment_id, file_id))
            .await
            .map_err(|e| self.report(e))
    }
}
