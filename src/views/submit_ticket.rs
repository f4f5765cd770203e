//! New ticket form.

use super::forms::{self, FormErrors, FormStage};
use super::ViewState;
use crate::context::AppContext;
use crate::models::{CreatedIds, FieldValue, NewTicket, TicketField};
use crate::router::Route;
use crate::services::{AttachmentWidget, Tracker};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitTicketState {
    pub course_id: i64,
    pub title: String,
    pub message: String,
    /// The course's additional fields with the values typed so far.
    pub fields: Vec<TicketField>,
    pub errors: FormErrors,
    pub error_message: Option<String>,
    pub stage: FormStage,
}

pub struct SubmitTicketView {
    ctx: Arc<AppContext>,
    state: ViewState<SubmitTicketState>,
    attachments: AttachmentWidget,
    /// Ids of a ticket already created whose attachments still need sending.
    created: Mutex<Option<CreatedIds>>,
}

impl SubmitTicketView {
    /// Open the form and load the course's additional fields.
    pub async fn open(ctx: Arc<AppContext>, course_id: i64) -> Self {
        let fields = ctx
            .courses
            .get_ticket_field_info(course_id)
            .await
            .unwrap_or_default();

        Self {
            state: ViewState::new(SubmitTicketState {
                course_id,
                title: String::new(),
                message: String::new(),
                fields,
                errors: FormErrors::default(),
                error_message: None,
                stage: FormStage::Editing,
            }),
            attachments: ctx.attachment_widget(),
            created: Mutex::new(None),
            ctx,
        }
    }

    pub fn state(&self) -> SubmitTicketState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<SubmitTicketState> {
        self.state.subscribe()
    }

    pub fn attachments(&self) -> &AttachmentWidget {
        &self.attachments
    }

    pub fn set_title(&self, title: &str) {
        let title = title.to_string();
        self.state.update(|s| s.title = title);
    }

    pub fn set_message(&self, message: &str) {
        let message = message.to_string();
        self.state.update(|s| s.message = message);
    }

    pub fn set_field_value(&self, index: usize, value: &str) {
        let value = value.to_string();
        self.state.update(|s| {
            if let Some(field) = s.fields.get_mut(index) {
                field.value = value;
            }
        });
    }

    /// Validate every input and publish the errors. Returns whether the
    /// form can be sent.
    pub fn validate(&self) -> bool {
        let state = self.state.get();
        let strings = &self.ctx.strings;
        let mut errors = FormErrors::default();

        errors.check("title", forms::validate_title(&state.title), strings);
        errors.check("message", forms::validate_message(&state.message), strings);
        for (i, field) in state.fields.iter().enumerate() {
            errors.check(
                &format!("field-{}", i),
                forms::validate_field(field, &field.value),
                strings,
            );
        }

        let valid = errors.is_empty() && !self.attachments.has_error();
        self.state.update(|s| s.errors = errors);
        valid
    }

    /// Send the ticket, then its attachments, and return to the list.
    ///
    /// If only the attachments fail, the created ticket is remembered and
    /// the next call retries just the files that were not sent.
    pub async fn send_ticket(&self) -> bool {
        if self.state.get().stage != FormStage::Editing || !self.validate() {
            return false;
        }
        let state = self.state.get();
        self.state.update(|s| {
            s.stage = FormStage::Sending;
            s.error_message = None;
        });

        let existing = *self.created.lock().unwrap_or_else(|e| e.into_inner());
        let created = match existing {
            Some(ids) => Some(ids),
            None => {
                let ticket = NewTicket {
                    title: state.title.trim().to_string(),
                    message: state.message.clone(),
                    fields: field_values(&state.fields),
                };
                match self.ctx.tickets.add_ticket(state.course_id, &ticket).await {
                    Ok(response) if response.success => {
                        *self.created.lock().unwrap_or_else(|e| e.into_inner()) = response.created;
                        response.created
                    }
                    Ok(_) | Err(_) => {
                        self.fail("ticket.send-failed");
                        return false;
                    }
                }
            }
        };

        if self.attachments.upload_count() > 0 {
            let Some(ids) = created else {
                self.fail("attachments.not-all-sent");
                return false;
            };
            if self
                .attachments
                .send_files(&self.ctx.tickets, ids.ticket_id, ids.comment_id)
                .await
                .is_err()
            {
                self.fail("attachments.not-all-sent");
                return false;
            }
        }

        self.state.update(|s| s.stage = FormStage::Done);
        self.go_back();
        true
    }

    pub fn go_back(&self) {
        let course_id = self.state.get().course_id;
        self.ctx
            .navigator
            .navigate_to(Route::ListTickets { course_id });
    }

    pub fn destroy(&self) {
        self.attachments.clear();
    }

    fn fail(&self, key: &str) {
        let message = self.ctx.strings.get(key);
        self.state.update(|s| {
            s.stage = FormStage::Editing;
            s.error_message = Some(message);
        });
    }
}

/// Values of the template fields the backend knows by id.
pub(crate) fn field_values(fields: &[TicketField]) -> Vec<FieldValue> {
    fields
        .iter()
        .filter_map(|f| {
            f.id.map(|id| FieldValue {
                id,
                value: f.value.clone(),
            })
        })
        .collect()
}
