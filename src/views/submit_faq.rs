//! FAQ form: a new FAQ, a ticket copied into an FAQ, or an existing FAQ
//! being edited.

use super::forms::{self, FormErrors, FormStage};
use super::submit_ticket::field_values;
use super::ViewState;
use crate::context::AppContext;
use crate::models::{Attachment, CreatedIds, NewFaq, TicketField};
use crate::router::{NavigationState, Route};
use crate::services::{AttachmentWidget, Tracker};
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitFaqState {
    pub course_id: i64,
    /// Ticket the form was opened on, if any.
    pub ticket_id: Option<i64>,
    pub edit_existing: bool,
    /// Localized page title.
    pub page_title: String,
    pub title: String,
    pub question: String,
    pub answer: String,
    pub fields: Vec<TicketField>,
    /// Attachments of the answer comment that are kept.
    pub old_attachments: Vec<Attachment>,
    pub errors: FormErrors,
    pub error_message: Option<String>,
    pub stage: FormStage,
    pub is_loaded: bool,
}

pub struct SubmitFaqView {
    ctx: Arc<AppContext>,
    state: ViewState<SubmitFaqState>,
    attachments: AttachmentWidget,
    /// Comment carrying the answer of the FAQ being edited.
    answer_comment_id: Option<i64>,
    created: Mutex<Option<CreatedIds>>,
}

impl SubmitFaqView {
    /// Open the form. `navigation.edit_faq` edits the FAQ `ticket_id`
    /// instead of creating a new one from it.
    pub async fn open(
        ctx: Arc<AppContext>,
        course_id: i64,
        ticket_id: Option<i64>,
        navigation: &NavigationState,
    ) -> Self {
        let edit_existing = navigation.edit_faq && ticket_id.is_some();
        let mut state = SubmitFaqState {
            course_id,
            ticket_id,
            edit_existing,
            page_title: ctx.strings.get(if edit_existing { "faq.edit" } else { "faq.new" }),
            title: String::new(),
            question: String::new(),
            answer: String::new(),
            fields: Vec::new(),
            old_attachments: Vec::new(),
            errors: FormErrors::default(),
            error_message: None,
            stage: FormStage::Editing,
            is_loaded: false,
        };
        let mut answer_comment_id = None;

        match ticket_id {
            None => {
                state.fields = ctx
                    .courses
                    .get_ticket_field_info(course_id)
                    .await
                    .unwrap_or_default();
            }
            Some(id) => match ctx.tickets.get_ticket_info(id).await {
                Ok(ticket) => {
                    let answer_comment = ticket.answer_comment();
                    answer_comment_id = answer_comment.map(|c| c.id);
                    state.old_attachments = answer_comment
                        .map(|c| c.attachments.clone())
                        .unwrap_or_default();

                    state.answer = ticket
                        .proposed_answer()
                        .map(str::to_string)
                        .or_else(|| {
                            edit_existing
                                .then(|| answer_comment.map(|c| c.body.clone()))
                                .flatten()
                        })
                        .unwrap_or_default();
                    state.page_title = ticket.title.clone();
                    state.title = ticket.title.clone();
                    state.question = ticket.body.clone().unwrap_or_default();
                    state.fields = ticket.fields;
                }
                Err(_) => state.error_message = Some(ctx.strings.get("faq.show-failed")),
            },
        }
        state.is_loaded = true;

        Self {
            state: ViewState::new(state),
            attachments: ctx.attachment_widget(),
            answer_comment_id,
            created: Mutex::new(None),
            ctx,
        }
    }

    pub fn state(&self) -> SubmitFaqState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<SubmitFaqState> {
        self.state.subscribe()
    }

    pub fn attachments(&self) -> &AttachmentWidget {
        &self.attachments
    }

    pub fn set_title(&self, title: &str) {
        let title = title.to_string();
        self.state.update(|s| s.title = title);
    }

    pub fn set_question(&self, question: &str) {
        let question = question.to_string();
        self.state.update(|s| s.question = question);
    }

    pub fn set_answer(&self, answer: &str) {
        let answer = answer.to_string();
        self.state.update(|s| s.answer = answer);
    }

    pub fn set_field_value(&self, index: usize, value: &str) {
        let value = value.to_string();
        self.state.update(|s| {
            if let Some(field) = s.fields.get_mut(index) {
                field.value = value;
            }
        });
    }

    /// Drop an attachment of the existing answer. It is deleted on submit.
    pub fn remove_old_attachment(&self, index: usize) {
        let mut removed = None;
        self.state.update(|s| {
            if index < s.old_attachments.len() {
                removed = Some(s.old_attachments.remove(index));
            }
        });
        if let Some(attachment) = removed {
            self.attachments.mark_for_removal(attachment);
        }
    }

    /// FAQ fields are never mandatory, only length-limited.
    pub fn validate(&self) -> bool {
        let state = self.state.get();
        let strings = &self.ctx.strings;
        let mut errors = FormErrors::default();

        errors.check("title", forms::validate_title(&state.title), strings);
        errors.check("question", forms::validate_message(&state.question), strings);
        errors.check("answer", forms::validate_message(&state.answer), strings);
        for (i, field) in state.fields.iter().enumerate() {
            errors.check(
                &format!("field-{}", i),
                forms::max_length(&field.value, forms::MAX_FIELD_LENGTH),
                strings,
            );
        }

        let valid = errors.is_empty() && !self.attachments.has_error();
        self.state.update(|s| s.errors = errors);
        valid
    }

    pub async fn submit(&self) -> bool {
        if self.state.get().stage != FormStage::Editing || !self.validate() {
            return false;
        }
        let state = self.state.get();
        self.state.update(|s| {
            s.stage = FormStage::Sending;
            s.error_message = None;
        });

        let target = match self.send_faq(&state).await {
            Ok(target) => target,
            Err(key) => {
                self.fail(key);
                return false;
            }
        };

        if state.edit_existing {
            if let Some(ticket_id) = state.ticket_id {
                if self
                    .attachments
                    .remove_sent_files(&self.ctx.tickets, ticket_id)
                    .await
                    .is_err()
                {
                    self.fail("attachments.not-all-removed");
                    return false;
                }
            }
        }

        if self.attachments.upload_count() > 0 {
            let Some((ticket_id, comment_id)) = target else {
                self.fail("attachments.not-all-sent");
                return false;
            };
            if self
                .attachments
                .send_files(&self.ctx.tickets, ticket_id, comment_id)
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

    /// Send the FAQ itself. Returns the ticket and comment attachments go
    /// to, or the message key of the failure.
    async fn send_faq(&self, state: &SubmitFaqState) -> Result<Option<(i64, i64)>, &'static str> {
        let existing = *self.created.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(ids) = existing {
            return Ok(Some((ids.ticket_id, ids.comment_id)));
        }

        let faq = NewFaq {
            title: state.title.trim().to_string(),
            question: state.question.clone(),
            answer: state.answer.clone(),
            fields: field_values(&state.fields),
        };
        let (id, edit) = match (state.edit_existing, state.ticket_id) {
            (true, Some(ticket_id)) => (ticket_id, true),
            _ => (state.course_id, false),
        };

        let response = match self.ctx.tickets.add_faq(id, &faq, edit).await {
            Ok(response) => response,
            Err(_) => return Err("faq.send-failed"),
        };
        if !response.success {
            return Err("ticket.send-failed");
        }

        if edit {
            Ok(self.answer_comment_id.map(|comment_id| (id, comment_id)))
        } else {
            *self.created.lock().unwrap_or_else(|e| e.into_inner()) = response.created;
            Ok(response.created.map(|ids| (ids.ticket_id, ids.comment_id)))
        }
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
