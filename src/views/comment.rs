//! Editor for one existing comment of a ticket.
//!
//! The editor reports its progress to the surrounding ticket view through
//! [`CommentEvent`]s, so the view can e.g. pause polling while a comment is
//! being edited.

use super::forms::{self, FormErrors};
use super::ViewState;
use crate::context::AppContext;
use crate::models::{Attachment, Comment, TicketState};
use crate::services::{AttachmentWidget, Tracker};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Progress notifications for the view hosting the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommentEvent {
    /// The user changed the comment for the first time.
    EditingComment,
    SendingFiles,
    /// Sending failed; the form is editable again.
    Continue,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum EditorStage {
    #[default]
    Editing,
    Sending,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentEditorState {
    pub comment: Comment,
    /// Whether the edit form is open.
    pub editing: bool,
    pub message: String,
    pub comment_state: Option<TicketState>,
    /// Attachments of the comment still shown; removed ones are deleted on send.
    pub attachments: Vec<Attachment>,
    pub errors: FormErrors,
    pub error_message: Option<String>,
    pub stage: EditorStage,
    pub remove_pressed: bool,
    pub can_edit: bool,
    /// Localized label shown next to the author's name.
    pub sender_title: String,
}

pub struct CommentEditor {
    ctx: Arc<AppContext>,
    course_id: i64,
    ticket_id: i64,
    state: ViewState<CommentEditorState>,
    attachments: AttachmentWidget,
    events: broadcast::Sender<CommentEvent>,
    dirty: AtomicBool,
}

impl CommentEditor {
    pub fn new(ctx: Arc<AppContext>, course_id: i64, ticket_id: i64, comment: Comment) -> Self {
        let user = ctx.store.user_info();
        let can_edit = comment.can_edit(user.as_ref());
        let sender_title = sender_title(&ctx, &comment);
        let (events, _) = broadcast::channel(16);

        Self {
            state: ViewState::new(CommentEditorState {
                editing: false,
                message: String::new(),
                comment_state: comment.state,
                attachments: comment.attachments.clone(),
                errors: FormErrors::default(),
                error_message: None,
                stage: EditorStage::Editing,
                remove_pressed: false,
                can_edit,
                sender_title,
                comment,
            }),
            attachments: ctx.attachment_widget(),
            course_id,
            ticket_id,
            events,
            dirty: AtomicBool::new(false),
            ctx,
        }
    }

    pub fn state(&self) -> CommentEditorState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<CommentEditorState> {
        self.state.subscribe()
    }

    pub fn track_events(&self) -> broadcast::Receiver<CommentEvent> {
        self.events.subscribe()
    }

    pub fn attachments(&self) -> &AttachmentWidget {
        &self.attachments
    }

    /// Open the edit form prefilled with the comment. Returns false when the
    /// signed-in user may not edit it.
    pub fn start_editing(&self) -> bool {
        let state = self.state.get();
        if !state.can_edit {
            return false;
        }
        self.dirty.store(false, Ordering::SeqCst);
        self.state.update(|s| {
            s.editing = true;
            s.stage = EditorStage::Editing;
            s.message = s.comment.body.clone();
            s.comment_state = s.comment.state;
            s.attachments = s.comment.attachments.clone();
            s.error_message = None;
        });
        true
    }

    pub fn set_message(&self, message: &str) {
        self.mark_dirty();
        let message = message.to_string();
        self.state.update(|s| s.message = message);
    }

    pub fn set_comment_state(&self, comment_state: Option<TicketState>) {
        self.mark_dirty();
        self.state.update(|s| s.comment_state = comment_state);
    }

    /// Drop an already sent attachment; it is deleted when the edit is sent.
    pub fn remove_old_attachment(&self, file_id: &str) {
        let mut removed = None;
        self.state.update(|s| {
            if let Some(pos) = s.attachments.iter().position(|a| a.file_id == file_id) {
                removed = Some(s.attachments.remove(pos));
            }
        });
        if let Some(attachment) = removed {
            self.mark_dirty();
            self.attachments.mark_for_removal(attachment);
        }
    }

    pub fn press_remove(&self) {
        self.state.update(|s| s.remove_pressed = true);
    }

    /// Send the edited comment, then apply the attachment changes.
    pub async fn send_comment(&self) -> bool {
        let state = self.state.get();
        if !state.editing || state.stage == EditorStage::Sending {
            return false;
        }

        let mut errors = FormErrors::default();
        errors.check("message", forms::validate_message(&state.message), &self.ctx.strings);
        let valid = errors.is_empty() && !self.attachments.has_error();
        self.state.update(|s| s.errors = errors);
        if !valid {
            return false;
        }

        self.state.update(|s| {
            s.stage = EditorStage::Sending;
            s.error_message = None;
        });

        let comment_id = state.comment.id;
        if self
            .ctx
            .tickets
            .edit_comment(
                self.ticket_id,
                comment_id,
                &state.message,
                state.comment_state,
                self.course_id,
            )
            .await
            .is_err()
        {
            self.fail("comment.edit-failed");
            return false;
        }

        if !self.attachments.pending_removals().is_empty()
            && self
                .attachments
                .remove_sent_files(&self.ctx.tickets, self.ticket_id)
                .await
                .is_err()
        {
            // The edit itself went through; report and carry on with uploads.
            let message = self.ctx.strings.get("attachments.not-all-removed");
            self.state.update(|s| s.error_message = Some(message));
        }

        if self.attachments.upload_count() == 0 {
            self.stop_editing();
            return true;
        }

        self.emit(CommentEvent::SendingFiles);
        if self
            .attachments
            .send_files(&self.ctx.tickets, self.ticket_id, comment_id)
            .await
            .is_err()
        {
            self.fail("attachments.not-all-sent");
            return false;
        }

        self.stop_editing();
        true
    }

    pub async fn remove_comment(&self) -> bool {
        let comment_id = self.state.get().comment.id;
        match self
            .ctx
            .tickets
            .remove_comment(self.ticket_id, comment_id, self.course_id)
            .await
        {
            Ok(_) => {
                self.stop_editing();
                true
            }
            Err(_) => {
                let message = self.ctx.strings.get("comment.remove-failed");
                self.state.update(|s| {
                    s.stage = EditorStage::Editing;
                    s.remove_pressed = false;
                    s.error_message = Some(message);
                });
                false
            }
        }
    }

    pub fn stop_editing(&self) {
        self.attachments.clear();
        self.state.update(|s| {
            s.stage = EditorStage::Done;
            s.editing = false;
            s.remove_pressed = false;
        });
        self.emit(CommentEvent::Done);
    }

    fn fail(&self, key: &str) {
        let message = self.ctx.strings.get(key);
        self.state.update(|s| {
            s.stage = EditorStage::Editing;
            s.error_message = Some(message);
        });
        self.emit(CommentEvent::Continue);
    }

    /// The first change of an open form is announced once.
    fn mark_dirty(&self) {
        if self.state.get().editing && !self.dirty.swap(true, Ordering::SeqCst) {
            self.emit(CommentEvent::EditingComment);
        }
    }

    fn emit(&self, event: CommentEvent) {
        let _ = self.events.send(event);
    }
}

fn sender_title(ctx: &AppContext, comment: &Comment) -> String {
    let Some(author) = comment.author.as_ref() else {
        return String::new();
    };
    if ctx.store.user_info().is_some_and(|u| u.id == author.id) {
        return ctx.strings.get("role.me");
    }
    author
        .role
        .map(|role| ctx.strings.get(role.label_key()))
        .unwrap_or_default()
}
