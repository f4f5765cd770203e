//! View models, one per route.
//!
//! A view owns its state in a [`ViewState`], which the embedding shell reads
//! or subscribes to for rendering. Public methods never return errors: a
//! failure is written into the view's state and the form stays editable.
//! `destroy()` releases the view's subscriptions and timers; nothing a view
//! started may touch its state afterwards.

pub mod app_shell;
pub mod comment;
pub mod faq_view;
pub mod forms;
pub mod join;
pub mod listing;
pub mod login;
pub mod submit_faq;
pub mod submit_ticket;

pub use app_shell::{AppShell, ShellPage, ShellState};
pub use comment::{CommentEditor, CommentEditorState, CommentEvent, EditorStage};
pub use faq_view::{FaqView, FaqViewState};
pub use join::{JoinStage, JoinView, JoinViewState};
pub use listing::{ListingState, ListingView};
pub use login::{LoginView, LoginViewState};
pub use submit_faq::{SubmitFaqState, SubmitFaqView};
pub use submit_ticket::{SubmitTicketState, SubmitTicketView};

use crate::services::Tracker;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Error banner shown inside a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewError {
    pub title: String,
    pub message: String,
    /// Empty when the banner has no button.
    pub button_text: String,
}

/// Observable state of one view.
pub struct ViewState<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for ViewState<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> ViewState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            tx: Arc::new(watch::channel(initial).0),
        }
    }

    /// Snapshot of the current state.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn update(&self, change: impl FnOnce(&mut T)) {
        self.tx.send_modify(change);
    }

    pub fn subscribe(&self) -> Tracker<T> {
        Tracker::new(self.tx.subscribe())
    }
}

/// Background tasks a view spawned; aborted together on destroy.
#[derive(Default)]
pub(crate) struct TaskSet {
    tasks: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl TaskSet {
    pub(crate) fn push(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        tasks.retain(|t| !t.is_finished());
        tasks.push(task);
    }

    pub(crate) fn abort_all(&self) {
        for task in self.tasks.lock().unwrap_or_else(|e| e.into_inner()).drain(..) {
            task.abort();
        }
    }
}

impl Drop for TaskSet {
    fn drop(&mut self) {
        self.abort_all();
    }
}
