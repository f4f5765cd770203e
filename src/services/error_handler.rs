//! Shared handler for failed backend requests.
//!
//! Every resource service passes its errors through [`ErrorHandler::report`]
//! before returning them, so logging, the session state and the error banner
//! stay consistent no matter which view made the call.

use crate::error::AppError;
use crate::services::localization::Localizer;
use crate::services::store::Store;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

const NOTIFICATION_CAPACITY: usize = 16;

/// Error banner shown by the embedding shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorNotification {
    pub title: String,
    pub message: String,
    pub button_text: String,
}

pub struct ErrorHandler {
    store: Arc<Store>,
    strings: Arc<Localizer>,
    notifications: broadcast::Sender<ErrorNotification>,
}

impl ErrorHandler {
    pub fn new(store: Arc<Store>, strings: Arc<Localizer>) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);
        Self {
            store,
            strings,
            notifications,
        }
    }

    /// Log the error, update the session and publish a banner. Returns the
    /// error so callers can propagate it with `map_err`.
    pub fn report(&self, err: AppError) -> AppError {
        if err.is_not_logged_in() {
            log::info!("[api] not logged in: {}", err);
            self.store.set_logged_out();
        } else {
            log::error!("[api] request failed: {}", err);
        }

        let _ = self.notifications.send(self.notification_for(&err));
        err
    }

    /// The banner shown for `err`.
    pub fn notification_for(&self, err: &AppError) -> ErrorNotification {
        let message_key = if err.is_not_logged_in() {
            "error.not-logged-in"
        } else if err.is_permission_denied() {
            "error.no-permission"
        } else {
            match err {
                AppError::Network { .. } => "error.network",
                _ => "error.server",
            }
        };

        ErrorNotification {
            title: self.strings.get("error.title"),
            message: self.strings.get(message_key),
            button_text: self.strings.get("button.close"),
        }
    }

    pub fn track_notifications(&self) -> broadcast::Receiver<ErrorNotification> {
        self.notifications.subscribe()
    }
}
