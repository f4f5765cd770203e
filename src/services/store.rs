//! Session and notification store.
//!
//! Holds the state every view needs regardless of where it sits in the
//! route tree: the signed-in user, login and participant flags, a message
//! bus between views, scroll positions, and the busy indicator.
//!
//! Each tracked value replays its latest state to a new subscriber and then
//! delivers changes in emission order. Writes that do not change the value
//! are dropped, so subscribers never re-render for nothing.

use crate::models::{Role, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};

/// Capacity of the message bus. Slow subscribers lose the oldest messages.
const MESSAGE_CAPACITY: usize = 64;

/// Message broadcast between views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreMessage {
    /// Go back to the start: list views re-fetch immediately.
    Refresh,
    /// Free-form message.
    Text(String),
}

/// Subscription to a tracked value.
///
/// The first `next()` yields the value current at subscription time.
pub struct Tracker<T> {
    rx: watch::Receiver<T>,
    replayed: bool,
}

impl<T: Clone> Tracker<T> {
    pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
        Self {
            rx,
            replayed: false,
        }
    }

    /// Latest value without consuming a notification.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait for the next value; `None` once the store is gone.
    pub async fn next(&mut self) -> Option<T> {
        if !self.replayed {
            self.replayed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Take a pending value without waiting.
    pub fn try_next(&mut self) -> Option<T> {
        if !self.replayed {
            self.replayed = true;
            return Some(self.rx.borrow_and_update().clone());
        }
        if self.rx.has_changed().unwrap_or(false) {
            Some(self.rx.borrow_and_update().clone())
        } else {
            None
        }
    }
}

/// Store shared by all views of one application session.
pub struct Store {
    user: watch::Sender<Option<User>>,
    logged_in: watch::Sender<Option<bool>>,
    participant: watch::Sender<Option<bool>>,
    loading: Arc<watch::Sender<bool>>,
    loading_seq: Arc<AtomicU64>,
    messages: broadcast::Sender<StoreMessage>,
    positions: Mutex<HashMap<String, f64>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        let (messages, _) = broadcast::channel(MESSAGE_CAPACITY);
        Self {
            user: watch::channel(None).0,
            logged_in: watch::channel(None).0,
            participant: watch::channel(None).0,
            loading: Arc::new(watch::channel(false).0),
            loading_seq: Arc::new(AtomicU64::new(0)),
            messages,
            positions: Mutex::new(HashMap::new()),
        }
    }

    // --- user ---

    pub fn user_info(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    pub fn user_role(&self) -> Option<Role> {
        self.user.borrow().as_ref().and_then(|u| u.role)
    }

    pub fn user_name(&self) -> Option<String> {
        self.user.borrow().as_ref().map(|u| u.name.clone())
    }

    /// Replace the current user. Writing the same user again is a no-op.
    pub fn set_user_info(&self, user: Option<User>) {
        self.user.send_if_modified(|current| {
            if *current == user {
                false
            } else {
                *current = user;
                true
            }
        });
    }

    pub fn track_user_info(&self) -> Tracker<Option<User>> {
        Tracker::new(self.user.subscribe())
    }

    // --- login ---

    /// Tri-state login flag: `None` until the first check completes.
    pub fn is_logged_in(&self) -> Option<bool> {
        *self.logged_in.borrow()
    }

    pub fn set_logged_in(&self) {
        if set_flag(&self.logged_in, true) {
            log::debug!("[store] logged in");
        }
    }

    /// Mark the session logged out and forget the user.
    pub fn set_logged_out(&self) {
        if set_flag(&self.logged_in, false) {
            log::debug!("[store] logged out");
        }
        self.set_user_info(None);
    }

    pub fn track_logged_in(&self) -> Tracker<Option<bool>> {
        Tracker::new(self.logged_in.subscribe())
    }

    // --- participant ---

    pub fn is_participant(&self) -> Option<bool> {
        *self.participant.borrow()
    }

    pub fn set_participant(&self, participant: bool) {
        set_flag(&self.participant, participant);
    }

    pub fn track_participant(&self) -> Tracker<Option<bool>> {
        Tracker::new(self.participant.subscribe())
    }

    // --- messages ---

    /// Broadcast a message to every current subscriber. Nobody listening is
    /// not an error.
    pub fn send_message(&self, message: StoreMessage) {
        let _ = self.messages.send(message);
    }

    /// Subscribe to messages sent from now on.
    pub fn track_messages(&self) -> broadcast::Receiver<StoreMessage> {
        self.messages.subscribe()
    }

    // --- scroll positions ---

    pub fn set_position(&self, url: &str, position: f64) {
        self.positions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.to_string(), position);
    }

    /// Last stored offset for `url`, 0 when untracked.
    pub fn position(&self, url: &str) -> f64 {
        self.positions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .copied()
            .unwrap_or(0.0)
    }

    // --- loading ---

    pub fn start_loading(&self) {
        self.set_loading_deferred(true);
    }

    pub fn stop_loading(&self) {
        self.set_loading_deferred(false);
    }

    pub fn is_loading(&self) -> bool {
        *self.loading.borrow()
    }

    pub fn track_loading(&self) -> Tracker<bool> {
        Tracker::new(self.loading.subscribe())
    }

    /// The write lands one scheduler tick later so a view that toggles the
    /// indicator while rendering never sees it change mid-render. Of several
    /// pending writes only the latest lands.
    fn set_loading_deferred(&self, value: bool) {
        let seq = self.loading_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            self.loading.send_if_modified(|v| replace_if_changed(v, value));
            return;
        };

        let loading = self.loading.clone();
        let latest = self.loading_seq.clone();
        handle.spawn(async move {
            tokio::task::yield_now().await;
            if latest.load(Ordering::SeqCst) == seq {
                loading.send_if_modified(|v| replace_if_changed(v, value));
            }
        });
    }
}

/// Idempotent tri-state write. Returns whether subscribers were notified.
fn set_flag(flag: &watch::Sender<Option<bool>>, value: bool) -> bool {
    flag.send_if_modified(|current| replace_if_changed(current, Some(value)))
}

fn replace_if_changed<T: PartialEq>(current: &mut T, value: T) -> bool {
    if *current == value {
        false
    } else {
        *current = value;
        true
    }
}
