//! Course front page: the FAQ list with login and participation banners.

use super::{TaskSet, ViewError, ViewState};
use crate::context::AppContext;
use crate::db::storage::{IN_IFRAME_KEY, NO_DATA_CONSENT_KEY};
use crate::db::StorageScope;
use crate::models::{Ticket, User};
use crate::router::Route;
use crate::services::{PollHandle, Poller, StoreMessage};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingState {
    pub course_id: Option<i64>,
    pub course_name: String,
    pub faqs: Vec<Ticket>,
    /// Lowercased, trimmed title filter.
    pub filter: String,
    pub is_loaded: bool,
    pub is_participant: Option<bool>,
    pub error: Option<ViewError>,
    /// Set when the route carries no usable course id.
    pub error_message: Option<String>,
    pub no_data_consent: bool,
    pub in_iframe: bool,
    /// Offset to scroll back to once the list has loaded.
    pub restore_position: Option<f64>,
    pub user: Option<User>,
}

impl ListingState {
    /// FAQs matching the current filter.
    pub fn visible_faqs(&self) -> Vec<&Ticket> {
        self.faqs
            .iter()
            .filter(|t| t.matches_filter(&self.filter))
            .collect()
    }
}

pub struct ListingView {
    ctx: Arc<AppContext>,
    state: ViewState<ListingState>,
    url: String,
    poll: Mutex<Option<PollHandle>>,
    /// Set once this view checked the enrolment for its own course. The
    /// store's participant flag may still describe the previous course.
    participation_checked: Arc<AtomicBool>,
    tasks: TaskSet,
}

impl ListingView {
    /// Open the list for `route` and start polling its FAQs.
    pub async fn open(ctx: Arc<AppContext>, route: &Route) -> Self {
        let storage = &ctx.storage;
        let no_data_consent = storage
            .get_flag(StorageScope::Local, NO_DATA_CONSENT_KEY)
            .await
            .unwrap_or(false);
        let in_iframe = storage
            .get_flag(StorageScope::Session, IN_IFRAME_KEY)
            .await
            .unwrap_or(false);

        let view = Self {
            state: ViewState::new(ListingState {
                course_id: route.course_id(),
                no_data_consent,
                in_iframe,
                ..Default::default()
            }),
            url: route.to_url(),
            poll: Mutex::new(None),
            participation_checked: Arc::new(AtomicBool::new(false)),
            tasks: TaskSet::default(),
            ctx,
        };

        let Some(course_id) = route.course_id() else {
            let message = view.ctx.strings.get("list.missing-course");
            view.state.update(|s| {
                s.error_message = Some(message);
                s.is_loaded = true;
            });
            return view;
        };

        view.show_course_name(course_id);
        view.start_polling(course_id);
        view.track_user_info();
        view.track_logged_in(course_id);
        view.track_participant();
        view.track_messages();
        view
    }

    pub fn state(&self) -> ListingState {
        self.state.get()
    }

    pub fn subscribe(&self) -> crate::services::Tracker<ListingState> {
        self.state.subscribe()
    }

    pub fn apply_filter(&self, text: &str) {
        let filter = text.trim().to_lowercase();
        self.state.update(|s| s.filter = filter);
    }

    pub fn on_scroll(&self, position: f64) {
        self.ctx.store.set_position(&self.url, position);
    }

    /// Leaving for the submit form: stop polling, and when logged out
    /// remember the form so login can return to it.
    pub async fn save_redirect_url(&self) {
        self.stop_polling();
        let Some(course_id) = self.state.get().course_id else {
            return;
        };
        if self.ctx.store.is_logged_in() == Some(false) {
            let route = Route::SubmitTicket { course_id };
            if let Err(e) = self.ctx.auth.save_redirect_url(&route).await {
                log::warn!("[list] could not save redirect url: {}", e);
            }
        }
    }

    pub async fn give_consent(&self) {
        if let Err(e) = self
            .ctx
            .storage
            .remove_item(StorageScope::Local, NO_DATA_CONSENT_KEY)
            .await
        {
            log::warn!("[list] could not store consent: {}", e);
            return;
        }
        self.state.update(|s| s.no_data_consent = false);
    }

    /// Button of the error banner.
    pub async fn error_click(&self) {
        let state = self.state.get();
        if state.no_data_consent && state.in_iframe {
            self.give_consent().await;
        } else if !state.no_data_consent && !state.in_iframe {
            if let Some(course_id) = state.course_id {
                self.ctx.auth.navigate_to_login(course_id);
            }
        }
    }

    pub fn stop_polling(&self) {
        if let Some(poll) = self.poll.lock().unwrap_or_else(|e| e.into_inner()).take() {
            poll.stop();
        }
    }

    pub fn destroy(&self) {
        self.stop_polling();
        self.tasks.abort_all();
    }

    fn show_course_name(&self, course_id: i64) {
        let courses = self.ctx.courses.clone();
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            let name = courses.get_course_name(course_id).await.unwrap_or_default();
            state.update(|s| s.course_name = name);
        }));
    }

    fn start_polling(&self, course_id: i64) {
        let tickets = self.ctx.tickets.clone();
        let store = self.ctx.store.clone();
        let state = self.state.clone();
        let url = self.url.clone();

        let restored = AtomicBool::new(false);

        log::debug!("[poll] start FAQ polling for course {}", course_id);
        let handle = Poller::start(
            self.ctx.config.polling_interval(),
            move || {
                let tickets = tickets.clone();
                async move { tickets.get_faq(course_id).await }
            },
            move |result| {
                let first_load = !restored.swap(true, Ordering::SeqCst);
                state.update(|s| {
                    s.is_loaded = true;
                    if let Ok(faqs) = result {
                        s.faqs = faqs;
                    }
                    if first_load {
                        let position = store.position(&url);
                        s.restore_position = (position != 0.0).then_some(position);
                    }
                });
            },
        );
        *self.poll.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
    }

    fn track_user_info(&self) {
        let mut users = self.ctx.store.track_user_info();
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            while let Some(user) = users.next().await {
                if user.is_some() {
                    state.update(|s| s.user = user);
                }
            }
        }));
    }

    fn track_logged_in(&self, course_id: i64) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let checked = self.participation_checked.clone();
        let mut logged_in = ctx.store.track_logged_in();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = logged_in.next().await {
                match value {
                    Some(false) => {
                        log::debug!("[list] not logged in");
                        let current = state.get();
                        let button_key = if current.no_data_consent {
                            Some("button.create-account")
                        } else if !current.in_iframe {
                            Some("button.login")
                        } else {
                            None
                        };
                        let error = ViewError {
                            title: ctx.strings.get("list.not-logged-in.title"),
                            message: ctx.strings.get("list.not-logged-in.message"),
                            button_text: button_key.map(|k| ctx.strings.get(k)).unwrap_or_default(),
                        };
                        state.update(|s| {
                            s.is_loaded = true;
                            s.error = Some(error);
                        });
                    }
                    Some(true) => {
                        state.update(|s| s.error = None);
                        if let Ok(courses) = ctx.courses.get_my_courses().await {
                            let enrolled = courses.iter().any(|c| c.course_id == course_id);
                            ctx.store.set_participant(enrolled);
                            // The store drops a write that does not change the flag.
                            show_participation(&ctx, &state, enrolled);
                            checked.store(true, Ordering::SeqCst);
                        }
                    }
                    None => {}
                }
            }
        }));
    }

    /// Later participation changes, once this course has been checked.
    fn track_participant(&self) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let checked = self.participation_checked.clone();
        let mut participant = ctx.store.track_participant();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = participant.next().await {
                if !checked.load(Ordering::SeqCst) {
                    continue;
                }
                if let Some(enrolled) = value {
                    show_participation(&ctx, &state, enrolled);
                }
            }
        }));
    }

    /// A refresh broadcast (logo click) fetches the list immediately.
    fn track_messages(&self) {
        let Some(trigger) = self
            .poll
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|p| p.trigger())
        else {
            return;
        };
        let mut messages = self.ctx.store.track_messages();
        let state = self.state.clone();
        self.tasks.push(tokio::spawn(async move {
            loop {
                match messages.recv().await {
                    Ok(StoreMessage::Refresh) => {
                        log::debug!("[list] refresh requested");
                        state.update(|s| s.is_loaded = false);
                        if !trigger.refresh() {
                            break;
                        }
                    }
                    Ok(StoreMessage::Text(_)) | Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
}

fn show_participation(ctx: &AppContext, state: &ViewState<ListingState>, enrolled: bool) {
    if enrolled {
        state.update(|s| {
            s.is_participant = Some(true);
            s.error = None;
        });
        return;
    }
    let error = ViewError {
        title: ctx.strings.get("list.not-participant.title"),
        message: ctx.strings.get("list.not-participant.message"),
        button_text: String::new(),
    };
    state.update(|s| {
        s.is_participant = Some(false);
        s.error = Some(error);
    });
}

impl Drop for ListingView {
    fn drop(&mut self) {
        self.destroy();
    }
}
