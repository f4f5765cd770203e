//! Login form.

use super::forms::{self, FormErrors};
use super::{TaskSet, ViewState};
use crate::context::AppContext;
use crate::router::Route;
use crate::services::Tracker;
use serde::Serialize;
use std::sync::Arc;

/// Course shown after login when nothing else was requested.
const DEFAULT_COURSE_ID: i64 = 1;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoginViewState {
    pub course_id: Option<i64>,
    pub login_id: String,
    pub email: String,
    pub password: String,
    pub errors: FormErrors,
    /// Message of the last refused login.
    pub server_error_message: Option<String>,
    pub sending: bool,
}

pub struct LoginView {
    ctx: Arc<AppContext>,
    state: ViewState<LoginViewState>,
    tasks: TaskSet,
}

impl LoginView {
    pub fn open(ctx: Arc<AppContext>, course_id: Option<i64>, login_id: Option<String>) -> Self {
        if login_id.is_none() {
            log::error!("[login] no login id in the URL, login will be refused");
        }
        let view = Self {
            state: ViewState::new(LoginViewState {
                course_id,
                login_id: login_id.unwrap_or_default(),
                ..Default::default()
            }),
            tasks: TaskSet::default(),
            ctx,
        };
        view.track_error_messages();
        view.track_logged_in();
        view
    }

    pub fn state(&self) -> LoginViewState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<LoginViewState> {
        self.state.subscribe()
    }

    pub fn set_email(&self, email: &str) {
        let email = email.trim().to_string();
        self.state.update(|s| s.email = email);
    }

    pub fn set_password(&self, password: &str) {
        let password = password.to_string();
        self.state.update(|s| s.password = password);
    }

    pub fn validate(&self) -> bool {
        let state = self.state.get();
        let mut errors = FormErrors::default();
        errors.check("email", forms::validate_email(&state.email), &self.ctx.strings);
        errors.check("password", forms::validate_password(&state.password), &self.ctx.strings);
        let valid = errors.is_empty();
        self.state.update(|s| s.errors = errors);
        valid
    }

    /// Send the credentials. Navigation happens once the store reports the
    /// session as logged in.
    pub async fn login(&self) -> bool {
        if self.state.get().sending || !self.validate() {
            return false;
        }
        let state = self.state.get();
        self.state.update(|s| s.sending = true);

        let result = self
            .ctx
            .auth
            .login(&state.email, &state.password, &state.login_id)
            .await;
        self.state.update(|s| s.sending = false);
        result.is_ok()
    }

    pub fn destroy(&self) {
        self.tasks.abort_all();
    }

    fn track_error_messages(&self) {
        let state = self.state.clone();
        let mut messages = self.ctx.auth.track_error_messages();
        self.tasks.push(tokio::spawn(async move {
            while let Some(message) = messages.next().await {
                state.update(|s| s.server_error_message = message);
            }
        }));
    }

    /// On login, go to the saved redirect target or the course list.
    fn track_logged_in(&self) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let mut logged_in = ctx.store.track_logged_in();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = logged_in.next().await {
                if value != Some(true) {
                    continue;
                }
                let redirect = ctx.auth.take_redirect_url().await.unwrap_or_else(|e| {
                    log::warn!("[login] could not read redirect url: {}", e);
                    None
                });
                let route = redirect.unwrap_or_else(|| Route::ListTickets {
                    course_id: state.get().course_id.unwrap_or(DEFAULT_COURSE_ID),
                });
                ctx.navigator.navigate_to(route);
                break;
            }
        }));
    }
}

impl Drop for LoginView {
    fn drop(&mut self) {
        self.destroy();
    }
}
