//! Application frame around the routed views: header, language switch and
//! login button.

use super::{TaskSet, ViewState};
use crate::context::AppContext;
use crate::db::storage::{IN_IFRAME_KEY, LANGUAGE_KEY};
use crate::db::StorageScope;
use crate::models::User;
use crate::router::Route;
use crate::services::{Language, StoreMessage, Tracker};
use serde::Serialize;
use std::sync::Arc;

/// Header pages reachable from the user menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellPage {
    Profile,
    Settings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShellState {
    pub course_id: Option<i64>,
    pub in_iframe: bool,
    pub language: String,
    pub is_logged_in: bool,
    pub login_button_text: String,
    pub is_loading: bool,
    pub is_participant: Option<bool>,
    pub user: Option<User>,
}

pub struct AppShell {
    ctx: Arc<AppContext>,
    state: ViewState<ShellState>,
    tasks: TaskSet,
}

impl AppShell {
    /// Start the shell: record whether the application runs in a frame and
    /// ask the backend for the current session.
    pub async fn open(ctx: Arc<AppContext>, in_iframe: bool) -> Self {
        if ctx.config.is_production() {
            log::info!("[app] production build");
        }
        if let Err(e) = ctx
            .storage
            .set_item(StorageScope::Session, IN_IFRAME_KEY, &in_iframe.to_string())
            .await
        {
            log::warn!("[app] could not store frame flag: {}", e);
        }
        log::info!("[app] embedded in a frame: {}", in_iframe);

        let shell = Self {
            state: ViewState::new(ShellState {
                course_id: None,
                in_iframe,
                language: ctx.strings.language().code().to_string(),
                is_logged_in: false,
                login_button_text: ctx.strings.get("login.login"),
                is_loading: ctx.store.is_loading(),
                is_participant: ctx.store.is_participant(),
                user: ctx.store.user_info(),
            }),
            tasks: TaskSet::default(),
            ctx,
        };
        shell.track_login_status();
        shell.track_store();

        if let Err(e) = shell.ctx.auth.initialize().await {
            log::warn!("[app] session check failed: {}", e);
        }
        shell
    }

    pub fn state(&self) -> ShellState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<ShellState> {
        self.state.subscribe()
    }

    /// Follow the course of the routed view.
    pub fn set_route(&self, route: &Route) {
        if let Some(course_id) = route.course_id() {
            self.state.update(|s| s.course_id = Some(course_id));
        }
    }

    /// Switch between Finnish and English and remember the choice.
    pub async fn toggle_language(&self) {
        let language = self.ctx.strings.language().other();
        self.set_language(language).await;
    }

    pub async fn set_language(&self, language: Language) {
        if language == self.ctx.strings.language() {
            return;
        }
        if let Err(e) = self.ctx.storage.set_local(LANGUAGE_KEY, language.code()).await {
            log::warn!("[app] could not store language: {}", e);
        }
        self.ctx.strings.set_language(language);

        let logged_in = self.state.get().is_logged_in;
        let label = self.login_label(logged_in);
        self.state.update(|s| {
            s.language = language.code().to_string();
            s.login_button_text = label;
        });
    }

    /// The logo takes the user back to the start of the list.
    pub fn logo_clicked(&self) {
        self.ctx.store.send_message(StoreMessage::Refresh);
    }

    pub fn go_to(&self, page: ShellPage) {
        let Some(course_id) = self.state.get().course_id else {
            log::warn!("[app] no course to open {:?} for", page);
            return;
        };
        let route = match page {
            ShellPage::Profile => Route::Profile { course_id },
            ShellPage::Settings => Route::Settings { course_id },
        };
        self.ctx.navigator.navigate_to(route);
    }

    pub fn destroy(&self) {
        self.tasks.abort_all();
    }

    fn login_label(&self, logged_in: bool) -> String {
        self.ctx
            .strings
            .get(if logged_in { "login.logout" } else { "login.login" })
    }

    fn track_login_status(&self) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let mut logged_in = ctx.store.track_logged_in();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = logged_in.next().await {
                let is_logged_in = value == Some(true);
                let label = ctx
                    .strings
                    .get(if is_logged_in { "login.logout" } else { "login.login" });
                state.update(|s| {
                    s.is_logged_in = is_logged_in;
                    s.login_button_text = label;
                });
            }
        }));
    }

    fn track_store(&self) {
        let store = self.ctx.store.clone();
        let state = self.state.clone();
        let mut loading = store.track_loading();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = loading.next().await {
                state.update(|s| s.is_loading = value);
            }
        }));

        let state = self.state.clone();
        let mut users = store.track_user_info();
        self.tasks.push(tokio::spawn(async move {
            while let Some(user) = users.next().await {
                state.update(|s| s.user = user);
            }
        }));

        let state = self.state.clone();
        let mut participant = store.track_participant();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = participant.next().await {
                state.update(|s| s.is_participant = value);
            }
        }));
    }
}

impl Drop for AppShell {
    fn drop(&mut self) {
        self.destroy();
    }
}
