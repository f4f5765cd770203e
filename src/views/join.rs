//! Joining a course through an invitation link.

use super::{TaskSet, ViewError, ViewState};
use crate::context::AppContext;
use crate::models::{InvitedInfo, User};
use crate::router::Route;
use crate::services::Tracker;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum JoinStage {
    #[default]
    Editing,
    /// Signed in as someone else than the invited user.
    WrongUser,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinViewState {
    pub course_id: i64,
    pub course_name: String,
    pub invited_info: Option<InvitedInfo>,
    pub user: Option<User>,
    pub is_logged_in: Option<bool>,
    pub stage: JoinStage,
    pub error: Option<ViewError>,
}

impl JoinViewState {
    fn is_wrong_user(&self) -> bool {
        let invited = self.invited_info.as_ref().map(|i| i.email.as_str());
        let signed_in = self.user.as_ref().and_then(|u| u.email.as_deref());
        matches!((invited, signed_in), (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b))
    }
}

pub struct JoinView {
    ctx: Arc<AppContext>,
    state: ViewState<JoinViewState>,
    invitation: Option<Uuid>,
    tasks: TaskSet,
}

impl JoinView {
    pub async fn open(ctx: Arc<AppContext>, course_id: i64, invitation: Option<&str>) -> Self {
        let token = invitation.and_then(|s| Uuid::parse_str(s).ok());
        if token.is_none() {
            log::warn!("[join] no valid invitation in the link: {:?}", invitation);
        }

        let view = Self {
            state: ViewState::new(JoinViewState {
                course_id,
                ..Default::default()
            }),
            invitation: token,
            tasks: TaskSet::default(),
            ctx,
        };
        view.login_if_needed();
        view.track_user_info();
        view.get_invited_info().await;
        view
    }

    pub fn state(&self) -> JoinViewState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<JoinViewState> {
        self.state.subscribe()
    }

    pub async fn get_invited_info(&self) {
        let Some(token) = self.invitation else {
            return;
        };
        let course_id = self.state.get().course_id;

        match self.ctx.courses.get_invited_info(course_id, token).await {
            Ok(info) => {
                let name = self
                    .ctx
                    .courses
                    .get_course_name(info.course_id)
                    .await
                    .unwrap_or_default();
                self.state.update(|s| {
                    s.invited_info = Some(info);
                    s.course_name = name;
                });
                check_user_state(&self.ctx, &self.state);
            }
            Err(e) => {
                log::warn!("[join] invitation lookup failed: {}", e);
                let error = ViewError {
                    title: self.ctx.strings.get("error.title"),
                    message: self.ctx.strings.get("join.info-failed"),
                    button_text: String::new(),
                };
                self.state.update(|s| {
                    s.stage = JoinStage::Error;
                    s.error = Some(error);
                });
            }
        }
    }

    pub async fn join_course(&self) -> bool {
        let Some(token) = self.invitation else {
            log::warn!("[join] cannot join without an invitation");
            return false;
        };
        let state = self.state.get();

        match self.ctx.courses.join_course(state.course_id, token).await {
            Ok(response) => {
                self.state.update(|s| s.error = None);
                if state.is_logged_in != Some(true) {
                    self.redirect_to_login().await;
                    return false;
                }
                if response.success {
                    self.ctx.navigator.navigate_to(Route::ListTickets {
                        course_id: state.course_id,
                    });
                    return true;
                }
                self.join_failed();
                false
            }
            Err(_) => {
                self.join_failed();
                false
            }
        }
    }

    pub async fn logout(&self) {
        if self.ctx.auth.logout().await.is_ok() {
            self.redirect_to_login().await;
        }
    }

    pub fn go_to_home(&self) {
        let course_id = self.state.get().course_id;
        self.ctx.navigator.navigate_to(Route::Home { course_id });
    }

    pub fn destroy(&self) {
        self.tasks.abort_all();
    }

    fn join_failed(&self) {
        let error = ViewError {
            title: self.ctx.strings.get("error.title"),
            message: self.ctx.strings.get("join.failed"),
            button_text: String::new(),
        };
        self.state.update(|s| s.error = Some(error));
    }

    async fn redirect_to_login(&self) {
        redirect_to_login(&self.ctx, &self.state, self.invitation).await;
    }

    fn login_if_needed(&self) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let invitation = self.invitation;
        let mut logged_in = ctx.store.track_logged_in();
        self.tasks.push(tokio::spawn(async move {
            while let Some(value) = logged_in.next().await {
                state.update(|s| s.is_logged_in = value);
                if value == Some(false) {
                    redirect_to_login(&ctx, &state, invitation).await;
                }
            }
        }));
    }

    /// Takes the first signed-in user and checks it against the invitation.
    fn track_user_info(&self) {
        let ctx = self.ctx.clone();
        let state = self.state.clone();
        let mut users = ctx.store.track_user_info();
        self.tasks.push(tokio::spawn(async move {
            while let Some(user) = users.next().await {
                if let Some(user) = user.filter(|u| !u.name.is_empty()) {
                    state.update(|s| s.user = Some(user));
                    check_user_state(&ctx, &state);
                    break;
                }
            }
        }));
    }
}

impl Drop for JoinView {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn check_user_state(ctx: &AppContext, state: &ViewState<JoinViewState>) {
    if !state.get().is_wrong_user() {
        return;
    }
    let error = ViewError {
        title: ctx.strings.get("join.wrong-user.title"),
        message: ctx.strings.get("join.wrong-user.message"),
        button_text: String::new(),
    };
    state.update(|s| {
        s.stage = JoinStage::WrongUser;
        s.error = Some(error);
    });
}

/// Save this page as the post-login target and go to the login page.
async fn redirect_to_login(ctx: &AppContext, state: &ViewState<JoinViewState>, invitation: Option<Uuid>) {
    let course_id = state.get().course_id;
    let route = Route::Join {
        course_id,
        invitation: invitation.map(|t| t.to_string()),
    };
    if let Err(e) = ctx.auth.save_redirect_url(&route).await {
        log::warn!("[join] could not save redirect url: {}", e);
    }
    ctx.auth.navigate_to_login(course_id);
}
