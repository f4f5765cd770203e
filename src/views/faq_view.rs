//! Read-only view of one FAQ with edit and archive actions.

use super::ViewState;
use crate::context::AppContext;
use crate::models::{Ticket, User};
use crate::router::{NavigationState, Route};
use crate::services::Tracker;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FaqViewState {
    pub course_id: i64,
    pub faq_id: i64,
    pub ticket: Option<Ticket>,
    pub user: Option<User>,
    pub error_message: Option<String>,
    pub is_loaded: bool,
    /// The archive button asks for confirmation on the first press.
    pub archive_pressed: bool,
}

impl FaqViewState {
    /// Staff may edit or archive an FAQ.
    pub fn can_manage(&self) -> bool {
        self.user
            .as_ref()
            .and_then(|u| u.role)
            .is_some_and(|role| role.is_privileged())
    }
}

pub struct FaqView {
    ctx: Arc<AppContext>,
    state: ViewState<FaqViewState>,
}

impl FaqView {
    pub async fn open(ctx: Arc<AppContext>, course_id: i64, faq_id: i64) -> Self {
        let mut state = FaqViewState {
            course_id,
            faq_id,
            user: ctx.store.user_info(),
            ..Default::default()
        };
        match ctx.tickets.get_ticket_info(faq_id).await {
            Ok(ticket) => state.ticket = Some(ticket),
            Err(e) => {
                log::warn!("[faq] could not load FAQ {}: {}", faq_id, e);
                state.error_message = Some(ctx.strings.get("faq.show-failed"));
            }
        }
        state.is_loaded = true;

        Self {
            ctx,
            state: ViewState::new(state),
        }
    }

    pub fn state(&self) -> FaqViewState {
        self.state.get()
    }

    pub fn subscribe(&self) -> Tracker<FaqViewState> {
        self.state.subscribe()
    }

    pub fn edit_faq(&self) {
        let state = self.state.get();
        self.ctx.navigator.navigate(
            Route::SubmitFaq {
                course_id: state.course_id,
                ticket_id: Some(state.faq_id),
            },
            NavigationState { edit_faq: true },
        );
    }

    pub fn press_archive(&self) {
        self.state.update(|s| s.archive_pressed = true);
    }

    pub async fn archive_faq(&self) -> bool {
        let state = self.state.get();
        self.state.update(|s| s.archive_pressed = false);

        match self.ctx.tickets.archive_faq(state.faq_id).await {
            Ok(_) => {
                self.ctx.navigator.navigate_to(Route::ListTickets {
                    course_id: state.course_id,
                });
                true
            }
            Err(e) => {
                let key = if e.is_permission_denied() {
                    "error.no-permission"
                } else {
                    "faq.archive-failed"
                };
                let message = self.ctx.strings.get(key);
                self.state.update(|s| s.error_message = Some(message));
                false
            }
        }
    }
}
