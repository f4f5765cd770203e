//! Typed application routes and navigation.
//!
//! Views never build URL strings themselves: they navigate to a [`Route`]
//! through the [`Navigator`] the embedding shell provides.

use std::fmt;
use std::sync::Mutex;
use tokio::sync::watch;

use crate::services::store::Tracker;

/// A screen of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListTickets { course_id: i64 },
    SubmitTicket { course_id: i64 },
    /// New FAQ, or a copy of an existing ticket when `ticket_id` is set.
    SubmitFaq { course_id: i64, ticket_id: Option<i64> },
    FaqView { course_id: i64, ticket_id: i64 },
    Join { course_id: i64, invitation: Option<String> },
    Home { course_id: i64 },
    Profile { course_id: i64 },
    Settings { course_id: i64 },
    Login { course_id: Option<i64>, login_id: Option<String> },
}

impl Route {
    /// Parse an application URL. The legacy `/list-tickets?courseID=` form
    /// is accepted and mapped to the course list.
    pub fn parse(url: &str) -> Option<Self> {
        let (path, query) = match url.split_once('?') {
            Some((path, query)) => (path, query),
            None => (url, ""),
        };
        let param = |name: &str| -> Option<String> {
            query
                .split('&')
                .filter_map(|pair| pair.split_once('='))
                .find(|(key, _)| *key == name)
                .and_then(|(_, value)| urlencoding::decode(value).ok())
                .map(|value| value.into_owned())
                .filter(|value| !value.is_empty())
        };

        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Some(Self::Login {
                course_id: None,
                login_id: param("loginid"),
            }),
            ["list-tickets"] => Some(Self::ListTickets {
                course_id: param("courseID")?.parse().ok()?,
            }),
            ["course", course, rest @ ..] => {
                let course_id = course.parse().ok()?;
                match rest {
                    ["list-tickets"] => Some(Self::ListTickets { course_id }),
                    ["submit"] => Some(Self::SubmitTicket { course_id }),
                    ["submit-faq"] => Some(Self::SubmitFaq {
                        course_id,
                        ticket_id: None,
                    }),
                    ["submit-faq", id] => Some(Self::SubmitFaq {
                        course_id,
                        ticket_id: Some(id.parse().ok()?),
                    }),
                    ["faq-view", id] => Some(Self::FaqView {
                        course_id,
                        ticket_id: id.parse().ok()?,
                    }),
                    ["join"] => Some(Self::Join {
                        course_id,
                        invitation: param("invitation"),
                    }),
                    ["home"] => Some(Self::Home { course_id }),
                    ["profile"] => Some(Self::Profile { course_id }),
                    ["settings"] => Some(Self::Settings { course_id }),
                    ["login"] => Some(Self::Login {
                        course_id: Some(course_id),
                        login_id: param("loginid"),
                    }),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn course_id(&self) -> Option<i64> {
        match self {
            Self::ListTickets { course_id }
            | Self::SubmitTicket { course_id }
            | Self::SubmitFaq { course_id, .. }
            | Self::FaqView { course_id, .. }
            | Self::Join { course_id, .. }
            | Self::Home { course_id }
            | Self::Profile { course_id }
            | Self::Settings { course_id } => Some(*course_id),
            Self::Login { course_id, .. } => *course_id,
        }
    }

    pub fn to_url(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListTickets { course_id } => write!(f, "/course/{}/list-tickets", course_id),
            Self::SubmitTicket { course_id } => write!(f, "/course/{}/submit", course_id),
            Self::SubmitFaq {
                course_id,
                ticket_id: None,
            } => write!(f, "/course/{}/submit-faq", course_id),
            Self::SubmitFaq {
                course_id,
                ticket_id: Some(id),
            } => write!(f, "/course/{}/submit-faq/{}", course_id, id),
            Self::FaqView {
                course_id,
                ticket_id,
            } => write!(f, "/course/{}/faq-view/{}", course_id, ticket_id),
            Self::Join {
                course_id,
                invitation,
            } => {
                write!(f, "/course/{}/join", course_id)?;
                if let Some(invitation) = invitation {
                    write!(f, "?invitation={}", urlencoding::encode(invitation))?;
                }
                Ok(())
            }
            Self::Home { course_id } => write!(f, "/course/{}/home", course_id),
            Self::Profile { course_id } => write!(f, "/course/{}/profile", course_id),
            Self::Settings { course_id } => write!(f, "/course/{}/settings", course_id),
            Self::Login {
                course_id,
                login_id,
            } => {
                match course_id {
                    Some(course_id) => write!(f, "/course/{}/login", course_id)?,
                    None => write!(f, "/login")?,
                }
                if let Some(login_id) = login_id {
                    write!(f, "?loginid={}", urlencoding::encode(login_id))?;
                }
                Ok(())
            }
        }
    }
}

/// Extra data passed along with a navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    /// Open the FAQ form on an existing FAQ instead of copying a ticket.
    pub edit_faq: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    pub state: NavigationState,
}

/// Performs navigation on behalf of the views.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route, state: NavigationState);

    fn current(&self) -> Option<Navigation>;

    fn navigate_to(&self, route: Route) {
        self.navigate(route, NavigationState::default());
    }
}

/// In-process navigator keeping a history of every navigation.
pub struct HistoryNavigator {
    current: watch::Sender<Option<Navigation>>,
    history: Mutex<Vec<Navigation>>,
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self {
            current: watch::channel(None).0,
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn history(&self) -> Vec<Navigation> {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn track(&self) -> Tracker<Option<Navigation>> {
        Tracker::new(self.current.subscribe())
    }
}

impl Navigator for HistoryNavigator {
    fn navigate(&self, route: Route, state: NavigationState) {
        log::debug!("[router] navigate to {}", route);
        let navigation = Navigation { route, state };
        self.history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(navigation.clone());
        self.current.send_replace(Some(navigation));
    }

    fn current(&self) -> Option<Navigation> {
        self.current.borrow().clone()
    }
}
