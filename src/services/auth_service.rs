//! Session lifecycle: current user, login, logout and the post-login
//! redirect.

use crate::db::storage::REDIRECT_URL_KEY;
use crate::db::{BrowserStorage, StorageScope};
use crate::error::AppError;
use crate::models::User;
use crate::router::{Navigator, Route};
use crate::services::api_client::ApiClient;
use crate::services::endpoints;
use crate::services::error_handler::ErrorHandler;
use crate::services::store::{Store, Tracker};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "ktunnus")]
    email: &'a str,
    #[serde(rename = "salasana")]
    password: &'a str,
    #[serde(rename = "login-id")]
    login_id: &'a str,
}

pub struct AuthService {
    api: Arc<ApiClient>,
    store: Arc<Store>,
    errors: Arc<ErrorHandler>,
    storage: BrowserStorage,
    navigator: Arc<dyn Navigator>,
    error_message: watch::Sender<Option<String>>,
}

impl AuthService {
    pub fn new(
        api: Arc<ApiClient>,
        store: Arc<Store>,
        errors: Arc<ErrorHandler>,
        storage: BrowserStorage,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            api,
            store,
            errors,
            storage,
            navigator,
            error_message: watch::channel(None).0,
        }
    }

    /// Ask the backend who is signed in and update the store.
    ///
    /// Being logged out is an answer, not a failure: it only flips the
    /// login flag.
    pub async fn initialize(&self) -> Result<Option<User>, AppError> {
        match self.api.get::<User>(&endpoints::me()).await {
            Ok(user) => {
                log::info!("[auth] signed in as user {}", user.id);
                self.store.set_user_info(Some(user.clone()));
                self.store.set_logged_in();
                Ok(Some(user))
            }
            Err(err) if err.is_not_logged_in() => {
                self.store.set_logged_out();
                Ok(None)
            }
            Err(err) => Err(self.errors.report(err)),
        }
    }

    /// Send credentials to the auth endpoint. The server's message for a
    /// refused login is published on [`track_error_messages`](Self::track_error_messages).
    pub async fn login(&self, email: &str, password: &str, login_id: &str) -> Result<(), AppError> {
        let request = LoginRequest {
            email,
            password,
            login_id,
        };

        match self
            .api
            .post::<_, serde_json::Value>(&endpoints::login(), &request)
            .await
        {
            Ok(_) => {
                self.error_message.send_replace(None);
                self.initialize().await?;
                Ok(())
            }
            Err(err) => {
                log::warn!("[auth] login refused: {}", err);
                let message = match &err {
                    AppError::Api { message, .. } => message.clone(),
                    other => other.to_string(),
                };
                self.error_message.send_replace(Some(message));
                Err(err)
            }
        }
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.api
            .post::<_, serde_json::Value>(&endpoints::logout(), &serde_json::json!({}))
            .await
            .map_err(|e| self.errors.report(e))?;
        self.store.set_logged_out();
        Ok(())
    }

    /// Latest login error, `None` once a login succeeds.
    pub fn track_error_messages(&self) -> Tracker<Option<String>> {
        Tracker::new(self.error_message.subscribe())
    }

    /// Remember where to return after logging in.
    pub async fn save_redirect_url(&self, route: &Route) -> Result<(), AppError> {
        self.storage
            .set_local(REDIRECT_URL_KEY, &route.to_url())
            .await
    }

    /// The saved redirect target, removed from storage on read.
    pub async fn take_redirect_url(&self) -> Result<Option<Route>, AppError> {
        let url = self.storage.local(REDIRECT_URL_KEY).await?;
        if url.is_some() {
            self.storage
                .remove_item(StorageScope::Local, REDIRECT_URL_KEY)
                .await?;
        }
        Ok(url.as_deref().and_then(Route::parse))
    }

    pub fn navigate_to_login(&self, course_id: i64) {
        self.navigator.navigate_to(Route::Login {
            course_id: Some(course_id),
            login_id: None,
        });
    }
}
