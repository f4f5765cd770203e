//! Application context: every service of one session, wired together.
//!
//! Views receive an `Arc<AppContext>` instead of reaching for globals.

use crate::config::AppConfig;
use crate::db::storage::LANGUAGE_KEY;
use crate::db::{self, BrowserStorage};
use crate::error::AppError;
use crate::router::Navigator;
use crate::services::{
    ApiClient, ApiClientConfig, AttachmentWidget, AuthService, CourseService, ErrorHandler,
    Language, Localizer, Store, TicketService,
};
use std::sync::Arc;

pub struct AppContext {
    pub config: AppConfig,
    pub store: Arc<Store>,
    pub storage: BrowserStorage,
    pub strings: Arc<Localizer>,
    pub errors: Arc<ErrorHandler>,
    pub courses: Arc<CourseService>,
    pub tickets: Arc<TicketService>,
    pub auth: Arc<AuthService>,
    pub navigator: Arc<dyn Navigator>,
}

impl AppContext {
    /// Open the storage database under `config.data_dir` and build the
    /// context on it.
    pub async fn initialize(
        config: AppConfig,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>, AppError> {
        let pool = db::initialize(&db::get_db_path(&config.data_dir)).await?;
        Self::with_storage(config, BrowserStorage::new(pool), navigator).await
    }

    /// Build the context on an already opened storage. The UI language is
    /// restored from local storage.
    pub async fn with_storage(
        config: AppConfig,
        storage: BrowserStorage,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Arc<Self>, AppError> {
        let language = storage
            .local(LANGUAGE_KEY)
            .await?
            .as_deref()
            .and_then(Language::from_code)
            .unwrap_or_default();

        let api = Arc::new(ApiClient::new(ApiClientConfig::from(&config))?);
        let store = Arc::new(Store::new());
        let strings = Arc::new(Localizer::new(language));
        let errors = Arc::new(ErrorHandler::new(store.clone(), strings.clone()));
        let courses = Arc::new(CourseService::new(api.clone(), store.clone(), errors.clone()));
        let tickets = Arc::new(TicketService::new(api.clone(), errors.clone()));
        let auth = Arc::new(AuthService::new(
            api,
            store.clone(),
            errors.clone(),
            storage.clone(),
            navigator.clone(),
        ));

        log::info!(
            "[app] context ready (api {}, {:?} build, language {})",
            config.api_base_url,
            config.build_mode,
            language.code()
        );

        Ok(Arc::new(Self {
            config,
            store,
            storage,
            strings,
            errors,
            courses,
            tickets,
            auth,
            navigator,
        }))
    }

    /// A fresh attachment widget using the configured size ceiling.
    pub fn attachment_widget(&self) -> AttachmentWidget {
        AttachmentWidget::new(self.config.max_file_size_bytes, self.strings.clone())
    }
}
