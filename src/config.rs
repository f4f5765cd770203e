//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default backend address.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";

/// Polling interval of list views in production builds, in minutes.
pub const PRODUCTION_POLL_MINUTES: u64 = 5;

/// Polling interval of list views in development builds, in minutes.
pub const DEVELOPMENT_POLL_MINUTES: u64 = 15;

/// Largest attachment accepted by the widget (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 100 * 1024 * 1024;

/// Build mode, mirrors the front-end's `environment.production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildMode {
    Development,
    Production,
}

/// Configuration for one application session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL every REST path is appended to.
    pub api_base_url: String,

    pub build_mode: BuildMode,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Attachment size ceiling in bytes.
    pub max_file_size_bytes: u64,

    /// Directory of the local storage database.
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            build_mode: BuildMode::Development,
            timeout_secs: 30,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_BYTES,
            data_dir: PathBuf::from(".ticket-desk"),
        }
    }
}

impl AppConfig {
    /// Build a configuration from `TICKET_DESK_*` environment variables,
    /// falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup("TICKET_DESK_API_URL") {
            config.api_base_url = url;
        }
        if let Some(flag) = lookup("TICKET_DESK_PRODUCTION") {
            if matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes") {
                config.build_mode = BuildMode::Production;
            }
        }
        if let Some(dir) = lookup("TICKET_DESK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("TICKET_DESK_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            config.timeout_secs = secs;
        }

        config
    }

    pub fn is_production(&self) -> bool {
        self.build_mode == BuildMode::Production
    }

    /// How often list views re-fetch.
    pub fn polling_interval(&self) -> Duration {
        let minutes = match self.build_mode {
            BuildMode::Production => PRODUCTION_POLL_MINUTES,
            BuildMode::Development => DEVELOPMENT_POLL_MINUTES,
        };
        Duration::from_secs(minutes * 60)
    }
}
