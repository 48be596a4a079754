//! Application configuration
//!
//! Central location for configuration constants, local storage keys,
//! validation boundaries, and the runtime `ClientConfig`.

use std::path::PathBuf;
use std::time::Duration;

// ===== Backend =====

/// Base URL used when `AIDESK_API_BASE_URL` is not set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the backend base URL
pub const API_BASE_URL_ENV: &str = "AIDESK_API_BASE_URL";

/// Environment variable overriding the local data directory
pub const DATA_DIR_ENV: &str = "AIDESK_DATA_DIR";

/// Environment variable setting a request timeout in seconds.
/// Unset means the HTTP client defaults apply.
pub const REQUEST_TIMEOUT_ENV: &str = "AIDESK_REQUEST_TIMEOUT_SECS";

/// Environment variable the CLI reads a provider API key from
pub const PROVIDER_API_KEY_ENV: &str = "AIDESK_PROVIDER_API_KEY";

/// Settings owner used for effective settings lookups
pub const DEFAULT_SETTINGS_USER: &str = "default";

// ===== Domain =====

/// Id of the project that always exists and cannot be deleted
pub const DEFAULT_PROJECT_ID: &str = "default";

/// Title given to sessions created automatically on project switch
pub const DEFAULT_SESSION_TITLE: &str = "New Chat";

/// Maximum number of recent activity entries kept
pub const MAX_RECENT_ACTIVITY: usize = 50;

/// Number of sessions shown in the navigation shell
pub const RECENT_SESSIONS_IN_NAV: usize = 10;

// ===== Local storage keys =====
// Each key is an isolated, versioned JSON blob under the data directory.

pub const SESSION_SELECTION_KEY: &str = "session-selection";
pub const PROJECT_SELECTION_KEY: &str = "project-selection";
pub const TEMPLATE_SELECTION_KEY: &str = "template-selection";
pub const USER_PREFERENCES_KEY: &str = "user-preferences";
pub const USER_ACTIVITY_KEY: &str = "user-activity";
pub const PROVIDER_SELECTION_KEY: &str = "provider-selection";

// ===== Preference limits =====

/// Minimum autosave interval in seconds
pub const MIN_AUTOSAVE_INTERVAL_SECS: u32 = 5;

/// Maximum autosave interval in seconds (1 hour)
pub const MAX_AUTOSAVE_INTERVAL_SECS: u32 = 3_600;

/// Maximum length for a keyboard shortcut string (e.g., "Ctrl+Shift+Alt+N")
pub const MAX_SHORTCUT_LENGTH: usize = 50;

/// Runtime configuration for the client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_base_url: impl Into<String>, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            data_dir: data_dir.into(),
            request_timeout: None,
        }
    }

    /// Build configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let api_base_url =
            std::env::var(API_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let data_dir = std::env::var(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let request_timeout = std::env::var(REQUEST_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self {
            api_base_url,
            data_dir,
            request_timeout,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aidesk")
}
