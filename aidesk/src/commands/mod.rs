//! Commands orchestrating the stores
//!
//! This module organizes commands into logical submodules:
//! - `projects`: Project rows, creation and protected deletion
//! - `chat`: Project switching, sessions and messages
//! - `templates`: Template insertion into the composer
//! - `settings`: Settings import and export files
//! - `layout`: Navigation shell view

pub mod chat;
pub mod layout;
pub mod projects;
pub mod settings;
pub mod templates;

use crate::app::AppState;
use serde::Serialize;

pub use chat::*;
pub use layout::*;
pub use projects::*;
pub use settings::*;
pub use templates::*;

/// Get application information
pub fn get_app_info(state: &AppState) -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_base_url: state.api.base_url().to_string(),
        data_dir: state.config.data_dir.to_string_lossy().to_string(),
    }
}

/// Application information structure
#[derive(Debug, Serialize)]
pub struct AppInfo {
    pub version: String,
    pub api_base_url: String,
    pub data_dir: String,
}
