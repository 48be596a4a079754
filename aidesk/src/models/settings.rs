//! User preference and UI state records
//!
//! Every field carries a serde default so partial documents (older exports,
//! backend responses missing a section) still parse.

use crate::config::{MAX_AUTOSAVE_INTERVAL_SECS, MAX_SHORTCUT_LENGTH, MIN_AUTOSAVE_INTERVAL_SECS};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl std::str::FromStr for Theme {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(AppError::Validation(format!("Unknown theme: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Comfortable,
    Compact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default)]
    pub desktop: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound: true,
            desktop: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "en".to_string()
}

fn default_autosave_interval() -> u32 {
    30
}

fn default_shortcuts() -> BTreeMap<String, String> {
    [
        ("new_chat", "Ctrl+N"),
        ("send_message", "Ctrl+Enter"),
        ("toggle_sidebar", "Ctrl+B"),
        ("search", "Ctrl+K"),
    ]
    .into_iter()
    .map(|(action, keys)| (action.to_string(), keys.to_string()))
    .collect()
}

/// Client-local preferences, mirrored to the backend on explicit save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval_secs: u32,
    #[serde(default = "default_shortcuts")]
    pub keyboard_shortcuts: BTreeMap<String, String>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            layout: Layout::default(),
            language: default_language(),
            notifications: NotificationSettings::default(),
            autosave_interval_secs: default_autosave_interval(),
            keyboard_shortcuts: default_shortcuts(),
        }
    }
}

impl UserPreferences {
    /// Check limits before the preferences are sent to the backend
    pub fn validate(&self) -> Result<()> {
        if !(MIN_AUTOSAVE_INTERVAL_SECS..=MAX_AUTOSAVE_INTERVAL_SECS)
            .contains(&self.autosave_interval_secs)
        {
            return Err(AppError::Validation(format!(
                "Autosave interval must be between {} and {} seconds",
                MIN_AUTOSAVE_INTERVAL_SECS, MAX_AUTOSAVE_INTERVAL_SECS
            )));
        }

        if self.language.trim().is_empty() {
            return Err(AppError::Validation("Language cannot be empty".to_string()));
        }

        for (action, keys) in &self.keyboard_shortcuts {
            if keys.len() > MAX_SHORTCUT_LENGTH {
                return Err(AppError::Validation(format!(
                    "Shortcut for '{}' exceeds {} characters",
                    action, MAX_SHORTCUT_LENGTH
                )));
            }
        }

        Ok(())
    }
}

/// Layout state of the navigation shell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub expanded_sections: Vec<String>,
    #[serde(default)]
    pub active_panel: Option<String>,
}

/// Response of `/settings/user/{user}/effective`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    #[serde(default)]
    pub preferences: UserPreferences,
    #[serde(default)]
    pub ui_state: UiState,
}

/// Settings categories addressable under `/settings/categories/{category}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsCategory {
    Preferences,
    UiState,
}

impl SettingsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingsCategory::Preferences => "preferences",
            SettingsCategory::UiState => "ui_state",
        }
    }
}

impl std::fmt::Display for SettingsCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
