//! Settings store
//!
//! Preferences and UI state live on the client and are mirrored to the
//! backend on explicit save. Both are persisted locally so the shell
//! restores its layout before the backend answers.

use super::{ActionStatus, Store, StoreState};
use crate::api::ApiClient;
use crate::config::{DEFAULT_SETTINGS_USER, USER_PREFERENCES_KEY};
use crate::error::{AppError, Result};
use crate::models::{EffectiveSettings, SettingsCategory, Theme, UiState, UserPreferences};
use crate::storage::local_store::persist_quietly;
use crate::storage::{LocalStorage, Persist};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct SettingsState {
    pub preferences: UserPreferences,
    pub ui_state: UiState,
    pub status: ActionStatus,
}

impl StoreState for SettingsState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default)]
    preferences: UserPreferences,
    #[serde(default)]
    ui_state: UiState,
}

impl Persist for StoredSettings {
    const KEY: &'static str = USER_PREFERENCES_KEY;
    const VERSION: u32 = 1;
}

/// Sections found in an imported settings document
#[derive(Debug, Default)]
struct ImportedSections {
    preferences: Option<UserPreferences>,
    ui_state: Option<UiState>,
}

#[derive(Clone)]
pub struct SettingsStore {
    store: Store<SettingsState>,
    api: ApiClient,
    storage: LocalStorage,
}

impl SettingsStore {
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        let stored = storage.load::<StoredSettings>().unwrap_or_default();
        let state = SettingsState {
            preferences: stored.preferences,
            ui_state: stored.ui_state,
            status: ActionStatus::default(),
        };

        Self {
            store: Store::new(state),
            api,
            storage,
        }
    }

    pub fn state(&self) -> SettingsState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SettingsState> {
        self.store.subscribe()
    }

    pub fn preferences(&self) -> UserPreferences {
        self.store.read(|s| s.preferences.clone())
    }

    pub fn ui_state(&self) -> UiState {
        self.store.read(|s| s.ui_state.clone())
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.set_error(error);
    }

    pub fn set_preferences(&self, preferences: UserPreferences) {
        self.store.update(|s| s.preferences = preferences);
        self.persist();
    }

    pub fn set_theme(&self, theme: Theme) {
        self.store.update(|s| s.preferences.theme = theme);
        self.persist();
    }

    pub fn set_ui_state(&self, ui_state: UiState) {
        self.store.update(|s| s.ui_state = ui_state);
        self.persist();
    }

    pub fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.store.update(|s| s.ui_state.sidebar_collapsed = collapsed);
        self.persist();
    }

    pub fn toggle_sidebar(&self) {
        self.store
            .update(|s| s.ui_state.sidebar_collapsed = !s.ui_state.sidebar_collapsed);
        self.persist();
    }

    /// Expand a collapsed navigation section or collapse an expanded one
    pub fn toggle_section(&self, section: &str) {
        self.store.update(|s| {
            let sections = &mut s.ui_state.expanded_sections;
            if let Some(pos) = sections.iter().position(|name| name == section) {
                sections.remove(pos);
            } else {
                sections.push(section.to_string());
            }
        });
        self.persist();
    }

    /// Fetch the backend's effective settings for the default user
    pub async fn load_effective(&self) -> Result<EffectiveSettings> {
        let api = &self.api;
        let effective = self
            .store
            .run(
                "load_settings",
                async move {
                    api.get::<EffectiveSettings>(&[
                        "settings",
                        "user",
                        DEFAULT_SETTINGS_USER,
                        "effective",
                    ])
                    .await
                },
                |s, effective| {
                    s.preferences = effective.preferences.clone();
                    s.ui_state = effective.ui_state.clone();
                    effective
                },
            )
            .await?;

        self.persist();
        Ok(effective)
    }

    /// Validate and send preferences to the backend
    pub async fn save_preferences(&self) -> Result<()> {
        let preferences = self.preferences();
        tracing::info!("Saving preferences");

        self.store
            .run(
                "save_preferences",
                async move {
                    preferences.validate()?;
                    self.put_category(SettingsCategory::Preferences, &preferences)
                        .await
                },
                |_, _| (),
            )
            .await
    }

    /// Send UI state to the backend
    pub async fn save_ui_state(&self) -> Result<()> {
        let ui_state = self.ui_state();
        tracing::info!("Saving UI state");

        self.store
            .run(
                "save_ui_state",
                self.put_category(SettingsCategory::UiState, &ui_state),
                |_, _| (),
            )
            .await
    }

    /// Fetch one category from the backend and apply it
    pub async fn load_category(&self, category: SettingsCategory) -> Result<Value> {
        let api = &self.api;
        let value = self
            .store
            .run(
                "load_settings_category",
                async move {
                    let value: Value = api
                        .get(&["settings", "categories", category.as_str()])
                        .await?;
                    let sections = match category {
                        SettingsCategory::Preferences => ImportedSections {
                            preferences: Some(serde_json::from_value(value.clone())?),
                            ui_state: None,
                        },
                        SettingsCategory::UiState => ImportedSections {
                            preferences: None,
                            ui_state: Some(serde_json::from_value(value.clone())?),
                        },
                    };
                    Ok((value, sections))
                },
                |s, (value, sections)| {
                    apply_sections(s, sections);
                    value
                },
            )
            .await?;

        self.persist();
        Ok(value)
    }

    /// Fetch an export document for a settings profile
    pub async fn export_settings(&self, settings_id: &str) -> Result<Value> {
        tracing::info!("Exporting settings: {}", settings_id);

        let api = &self.api;
        self.store
            .run(
                "export_settings",
                async move { api.get::<Value>(&["settings", settings_id, "export"]).await },
                |_, document| document,
            )
            .await
    }

    /// Import a settings document.
    ///
    /// The whole document is forwarded to the backend first. Once the POST
    /// succeeds, `preferences` and `ui_state` found at the root are applied
    /// locally; missing or malformed sections are left untouched. A failed
    /// POST leaves local settings unchanged. Text that is not JSON fails
    /// before anything is sent.
    pub async fn import_settings(&self, text: &str) -> Result<()> {
        tracing::info!("Importing settings ({} bytes)", text.len());

        let api = &self.api;
        let applied = self
            .store
            .run(
                "import_settings",
                async move {
                    let document: Value = serde_json::from_str(text).map_err(|e| {
                        AppError::Parse(format!("settings file is not valid JSON: {}", e))
                    })?;

                    let sections = ImportedSections {
                        preferences: section(&document, "preferences"),
                        ui_state: section(&document, "ui_state"),
                    };

                    api.post::<_, Value>(&["settings", "import"], &document).await?;
                    Ok(sections)
                },
                |s, sections| {
                    let applied = sections.preferences.is_some() || sections.ui_state.is_some();
                    apply_sections(s, sections);
                    applied
                },
            )
            .await?;

        if applied {
            self.persist();
        } else {
            tracing::debug!("Imported document has no local sections");
        }
        Ok(())
    }

    async fn put_category<T: Serialize>(&self, category: SettingsCategory, value: &T) -> Result<()> {
        self.api
            .put::<_, Value>(&["settings", "categories", category.as_str()], value)
            .await?;
        tracing::info!("Settings category saved: {}", category);
        Ok(())
    }

    fn persist(&self) {
        let stored = self.store.read(|s| StoredSettings {
            preferences: s.preferences.clone(),
            ui_state: s.ui_state.clone(),
        });
        persist_quietly(&self.storage, &stored);
    }
}

fn apply_sections(state: &mut SettingsState, sections: ImportedSections) {
    if let Some(preferences) = sections.preferences {
        state.preferences = preferences;
    }
    if let Some(ui_state) = sections.ui_state {
        state.ui_state = ui_state;
    }
}

/// Parse one root-level section, skipping it when absent or malformed
fn section<T: DeserializeOwned>(document: &Value, key: &str) -> Option<T> {
    let value = document.get(key)?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("Ignoring malformed '{}' section: {}", key, e);
            None
        }
    }
}
