//! Settings file commands
//!
//! Export and import go through files chosen by the user.

use crate::app::AppState;
use crate::error::Result;
use crate::models::Theme;
use std::path::Path;

/// Write the export document of a settings profile to a file
pub async fn export_settings_to_file(
    state: &AppState,
    settings_id: &str,
    path: &Path,
) -> Result<()> {
    let document = state.settings.export_settings(settings_id).await?;
    let contents = serde_json::to_string_pretty(&document)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, contents).await?;

    tracing::info!("Settings exported to {:?}", path);
    Ok(())
}

/// Import a settings document from a file
pub async fn import_settings_from_file(state: &AppState, path: &Path) -> Result<()> {
    let text = tokio::fs::read_to_string(path).await?;
    state.settings.import_settings(&text).await?;

    tracing::info!("Settings imported from {:?}", path);
    Ok(())
}

/// Change the theme and save preferences to the backend
pub async fn update_theme(state: &AppState, theme: Theme) -> Result<()> {
    state.settings.set_theme(theme);
    state.settings.save_preferences().await
}
