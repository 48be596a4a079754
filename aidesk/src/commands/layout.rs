//! Navigation shell

use crate::app::AppState;
use crate::config::RECENT_SESSIONS_IN_NAV;
use crate::error::Result;
use crate::models::{ChatSession, ProjectTreeNode};
use serde::Serialize;

/// Everything the navigation sidebar renders
#[derive(Debug, Clone, Serialize)]
pub struct NavigationView {
    pub sidebar_collapsed: bool,
    pub expanded_sections: Vec<String>,
    pub project_tree: Vec<ProjectTreeNode>,
    pub current_project_id: Option<String>,
    pub recent_sessions: Vec<ChatSession>,
    pub current_session_id: Option<String>,
}

/// Build the navigation view from current store state
pub fn navigation(state: &AppState) -> NavigationView {
    let ui_state = state.settings.ui_state();
    let projects = state.projects.state();

    NavigationView {
        sidebar_collapsed: ui_state.sidebar_collapsed,
        expanded_sections: ui_state.expanded_sections,
        project_tree: projects.tree,
        current_project_id: projects.current_project_id,
        recent_sessions: state.sessions.recent_sessions(RECENT_SESSIONS_IN_NAV),
        current_session_id: state.sessions.current_session_id(),
    }
}

/// Reload the project tree and the session list, then build the view
pub async fn refresh_navigation(state: &AppState) -> Result<NavigationView> {
    state.projects.load_tree().await?;

    let project_id = state.projects.current_project_id();
    state
        .sessions
        .load_sessions(project_id.as_deref(), false)
        .await?;

    Ok(navigation(state))
}
