//! Project commands
//!
//! The default project is protected here, before any request is made.

use crate::app::AppState;
use crate::config::DEFAULT_PROJECT_ID;
use crate::error::{AppError, Result};
use crate::models::{
    ActivityAction, CreateProjectRequest, Project, TargetKind, UpdateProjectRequest,
};
use serde::Serialize;

/// A project as rendered in a list
#[derive(Debug, Clone, Serialize)]
pub struct ProjectRow {
    pub project: Project,
    pub delete_enabled: bool,
    pub is_current: bool,
}

/// Rows for the loaded projects; the default project's delete is disabled
pub fn project_rows(state: &AppState) -> Vec<ProjectRow> {
    let projects = state.projects.state();
    projects
        .projects
        .into_iter()
        .map(|project| ProjectRow {
            delete_enabled: project.can_delete(),
            is_current: projects.current_project_id.as_deref() == Some(project.id.as_str()),
            project,
        })
        .collect()
}

/// Create a project and record it in recent activity
pub async fn create_project(
    state: &AppState,
    name: &str,
    description: Option<String>,
    parent_id: Option<String>,
) -> Result<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Project name cannot be empty".to_string()));
    }

    let req = CreateProjectRequest {
        name: name.to_string(),
        description,
        parent_id,
    };
    let project = state.projects.create_project(req).await?;

    state.user_state.record_activity(
        ActivityAction::Created,
        TargetKind::Project,
        &project.id,
        &project.name,
    );
    Ok(project)
}

/// Rename a project
pub async fn rename_project(state: &AppState, id: &str, name: &str) -> Result<Project> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Project name cannot be empty".to_string()));
    }

    let req = UpdateProjectRequest {
        name: Some(name.to_string()),
        ..Default::default()
    };
    let project = state.projects.update_project(id, req).await?;

    state.user_state.record_activity(
        ActivityAction::Updated,
        TargetKind::Project,
        &project.id,
        &project.name,
    );
    Ok(project)
}

/// Delete a project. The default project is refused without a request.
///
/// Deleting the current project also clears the chat view.
pub async fn delete_project(state: &AppState, id: &str, force: bool) -> Result<()> {
    if id == DEFAULT_PROJECT_ID {
        tracing::warn!("Refusing to delete the default project");
        let err = AppError::ProtectedProject(id.to_string());
        state.projects.set_error(Some(err.to_string()));
        return Err(err);
    }

    let was_current = state.projects.current_project_id().as_deref() == Some(id);
    let title = state
        .projects
        .get_project(id)
        .map(|p| p.name)
        .unwrap_or_else(|| id.to_string());

    state.projects.delete_project(id, force).await?;

    if was_current {
        state.sessions.clear_chat();
    }
    state
        .user_state
        .record_activity(ActivityAction::Deleted, TargetKind::Project, id, &title);
    Ok(())
}
