//! Chat commands
//!
//! Project switching cascades into the sessions store: the chat view is
//! cleared, the project's sessions are loaded, and the most recently
//! updated one is opened. A project without sessions gets one.

use crate::app::AppState;
use crate::config::{DEFAULT_PROJECT_ID, DEFAULT_SESSION_TITLE};
use crate::error::{AppError, Result};
use crate::models::{
    ActivityAction, ChatSession, CreateSessionRequest, Message, NewMessage, TargetKind,
};

/// Make a project current and open its most recent session
pub async fn switch_project(state: &AppState, project_id: &str) -> Result<ChatSession> {
    tracing::info!("Switching to project: {}", project_id);

    state.projects.select_project(Some(project_id.to_string()));
    state.sessions.clear_chat();

    let sessions = state.sessions.load_sessions(Some(project_id), false).await?;
    let session = match most_recent(sessions) {
        Some(session) => session,
        None => create_default_session(state, project_id).await?,
    };

    open_session(state, &session.id).await?;

    let title = state
        .projects
        .get_project(project_id)
        .map(|p| p.name)
        .unwrap_or_else(|| project_id.to_string());
    state
        .user_state
        .record_activity(ActivityAction::Opened, TargetKind::Project, project_id, &title);

    Ok(session)
}

/// Select a session and load its messages
pub async fn open_session(state: &AppState, session_id: &str) -> Result<Vec<Message>> {
    state.sessions.select_session(Some(session_id.to_string()));
    let messages = state.sessions.load_messages(session_id).await?;

    let title = state
        .sessions
        .current_session()
        .map(|s| s.title)
        .unwrap_or_else(|| session_id.to_string());
    state
        .user_state
        .record_activity(ActivityAction::Opened, TargetKind::Session, session_id, &title);

    Ok(messages)
}

/// Create a session in the current project and open it
pub async fn new_session(state: &AppState, title: Option<&str>) -> Result<ChatSession> {
    let project_id = current_project_or_default(state);
    let title = title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_SESSION_TITLE);

    let session = state
        .sessions
        .create_session(CreateSessionRequest {
            project_id,
            title: title.to_string(),
            description: None,
        })
        .await?;

    state.user_state.record_activity(
        ActivityAction::Created,
        TargetKind::Session,
        &session.id,
        &session.title,
    );
    state.sessions.select_session(Some(session.id.clone()));

    Ok(session)
}

/// Current session id, opening or creating one in the current project if
/// nothing is selected yet
pub async fn ensure_session(state: &AppState) -> Result<String> {
    if let Some(id) = state.sessions.current_session_id() {
        return Ok(id);
    }

    let project_id = current_project_or_default(state);
    let sessions = state
        .sessions
        .load_sessions(Some(project_id.as_str()), false)
        .await?;
    let session = match most_recent(sessions) {
        Some(session) => session,
        None => create_default_session(state, &project_id).await?,
    };

    open_session(state, &session.id).await?;
    Ok(session.id)
}

/// Send a user message to the current session
pub async fn send_user_message(state: &AppState, content: &str) -> Result<Message> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }

    let session_id = ensure_session(state).await?;
    state
        .sessions
        .send_message(&session_id, NewMessage::user(content))
        .await
}

/// Delete a session; deleting the open one clears the chat view
pub async fn delete_session(state: &AppState, session_id: &str, force: bool) -> Result<()> {
    let title = state
        .sessions
        .state()
        .sessions
        .into_iter()
        .find(|s| s.id == session_id)
        .map(|s| s.title)
        .unwrap_or_else(|| session_id.to_string());

    state.sessions.delete_session(session_id, force).await?;

    state
        .user_state
        .record_activity(ActivityAction::Deleted, TargetKind::Session, session_id, &title);
    Ok(())
}

async fn create_default_session(state: &AppState, project_id: &str) -> Result<ChatSession> {
    tracing::info!("Project {} has no sessions, creating one", project_id);

    let session = state
        .sessions
        .create_session(CreateSessionRequest {
            project_id: project_id.to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            description: None,
        })
        .await?;

    state.user_state.record_activity(
        ActivityAction::Created,
        TargetKind::Session,
        &session.id,
        &session.title,
    );
    Ok(session)
}

fn current_project_or_default(state: &AppState) -> String {
    state
        .projects
        .current_project_id()
        .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string())
}

fn most_recent(sessions: Vec<ChatSession>) -> Option<ChatSession> {
    sessions.into_iter().max_by_key(|s| s.updated_at)
}
