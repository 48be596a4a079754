//! Chat sessions store
//!
//! Owns the session list for one project scope, the current session, and the
//! message buffer of the current session. Only the current session id is
//! persisted; sessions and messages are fetched again on every start.

use super::{ActionStatus, Store, StoreState};
use crate::api::ApiClient;
use crate::config::SESSION_SELECTION_KEY;
use crate::error::Result;
use crate::models::{ChatSession, CreateSessionRequest, Message, NewMessage, UpdateSessionRequest};
use crate::storage::local_store::persist_or_forget;
use crate::storage::{LocalStorage, Persist};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Query scope of the loaded session list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionScope {
    pub project_id: Option<String>,
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSessionsState {
    pub sessions: Vec<ChatSession>,
    pub current_session_id: Option<String>,
    /// Message buffer of the current session
    pub messages: Vec<Message>,
    pub scope: SessionScope,
    pub status: ActionStatus,
}

impl StoreState for ChatSessionsState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionSelection {
    current_session_id: Option<String>,
}

impl Persist for SessionSelection {
    const KEY: &'static str = SESSION_SELECTION_KEY;
    const VERSION: u32 = 1;
}

#[derive(Clone)]
pub struct ChatSessionsStore {
    store: Store<ChatSessionsState>,
    api: ApiClient,
    storage: LocalStorage,
}

impl ChatSessionsStore {
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        let selection = storage.load::<SessionSelection>().unwrap_or_default();
        let state = ChatSessionsState {
            current_session_id: selection.current_session_id,
            ..Default::default()
        };

        Self {
            store: Store::new(state),
            api,
            storage,
        }
    }

    pub fn state(&self) -> ChatSessionsState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatSessionsState> {
        self.store.subscribe()
    }

    pub fn set_sessions(&self, sessions: Vec<ChatSession>) {
        self.store.update(|s| s.sessions = sessions);
    }

    pub fn set_messages(&self, messages: Vec<Message>) {
        self.store.update(|s| s.messages = messages);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.set_error(error);
    }

    /// Change the current session. Switching to a different session drops
    /// the message buffer of the previous one.
    pub fn select_session(&self, session_id: Option<String>) {
        tracing::debug!("Selecting session: {:?}", session_id);
        self.store.update(|s| {
            if s.current_session_id != session_id {
                s.messages.clear();
            }
            s.current_session_id = session_id.clone();
        });
        self.persist_selection(session_id);
    }

    /// Clear the session selection and the message buffer in one update
    pub fn clear_chat(&self) {
        self.store.update(|s| {
            s.current_session_id = None;
            s.messages.clear();
        });
        self.persist_selection(None);
    }

    pub fn current_session_id(&self) -> Option<String> {
        self.store.read(|s| s.current_session_id.clone())
    }

    pub fn current_session(&self) -> Option<ChatSession> {
        self.store.read(|s| {
            let id = s.current_session_id.as_deref()?;
            s.sessions.iter().find(|session| session.id == id).cloned()
        })
    }

    /// Loaded sessions ordered by last update, newest first
    pub fn recent_sessions(&self, limit: usize) -> Vec<ChatSession> {
        let mut sessions = self.store.read(|s| s.sessions.clone());
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.truncate(limit);
        sessions
    }

    /// Fetch sessions of one project (or all projects when `None`)
    pub async fn load_sessions(
        &self,
        project_id: Option<&str>,
        include_inactive: bool,
    ) -> Result<Vec<ChatSession>> {
        let scope = SessionScope {
            project_id: project_id.map(str::to_string),
            include_inactive,
        };
        self.load_scope(scope).await
    }

    /// Re-fetch the session list for the scope currently loaded
    pub async fn reload(&self) -> Result<Vec<ChatSession>> {
        let scope = self.store.read(|s| s.scope.clone());
        self.load_scope(scope).await
    }

    /// Create a session under a project.
    ///
    /// Post-condition: `sessions` equals the list for the new session's
    /// project fetched after the POST.
    pub async fn create_session(&self, req: CreateSessionRequest) -> Result<ChatSession> {
        tracing::info!("Creating session '{}' in project {}", req.title, req.project_id);

        let scope = SessionScope {
            project_id: Some(req.project_id.clone()),
            include_inactive: self.store.read(|s| s.scope.include_inactive),
        };
        let api = &self.api;
        let list_scope = scope.clone();

        let created = self
            .store
            .run(
                "create_session",
                async move {
                    let created: ChatSession = api.post(&["sessions"], &req).await?;
                    let sessions = self.fetch_sessions(&list_scope).await?;
                    Ok((created, sessions))
                },
                |s, (created, sessions)| {
                    s.sessions = sessions;
                    s.scope = scope;
                    created
                },
            )
            .await?;

        tracing::info!("Session created successfully: {}", created.id);
        Ok(created)
    }

    /// Update a session.
    ///
    /// Post-condition: `sessions` equals the list for the current scope
    /// fetched after the PUT.
    pub async fn update_session(&self, id: &str, req: UpdateSessionRequest) -> Result<ChatSession> {
        tracing::info!("Updating session: {}", id);

        let scope = self.store.read(|s| s.scope.clone());
        let api = &self.api;
        self.store
            .run(
                "update_session",
                async move {
                    let updated: ChatSession = api.put(&["sessions", id], &req).await?;
                    let sessions = self.fetch_sessions(&scope).await?;
                    Ok((updated, sessions))
                },
                |s, (updated, sessions)| {
                    s.sessions = sessions;
                    updated
                },
            )
            .await
    }

    /// Delete a session.
    ///
    /// If it is the current session, the selection and the message buffer
    /// are cleared together before the list is reloaded.
    /// Post-condition: `sessions` equals the list for the current scope
    /// fetched after the DELETE.
    pub async fn delete_session(&self, id: &str, force: bool) -> Result<()> {
        tracing::info!("Deleting session: {} (force={})", id, force);

        let scope = self.store.read(|s| s.scope.clone());
        let api = &self.api;
        self.store
            .run(
                "delete_session",
                async move {
                    api.delete(&["sessions", id], &[("force", force)]).await?;

                    if self.current_session_id().as_deref() == Some(id) {
                        self.clear_chat();
                    }

                    self.fetch_sessions(&scope).await
                },
                |s, sessions| s.sessions = sessions,
            )
            .await?;

        tracing::info!("Session deleted successfully: {}", id);
        Ok(())
    }

    /// Fetch the messages of a session into the buffer
    pub async fn load_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        self.store
            .run(
                "load_messages",
                self.fetch_messages(session_id),
                |s, messages| {
                    s.messages = messages.clone();
                    messages
                },
            )
            .await
    }

    /// Append a message to a session.
    ///
    /// Post-condition: `messages` equals the session's message list fetched
    /// after the POST.
    pub async fn send_message(&self, session_id: &str, message: NewMessage) -> Result<Message> {
        tracing::debug!("Sending {:?} message to session {}", message.role, session_id);

        let api = &self.api;
        self.store
            .run(
                "send_message",
                async move {
                    let created: Message = api
                        .post(&["sessions", session_id, "messages"], &message)
                        .await?;
                    let messages = self.fetch_messages(session_id).await?;
                    Ok((created, messages))
                },
                |s, (created, messages)| {
                    s.messages = messages;
                    created
                },
            )
            .await
    }

    async fn load_scope(&self, scope: SessionScope) -> Result<Vec<ChatSession>> {
        let list_scope = scope.clone();
        self.store
            .run(
                "load_sessions",
                async move { self.fetch_sessions(&list_scope).await },
                |s, sessions| {
                    s.sessions = sessions.clone();
                    s.scope = scope;
                    sessions
                },
            )
            .await
    }

    async fn fetch_sessions(&self, scope: &SessionScope) -> Result<Vec<ChatSession>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(project_id) = &scope.project_id {
            query.push(("project_id", project_id.clone()));
        }
        query.push(("include_inactive", scope.include_inactive.to_string()));

        self.api.get_with_query(&["sessions"], &query).await
    }

    async fn fetch_messages(&self, session_id: &str) -> Result<Vec<Message>> {
        self.api.get(&["sessions", session_id, "messages"]).await
    }

    fn persist_selection(&self, current_session_id: Option<String>) {
        let selection = current_session_id.map(|id| SessionSelection {
            current_session_id: Some(id),
        });
        persist_or_forget(&self.storage, selection);
    }
}
