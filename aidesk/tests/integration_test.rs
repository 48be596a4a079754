//! Integration tests for aidesk
//!
//! These tests drive the commands layer against a mock backend:
//! - Default project protection
//! - Project switching and the session cascade
//! - Template insertion with and without placeholders
//! - Settings import and export files

use aidesk::app::AppState;
use aidesk::commands::{self, Composer, Insertion};
use aidesk::config::ClientConfig;
use aidesk::error::AppError;
use aidesk::models::{Message, MessageRole, Theme};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TS: &str = "2026-03-01T10:00:00Z";

/// Helper to create app state backed by a mock server and a temp data dir
async fn create_test_state() -> (AppState, MockServer, TempDir) {
    let server = MockServer::start().await;
    let temp_dir = TempDir::new().unwrap();
    let config = ClientConfig::new(format!("{}/api", server.uri()), temp_dir.path());
    let state = AppState::setup(config).unwrap();

    (state, server, temp_dir)
}

fn project_json(id: &str, name: &str) -> Value {
    json!({"id": id, "name": name, "created_at": TS, "updated_at": TS})
}

fn session_json(id: &str, project_id: &str, title: &str, updated_at: &str) -> Value {
    json!({
        "id": id,
        "project_id": project_id,
        "title": title,
        "created_at": TS,
        "updated_at": updated_at,
    })
}

fn message_json(id: &str, role: &str, content: &str) -> Value {
    json!({"id": id, "role": role, "content": content, "timestamp": TS})
}

#[tokio::test]
async fn test_default_project_cannot_be_deleted() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_json("default", "Default"),
            project_json("p1", "Research"),
        ])))
        .mount(&server)
        .await;

    state.projects.load_projects().await.unwrap();

    let rows = commands::project_rows(&state);
    let default_row = rows.iter().find(|r| r.project.id == "default").unwrap();
    let other_row = rows.iter().find(|r| r.project.id == "p1").unwrap();
    assert!(!default_row.delete_enabled);
    assert!(other_row.delete_enabled);

    let before = server.received_requests().await.unwrap().len();
    let err = commands::delete_project(&state, "default", true)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::ProtectedProject(_)));
    assert_eq!(server.received_requests().await.unwrap().len(), before);
    assert_eq!(state.projects.state().projects.len(), 2);
}

#[tokio::test]
async fn test_rename_project_puts_then_reloads() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("PUT"))
        .and(path("/api/projects/p1"))
        .and(body_json(json!({"name": "Thesis"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_json("p1", "Thesis")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_json("default", "Default"),
            project_json("p1", "Thesis"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    assert!(matches!(
        commands::rename_project(&state, "p1", "  ").await,
        Err(AppError::Validation(_))
    ));

    let project = commands::rename_project(&state, "p1", " Thesis ").await.unwrap();

    assert_eq!(project.name, "Thesis");
    assert_eq!(state.projects.get_project("p1").unwrap().name, "Thesis");
    assert_eq!(state.user_state.state().recent_activity[0].title, "Thesis");

    let requests = server.received_requests().await.unwrap();
    let sequence: Vec<_> = requests.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(sequence, vec!["PUT", "GET"]);
}

#[tokio::test]
async fn test_switch_project_opens_most_recent_session() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("project_id", "p2"))
        .and(query_param("include_inactive", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json("s2", "p2", "Older", "2026-03-01T10:00:00Z"),
            session_json("s3", "p2", "Newer", "2026-03-05T10:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/s3/messages"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([message_json("m9", "user", "Hello p2")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    // A chat in another project is open
    state.projects.select_project(Some("p1".to_string()));
    state.sessions.select_session(Some("s1".to_string()));
    let stale: Message = serde_json::from_value(message_json("m1", "user", "Hello p1")).unwrap();
    state.sessions.set_messages(vec![stale]);

    let session = commands::switch_project(&state, "p2").await.unwrap();

    assert_eq!(session.id, "s3");
    assert_eq!(state.projects.current_project_id().as_deref(), Some("p2"));

    let sessions = state.sessions.state();
    assert_eq!(sessions.current_session_id.as_deref(), Some("s3"));
    assert_eq!(sessions.sessions.len(), 2);
    assert_eq!(sessions.messages.len(), 1);
    assert_eq!(sessions.messages[0].content, "Hello p2");

    let activity = state.user_state.state().recent_activity;
    assert_eq!(activity[0].target_id, "p2");
}

#[tokio::test]
async fn test_switch_project_clears_chat_before_loading() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("project_id", "p2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([session_json("s2", "p2", "Plan", TS)]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/s2/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    state.sessions.select_session(Some("s1".to_string()));
    let stale: Message = serde_json::from_value(message_json("m1", "user", "Hello p1")).unwrap();
    state.sessions.set_messages(vec![stale]);

    let observer = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        state.sessions.state()
    };
    let (switched, in_flight) = tokio::join!(commands::switch_project(&state, "p2"), observer);

    switched.unwrap();
    assert!(in_flight.status.loading);
    assert!(in_flight.current_session_id.is_none());
    assert!(in_flight.messages.is_empty());
    assert_eq!(state.sessions.current_session_id().as_deref(), Some("s2"));
}

#[tokio::test]
async fn test_switch_to_empty_project_creates_session() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("project_id", "p3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions"))
        .and(body_json(json!({"project_id": "p3", "title": "New Chat"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(session_json("s-new", "p3", "New Chat", TS)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("project_id", "p3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([session_json("s-new", "p3", "New Chat", TS)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/s-new/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let session = commands::switch_project(&state, "p3").await.unwrap();

    assert_eq!(session.id, "s-new");
    assert_eq!(session.title, "New Chat");
    let sessions = state.sessions.state();
    assert_eq!(sessions.current_session_id.as_deref(), Some("s-new"));
    assert_eq!(sessions.sessions.len(), 1);
    assert!(sessions.messages.is_empty());
}

#[tokio::test]
async fn test_send_message_reloads_history() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("POST"))
        .and(path("/api/sessions/s1/messages"))
        .and(body_json(json!({"role": "user", "content": "Hi"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(message_json("m2", "user", "Hi")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/s1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_json("m2", "user", "Hi"),
            message_json("m3", "assistant", "Hello! How can I help?"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    state.sessions.select_session(Some("s1".to_string()));
    let sent = commands::send_user_message(&state, "Hi").await.unwrap();

    assert_eq!(sent.id, "m2");
    let messages = state.sessions.state().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, MessageRole::Assistant);

    assert!(matches!(
        commands::send_user_message(&state, "   ").await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_template_without_placeholders_is_ready() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/templates/t1/placeholders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"placeholders": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/templates/t1/substitute"))
        .and(body_json(json!({"parameters": {}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": "Please summarize."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let insertion = commands::begin_insertion(&state, "t1").await.unwrap();
    let Insertion::Ready(content) = insertion else {
        panic!("expected ready content");
    };

    let mut composer = Composer::new();
    composer.insert(&content);
    assert_eq!(composer.draft(), "Please summarize.");
}

#[tokio::test]
async fn test_template_with_placeholders_requires_all_values() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/templates/t2/placeholders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"placeholders": ["language", "code"]})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/templates/t2/substitute"))
        .and(body_json(json!({"parameters": {"language": "Rust", "code": ""}})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"content": "Review this Rust: "})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let Insertion::NeedsParameters(pending) =
        commands::begin_insertion(&state, "t2").await.unwrap()
    else {
        panic!("expected pending parameters");
    };
    assert_eq!(pending.placeholders(), ["language", "code"]);

    let partial = HashMap::from([("language".to_string(), "Rust".to_string())]);
    match pending.submit(&state, &partial).await {
        Err(AppError::MissingParameters(missing)) => assert_eq!(missing, vec!["code"]),
        other => panic!("expected missing parameters, got {:?}", other),
    }

    let complete = HashMap::from([
        ("language".to_string(), "Rust".to_string()),
        ("code".to_string(), String::new()),
    ]);
    let content = pending.submit(&state, &complete).await.unwrap();
    assert_eq!(content, "Review this Rust: ");
}

#[tokio::test]
async fn test_update_theme_saves_preferences() {
    let (state, server, _temp) = create_test_state().await;

    Mock::given(method("PUT"))
        .and(path("/api/settings/categories/preferences"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let theme: Theme = "Dark".parse().unwrap();
    commands::update_theme(&state, theme).await.unwrap();

    assert_eq!(state.settings.preferences().theme, Theme::Dark);
    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["theme"], "dark");
}

#[tokio::test]
async fn test_import_settings_file_without_sections() {
    let (state, server, temp) = create_test_state().await;

    let document = json!({"version": "1.0", "exported_at": TS});
    Mock::given(method("POST"))
        .and(path("/api/settings/import"))
        .and(body_json(document.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    state.settings.set_theme(Theme::Dark);
    let file = temp.path().join("settings.json");
    std::fs::write(&file, document.to_string()).unwrap();

    commands::import_settings_from_file(&state, &file)
        .await
        .unwrap();

    assert_eq!(state.settings.preferences().theme, Theme::Dark);
    assert!(state.settings.state().status.error.is_none());
}

#[tokio::test]
async fn test_import_invalid_settings_file_sends_nothing() {
    let (state, server, temp) = create_test_state().await;

    let file = temp.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();

    let err = commands::import_settings_from_file(&state, &file)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Parse(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_export_settings_to_file() {
    let (state, server, temp) = create_test_state().await;

    Mock::given(method("GET"))
        .and(path("/api/settings/default/export"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "1.0",
            "preferences": {"theme": "light"},
        })))
        .mount(&server)
        .await;

    let file = temp.path().join("exports").join("settings.json");
    commands::export_settings_to_file(&state, "default", &file)
        .await
        .unwrap();

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(written["preferences"]["theme"], "light");
}

#[tokio::test]
async fn test_navigation_view() {
    let (state, server, _temp) = create_test_state().await;

    let mut root = project_json("default", "Default");
    root["children"] = json!([project_json("p1", "Research")]);
    Mock::given(method("GET"))
        .and(path("/api/projects/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([root])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .and(query_param("project_id", "default"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            session_json("s1", "default", "First", "2026-03-01T10:00:00Z"),
            session_json("s2", "default", "Second", "2026-03-02T10:00:00Z"),
        ])))
        .mount(&server)
        .await;

    state.projects.select_project(Some("default".to_string()));
    state.settings.toggle_sidebar();

    let view = commands::refresh_navigation(&state).await.unwrap();

    assert!(view.sidebar_collapsed);
    assert_eq!(view.project_tree[0].children[0].project.id, "p1");
    assert_eq!(view.current_project_id.as_deref(), Some("default"));
    let titles: Vec<_> = view.recent_sessions.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Second", "First"]);
}

#[tokio::test]
async fn test_navigation_tree_follows_project_creation() {
    let (state, server, _temp) = create_test_state().await;

    let mut root = project_json("default", "Default");
    root["children"] = json!([project_json("p2", "Research")]);

    Mock::given(method("GET"))
        .and(path("/api/projects/tree"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([project_json("default", "Default")])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects/tree"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([root])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(201).set_body_json(project_json("p2", "Research")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            project_json("default", "Default"),
            project_json("p2", "Research"),
        ])))
        .mount(&server)
        .await;

    state.projects.load_tree().await.unwrap();
    commands::create_project(&state, "Research", None, Some("default".to_string()))
        .await
        .unwrap();

    let view = commands::navigation(&state);
    assert_eq!(view.project_tree[0].children.len(), 1);
    assert_eq!(view.project_tree[0].children[0].project.id, "p2");
}
