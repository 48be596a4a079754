//! Projects store
//!
//! Owns the project list, the project tree and the current project.
//! Only the current project id is persisted.

use super::{ActionStatus, Store, StoreState};
use crate::api::ApiClient;
use crate::config::PROJECT_SELECTION_KEY;
use crate::error::Result;
use crate::models::{CreateProjectRequest, Project, ProjectTreeNode, UpdateProjectRequest};
use crate::storage::local_store::persist_or_forget;
use crate::storage::{LocalStorage, Persist};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct ProjectsState {
    pub projects: Vec<Project>,
    pub tree: Vec<ProjectTreeNode>,
    /// Set once the tree has been fetched; mutations then reload it too
    pub tree_loaded: bool,
    pub current_project_id: Option<String>,
    pub status: ActionStatus,
}

impl StoreState for ProjectsState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProjectSelection {
    current_project_id: Option<String>,
}

impl Persist for ProjectSelection {
    const KEY: &'static str = PROJECT_SELECTION_KEY;
    const VERSION: u32 = 1;
}

#[derive(Clone)]
pub struct ProjectsStore {
    store: Store<ProjectsState>,
    api: ApiClient,
    storage: LocalStorage,
}

impl ProjectsStore {
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        let selection = storage.load::<ProjectSelection>().unwrap_or_default();
        let state = ProjectsState {
            current_project_id: selection.current_project_id,
            ..Default::default()
        };

        Self {
            store: Store::new(state),
            api,
            storage,
        }
    }

    pub fn state(&self) -> ProjectsState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProjectsState> {
        self.store.subscribe()
    }

    pub fn set_projects(&self, projects: Vec<Project>) {
        self.store.update(|s| s.projects = projects);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.set_error(error);
    }

    /// Change the current project and persist the choice
    pub fn select_project(&self, project_id: Option<String>) {
        tracing::debug!("Selecting project: {:?}", project_id);
        self.store.update(|s| s.current_project_id = project_id.clone());
        let selection = project_id.map(|id| ProjectSelection {
            current_project_id: Some(id),
        });
        persist_or_forget(&self.storage, selection);
    }

    pub fn current_project_id(&self) -> Option<String> {
        self.store.read(|s| s.current_project_id.clone())
    }

    pub fn current_project(&self) -> Option<Project> {
        self.store.read(|s| {
            let id = s.current_project_id.as_deref()?;
            s.projects.iter().find(|p| p.id == id).cloned()
        })
    }

    /// Look up a loaded project by id
    pub fn get_project(&self, id: &str) -> Option<Project> {
        self.store.read(|s| s.projects.iter().find(|p| p.id == id).cloned())
    }

    /// Fetch all projects
    pub async fn load_projects(&self) -> Result<Vec<Project>> {
        self.store
            .run("load_projects", self.fetch_projects(), |s, projects| {
                s.projects = projects.clone();
                projects
            })
            .await
    }

    /// Re-fetch the project list; the post-condition of every mutation
    pub async fn reload(&self) -> Result<Vec<Project>> {
        self.load_projects().await
    }

    /// Fetch the nested project tree
    pub async fn load_tree(&self) -> Result<Vec<ProjectTreeNode>> {
        self.store
            .run(
                "load_project_tree",
                self.fetch_tree(),
                |s, tree| {
                    s.tree = tree.clone();
                    s.tree_loaded = true;
                    tree
                },
            )
            .await
    }

    /// Create a project.
    ///
    /// Post-condition: `projects` equals the list fetched after the POST,
    /// and `tree` the tree fetched after it once a tree has been loaded.
    pub async fn create_project(&self, req: CreateProjectRequest) -> Result<Project> {
        tracing::info!("Creating project: {}", req.name);

        let with_tree = self.store.read(|s| s.tree_loaded);
        let api = &self.api;
        let created = self
            .store
            .run(
                "create_project",
                async move {
                    let created: Project = api.post(&["projects"], &req).await?;
                    let reloaded = self.fetch_after_mutation(with_tree).await?;
                    Ok((created, reloaded))
                },
                |s, (created, reloaded)| {
                    reloaded.apply(s);
                    created
                },
            )
            .await?;

        tracing::info!("Project created successfully: {}", created.id);
        Ok(created)
    }

    /// Update a project.
    ///
    /// Post-condition: `projects` (and a loaded `tree`) equal what the
    /// backend returns after the PUT.
    pub async fn update_project(&self, id: &str, req: UpdateProjectRequest) -> Result<Project> {
        tracing::info!("Updating project: {}", id);

        let with_tree = self.store.read(|s| s.tree_loaded);
        let api = &self.api;
        self.store
            .run(
                "update_project",
                async move {
                    let updated: Project = api.put(&["projects", id], &req).await?;
                    let reloaded = self.fetch_after_mutation(with_tree).await?;
                    Ok((updated, reloaded))
                },
                |s, (updated, reloaded)| {
                    reloaded.apply(s);
                    updated
                },
            )
            .await
    }

    /// Delete a project; `force` cascades to children on the backend.
    ///
    /// Post-condition: `projects` (and a loaded `tree`) equal what the
    /// backend returns after the DELETE.
    /// A selection pointing at the deleted project is cleared.
    pub async fn delete_project(&self, id: &str, force: bool) -> Result<()> {
        tracing::info!("Deleting project: {} (force={})", id, force);

        let with_tree = self.store.read(|s| s.tree_loaded);
        let api = &self.api;
        let was_current = self
            .store
            .run(
                "delete_project",
                async move {
                    api.delete(&["projects", id], &[("force", force)]).await?;
                    self.fetch_after_mutation(with_tree).await
                },
                |s, reloaded| {
                    reloaded.apply(s);
                    s.current_project_id.as_deref() == Some(id)
                },
            )
            .await?;

        if was_current {
            self.select_project(None);
        }

        tracing::info!("Project deleted successfully: {}", id);
        Ok(())
    }

    async fn fetch_projects(&self) -> Result<Vec<Project>> {
        self.api.get(&["projects"]).await
    }

    async fn fetch_tree(&self) -> Result<Vec<ProjectTreeNode>> {
        self.api.get(&["projects", "tree"]).await
    }

    /// List reload after a mutation, plus the tree when one is displayed
    async fn fetch_after_mutation(&self, with_tree: bool) -> Result<Reloaded> {
        let projects = self.fetch_projects().await?;
        let tree = if with_tree {
            Some(self.fetch_tree().await?)
        } else {
            None
        };
        Ok(Reloaded { projects, tree })
    }
}

struct Reloaded {
    projects: Vec<Project>,
    tree: Option<Vec<ProjectTreeNode>>,
}

impl Reloaded {
    fn apply(self, state: &mut ProjectsState) {
        state.projects = self.projects;
        if let Some(tree) = self.tree {
            state.tree = tree;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::stores::test_support::{api_for, project_json, temp_storage};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_create_project_posts_then_reloads() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        Mock::given(method("POST"))
            .and(path("/api/projects"))
            .and(body_json(json!({"name": "Research"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(project_json("p2", "Research")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                project_json("default", "Default"),
                project_json("p2", "Research"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        let created = store
            .create_project(CreateProjectRequest::named("Research"))
            .await
            .unwrap();

        assert_eq!(created.id, "p2");
        let state = store.state();
        let names: Vec<_> = state.projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Default", "Research"]);
        assert!(!state.status.loading);
        assert!(state.status.error.is_none());

        let requests = server.received_requests().await.unwrap();
        let sequence: Vec<_> = requests.iter().map(|r| r.method.to_string()).collect();
        assert_eq!(sequence, vec!["POST", "GET"]);
    }

    #[tokio::test]
    async fn test_create_child_project_reloads_loaded_tree() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        let mut root = project_json("default", "Default");
        root["children"] = json!([project_json("p2", "Research")]);

        Mock::given(method("GET"))
            .and(path("/api/projects/tree"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([project_json("default", "Default")])),
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
            .and(body_json(json!({"name": "Research", "parent_id": "default"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(project_json("p2", "Research")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                project_json("default", "Default"),
                project_json("p2", "Research"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        store.load_tree().await.unwrap();
        assert_eq!(store.state().tree[0].subtree_size(), 1);

        store
            .create_project(CreateProjectRequest {
                name: "Research".to_string(),
                description: None,
                parent_id: Some("default".to_string()),
            })
            .await
            .unwrap();

        let state = store.state();
        assert_eq!(state.projects.len(), 2);
        assert_eq!(state.tree[0].subtree_size(), 2);
        assert_eq!(state.tree[0].find("p2").unwrap().project.name, "Research");

        let requests = server.received_requests().await.unwrap();
        let sequence: Vec<_> = requests
            .iter()
            .map(|r| format!("{} {}", r.method, r.url.path()))
            .collect();
        assert_eq!(
            sequence,
            vec![
                "GET /api/projects/tree",
                "POST /api/projects",
                "GET /api/projects",
                "GET /api/projects/tree",
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_project_prunes_loaded_tree() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        let mut root = project_json("default", "Default");
        root["children"] = json!([project_json("p2", "Research")]);

        Mock::given(method("GET"))
            .and(path("/api/projects/tree"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([root])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects/tree"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([project_json("default", "Default")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/projects/p2"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([project_json("default", "Default")])),
            )
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        store.load_tree().await.unwrap();
        assert!(store.state().tree[0].find("p2").is_some());

        store.delete_project("p2", true).await.unwrap();

        let tree = store.state().tree;
        assert!(tree[0].find("p2").is_none());
        assert_eq!(tree[0].subtree_size(), 1);
    }

    #[tokio::test]
    async fn test_failed_create_sets_error_and_reraises() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        Mock::given(method("POST"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "Name already exists"})),
            )
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        let err = store
            .create_project(CreateProjectRequest::named("Dup"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Api { status: 422, .. }));
        let state = store.state();
        assert!(!state.status.loading);
        assert_eq!(
            state.status.error.as_deref(),
            Some("Request failed with status 422: Name already exists")
        );
    }

    #[tokio::test]
    async fn test_delete_current_project_clears_selection() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        Mock::given(method("DELETE"))
            .and(path("/api/projects/p2"))
            .and(query_param("force", "true"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([project_json("default", "Default")])),
            )
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        store.select_project(Some("p2".to_string()));

        store.delete_project("p2", true).await.unwrap();

        let state = store.state();
        assert_eq!(state.projects.len(), 1);
        assert!(state.current_project_id.is_none());
    }

    #[tokio::test]
    async fn test_update_project_reloads_list() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        Mock::given(method("PUT"))
            .and(path("/api/projects/p2"))
            .and(body_json(json!({"name": "Renamed"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(project_json("p2", "Renamed")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/projects"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([project_json("p2", "Renamed")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        let req = UpdateProjectRequest {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        store.update_project("p2", req).await.unwrap();

        assert_eq!(store.get_project("p2").unwrap().name, "Renamed");
        let requests = server.received_requests().await.unwrap();
        let sequence: Vec<_> = requests.iter().map(|r| r.method.to_string()).collect();
        assert_eq!(sequence, vec!["PUT", "GET"]);
    }

    #[tokio::test]
    async fn test_load_tree() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        let mut root = project_json("default", "Default");
        root["children"] = json!([project_json("child", "Child")]);
        Mock::given(method("GET"))
            .and(path("/api/projects/tree"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([root])))
            .mount(&server)
            .await;

        let store = ProjectsStore::new(api_for(&server), storage);
        let tree = store.load_tree().await.unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].children[0].project.id, "child");
        assert_eq!(store.state().tree, tree);
    }

    #[tokio::test]
    async fn test_selection_survives_restart() {
        let server = MockServer::start().await;
        let (storage, _temp) = temp_storage();

        {
            let store = ProjectsStore::new(api_for(&server), storage.clone());
            store.select_project(Some("p9".to_string()));
        }

        let store = ProjectsStore::new(api_for(&server), storage);
        assert_eq!(store.current_project_id().as_deref(), Some("p9"));
        assert!(store.state().projects.is_empty());
    }
}
