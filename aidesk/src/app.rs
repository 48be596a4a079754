//! Application state and initialization
//!
//! `AppState` is the composition root: it owns the HTTP client, local
//! storage and every store, and is passed explicitly to the commands layer.

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::storage::LocalStorage;
use crate::stores::{
    ChatSessionsStore, ProjectsStore, ProvidersStore, SettingsStore, TemplatesStore,
    UserStateStore,
};

/// Central application state holding all stores
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub storage: LocalStorage,
    pub settings: SettingsStore,
    pub projects: ProjectsStore,
    pub sessions: ChatSessionsStore,
    pub providers: ProvidersStore,
    pub templates: TemplatesStore,
    pub user_state: UserStateStore,
}

impl AppState {
    /// Build every store; persisted selections are read here, once
    pub fn setup(config: ClientConfig) -> Result<Self> {
        tracing::info!("Initializing application");
        tracing::info!("Data directory: {:?}", config.data_dir);

        std::fs::create_dir_all(&config.data_dir)?;

        let storage = LocalStorage::new(config.data_dir.join("storage"));
        storage.initialize()?;

        let api = ApiClient::new(&config)?;

        let state = Self {
            settings: SettingsStore::new(api.clone(), storage.clone()),
            projects: ProjectsStore::new(api.clone(), storage.clone()),
            sessions: ChatSessionsStore::new(api.clone(), storage.clone()),
            providers: ProvidersStore::new(api.clone(), storage.clone()),
            templates: TemplatesStore::new(api.clone(), storage.clone()),
            user_state: UserStateStore::new(storage.clone()),
            config,
            api,
            storage,
        };

        tracing::info!("Application initialized successfully");

        Ok(state)
    }
}
