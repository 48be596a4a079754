//! Providers store
//!
//! The provider catalog is a fixed in-memory seed. Credentials are sent to
//! the backend's secret store and kept in memory only; the persisted blob
//! holds nothing but the current provider id.

use super::{ActionStatus, Store, StoreState};
use crate::api::{ApiClient, NO_QUERY};
use crate::config::PROVIDER_SELECTION_KEY;
use crate::error::{AppError, Result};
use crate::models::{seed_providers, AIProvider, ProviderConfig, ProviderConfigStatus};
use crate::storage::local_store::persist_or_forget;
use crate::storage::{LocalStorage, Persist};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct ProvidersState {
    pub providers: Vec<AIProvider>,
    pub current_provider_id: Option<String>,
    /// Configs saved during this run, keyed by provider id
    pub provider_configs: HashMap<String, ProviderConfig>,
    /// What the backend reports for each provider
    pub config_status: HashMap<String, ProviderConfigStatus>,
    pub status: ActionStatus,
}

impl StoreState for ProvidersState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

/// Persisted subset of provider state. Has no room for credentials.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ProviderSelection {
    current_provider_id: Option<String>,
}

impl Persist for ProviderSelection {
    const KEY: &'static str = PROVIDER_SELECTION_KEY;
    const VERSION: u32 = 1;
}

#[derive(Clone)]
pub struct ProvidersStore {
    store: Store<ProvidersState>,
    api: ApiClient,
    storage: LocalStorage,
}

impl ProvidersStore {
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        let selection = storage.load::<ProviderSelection>().unwrap_or_default();
        let state = ProvidersState {
            current_provider_id: selection.current_provider_id,
            ..Default::default()
        };

        Self {
            store: Store::new(state),
            api,
            storage,
        }
    }

    pub fn state(&self) -> ProvidersState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProvidersState> {
        self.store.subscribe()
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.set_error(error);
    }

    pub fn select_provider(&self, provider_id: Option<String>) {
        tracing::debug!("Selecting provider: {:?}", provider_id);
        self.store.update(|s| s.current_provider_id = provider_id.clone());
        let selection = provider_id.map(|id| ProviderSelection {
            current_provider_id: Some(id),
        });
        persist_or_forget(&self.storage, selection);
    }

    pub fn current_provider(&self) -> Option<AIProvider> {
        self.store.read(|s| {
            let id = s.current_provider_id.as_deref()?;
            s.providers.iter().find(|p| p.id == id).cloned()
        })
    }

    pub fn get_provider(&self, id: &str) -> Option<AIProvider> {
        self.store.read(|s| s.providers.iter().find(|p| p.id == id).cloned())
    }

    /// Opaque "has credentials" signal for display purposes
    pub fn is_configured(&self, provider_id: &str) -> bool {
        self.store.read(|s| {
            s.provider_configs.contains_key(provider_id)
                || s.config_status
                    .get(provider_id)
                    .is_some_and(|status| status.configured)
        })
    }

    /// Populate the catalog from the built-in seed
    pub async fn load_providers(&self) -> Result<Vec<AIProvider>> {
        self.store
            .run(
                "load_providers",
                async { Ok(seed_providers()) },
                |s, providers| {
                    s.providers = providers.clone();
                    providers
                },
            )
            .await
    }

    /// Add a provider to the in-memory catalog
    pub fn add_provider(&self, provider: AIProvider) -> Result<()> {
        if self.get_provider(&provider.id).is_some() {
            let err = AppError::Validation(format!("Provider '{}' already exists", provider.id));
            self.store.set_error(Some(err.to_string()));
            return Err(err);
        }

        tracing::info!("Adding provider: {}", provider.id);
        self.store.update(|s| s.providers.push(provider));
        Ok(())
    }

    /// Replace a provider in the in-memory catalog
    pub fn update_provider(&self, provider: AIProvider) -> Result<()> {
        let mut found = false;
        self.store.update(|s| {
            if let Some(existing) = s.providers.iter_mut().find(|p| p.id == provider.id) {
                *existing = provider.clone();
                found = true;
            }
        });

        if !found {
            let err = AppError::NotFound(format!("provider {}", provider.id));
            self.store.set_error(Some(err.to_string()));
            return Err(err);
        }
        Ok(())
    }

    /// Remove a provider and forget any in-memory config for it
    pub fn remove_provider(&self, provider_id: &str) {
        tracing::info!("Removing provider: {}", provider_id);

        let was_current = self.store.read(|s| s.current_provider_id.as_deref() == Some(provider_id));
        self.store.update(|s| {
            s.providers.retain(|p| p.id != provider_id);
            s.provider_configs.remove(provider_id);
            s.config_status.remove(provider_id);
        });

        if was_current {
            self.select_provider(None);
        }
    }

    /// Send a provider config to the backend's secret store.
    ///
    /// Failures are soft: the error slice is set, the config map is left as
    /// it was, and `false` is returned. On success the config is merged into
    /// the in-memory map.
    pub async fn save_provider_config(&self, config: ProviderConfig) -> bool {
        let provider_id = config.provider_id.clone();
        tracing::info!("Saving config for provider: {}", provider_id);

        self.store.update(|s| {
            s.status.loading = true;
            s.status.error = None;
        });

        let url = self
            .api
            .url(&["settings", "api-providers", provider_id.as_str()]);

        let outcome = match self
            .api
            .http()
            .put(url)
            .json(&config.to_payload())
            .send()
            .await
        {
            Ok(response) => ApiClient::check(response).await.map(|_| ()),
            Err(e) => Err(AppError::from(e)),
        };

        match outcome {
            Ok(()) => {
                self.store.update(|s| {
                    s.status.loading = false;
                    s.config_status.insert(
                        provider_id.clone(),
                        ProviderConfigStatus {
                            provider_id: provider_id.clone(),
                            configured: true,
                            base_url: config.base_url.clone(),
                            organization_id: config.organization_id.clone(),
                            project_id: config.project_id.clone(),
                            timeout: config.timeout,
                            retry_attempts: config.retry_attempts,
                        },
                    );
                    s.provider_configs.insert(provider_id.clone(), config);
                });
                tracing::info!("Provider config saved: {}", provider_id);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to save provider config for {}: {}", provider_id, e);
                let message = format!("Failed to save provider configuration: {}", e);
                self.store.update(|s| {
                    s.status.loading = false;
                    s.status.error = Some(message);
                });
                false
            }
        }
    }

    /// Ask the backend whether a provider has stored credentials.
    ///
    /// A 404 means "not configured" rather than an error.
    pub async fn load_provider_config(&self, provider_id: &str) -> Result<ProviderConfigStatus> {
        let api = &self.api;
        self.store
            .run(
                "load_provider_config",
                async move {
                    match api
                        .get::<ProviderConfigStatus>(&["settings", "api-providers", provider_id])
                        .await
                    {
                        Ok(mut status) => {
                            status.provider_id = provider_id.to_string();
                            Ok(status)
                        }
                        Err(AppError::Api { status: 404, .. }) => Ok(ProviderConfigStatus {
                            provider_id: provider_id.to_string(),
                            configured: false,
                            base_url: None,
                            organization_id: None,
                            project_id: None,
                            timeout: None,
                            retry_attempts: None,
                        }),
                        Err(e) => Err(e),
                    }
                },
                |s, status| {
                    s.config_status
                        .insert(provider_id.to_string(), status.clone());
                    status
                },
            )
            .await
    }

    /// Remove a provider's credentials from the backend
    pub async fn delete_provider_config(&self, provider_id: &str) -> Result<()> {
        tracing::info!("Deleting config for provider: {}", provider_id);

        let api = &self.api;
        self.store
            .run(
                "delete_provider_config",
                async move {
                    api.delete(&["settings", "api-providers", provider_id], NO_QUERY)
                        .await
                },
                |s, ()| {
                    s.provider_configs.remove(provider_id);
                    s.config_status.remove(provider_id);
                },
            )
            .await
    }
}
