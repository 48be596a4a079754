//! Templates store
//!
//! Placeholder extraction and substitution happen on the backend; this
//! store only fetches placeholder names and requests substitutions.

use super::{ActionStatus, Store, StoreState};
use crate::api::ApiClient;
use crate::config::TEMPLATE_SELECTION_KEY;
use crate::error::Result;
use crate::models::{
    CreateTemplateRequest, MessageTemplate, PlaceholdersResponse, SubstituteRequest,
    SubstituteResponse, TemplateFilter, UpdateTemplateRequest,
};
use crate::storage::local_store::persist_or_forget;
use crate::storage::{LocalStorage, Persist};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::watch;

#[derive(Debug, Clone, Default)]
pub struct TemplatesState {
    pub templates: Vec<MessageTemplate>,
    pub categories: Vec<String>,
    pub current_template_id: Option<String>,
    /// Filter of the loaded list; mutations reload with it
    pub filter: TemplateFilter,
    pub status: ActionStatus,
}

impl StoreState for TemplatesState {
    fn status(&self) -> &ActionStatus {
        &self.status
    }
    fn status_mut(&mut self) -> &mut ActionStatus {
        &mut self.status
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateSelection {
    current_template_id: Option<String>,
}

impl Persist for TemplateSelection {
    const KEY: &'static str = TEMPLATE_SELECTION_KEY;
    const VERSION: u32 = 1;
}

#[derive(Clone)]
pub struct TemplatesStore {
    store: Store<TemplatesState>,
    api: ApiClient,
    storage: LocalStorage,
}

impl TemplatesStore {
    pub fn new(api: ApiClient, storage: LocalStorage) -> Self {
        let selection = storage.load::<TemplateSelection>().unwrap_or_default();
        let state = TemplatesState {
            current_template_id: selection.current_template_id,
            ..Default::default()
        };

        Self {
            store: Store::new(state),
            api,
            storage,
        }
    }

    pub fn state(&self) -> TemplatesState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<TemplatesState> {
        self.store.subscribe()
    }

    pub fn set_templates(&self, templates: Vec<MessageTemplate>) {
        self.store.update(|s| s.templates = templates);
    }

    pub fn set_error(&self, error: Option<String>) {
        self.store.set_error(error);
    }

    pub fn select_template(&self, template_id: Option<String>) {
        self.store.update(|s| s.current_template_id = template_id.clone());
        let selection = template_id.map(|id| TemplateSelection {
            current_template_id: Some(id),
        });
        persist_or_forget(&self.storage, selection);
    }

    pub fn current_template(&self) -> Option<MessageTemplate> {
        self.store.read(|s| {
            let id = s.current_template_id.as_deref()?;
            s.templates.iter().find(|t| t.id == id).cloned()
        })
    }

    pub fn get_template(&self, id: &str) -> Option<MessageTemplate> {
        self.store.read(|s| s.templates.iter().find(|t| t.id == id).cloned())
    }

    /// Fetch templates matching a filter; the filter becomes the reload scope
    pub async fn load_templates(&self, filter: TemplateFilter) -> Result<Vec<MessageTemplate>> {
        let query_filter = filter.clone();
        self.store
            .run(
                "load_templates",
                async move { self.fetch_templates(&query_filter).await },
                |s, templates| {
                    s.templates = templates.clone();
                    s.filter = filter;
                    templates
                },
            )
            .await
    }

    /// Re-fetch templates with the filter currently in effect
    pub async fn reload(&self) -> Result<Vec<MessageTemplate>> {
        let filter = self.store.read(|s| s.filter.clone());
        self.load_templates(filter).await
    }

    pub async fn load_categories(&self) -> Result<Vec<String>> {
        let api = &self.api;
        self.store
            .run(
                "load_template_categories",
                async move { api.get::<Vec<String>>(&["templates", "categories"]).await },
                |s, categories| {
                    s.categories = categories.clone();
                    categories
                },
            )
            .await
    }

    /// Create a template.
    ///
    /// Post-condition: `templates` equals the list for the current filter
    /// fetched after the POST.
    pub async fn create_template(&self, req: CreateTemplateRequest) -> Result<MessageTemplate> {
        tracing::info!("Creating template: {}", req.name);

        let filter = self.store.read(|s| s.filter.clone());
        let api = &self.api;
        self.store
            .run(
                "create_template",
                async move {
                    let created: MessageTemplate = api.post(&["templates"], &req).await?;
                    let templates = self.fetch_templates(&filter).await?;
                    Ok((created, templates))
                },
                |s, (created, templates)| {
                    s.templates = templates;
                    created
                },
            )
            .await
    }

    /// Update a template.
    ///
    /// Post-condition: `templates` equals the list for the current filter
    /// fetched after the PUT.
    pub async fn update_template(
        &self,
        id: &str,
        req: UpdateTemplateRequest,
    ) -> Result<MessageTemplate> {
        tracing::info!("Updating template: {}", id);

        let filter = self.store.read(|s| s.filter.clone());
        let api = &self.api;
        self.store
            .run(
                "update_template",
                async move {
                    let updated: MessageTemplate = api.put(&["templates", id], &req).await?;
                    let templates = self.fetch_templates(&filter).await?;
                    Ok((updated, templates))
                },
                |s, (updated, templates)| {
                    s.templates = templates;
                    updated
                },
            )
            .await
    }

    /// Delete a template.
    ///
    /// Post-condition: `templates` equals the list for the current filter
    /// fetched after the DELETE.
    pub async fn delete_template(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting template: {}", id);

        let filter = self.store.read(|s| s.filter.clone());
        let api = &self.api;
        let was_current = self
            .store
            .run(
                "delete_template",
                async move {
                    api.delete(&["templates", id], crate::api::NO_QUERY).await?;
                    self.fetch_templates(&filter).await
                },
                |s, templates| {
                    s.templates = templates;
                    s.current_template_id.as_deref() == Some(id)
                },
            )
            .await?;

        if was_current {
            self.select_template(None);
        }
        Ok(())
    }

    /// Placeholder names the backend found in a template
    pub async fn get_placeholders(&self, id: &str) -> Result<Vec<String>> {
        let api = &self.api;
        self.store
            .run(
                "get_template_placeholders",
                async move {
                    api.get::<PlaceholdersResponse>(&["templates", id, "placeholders"])
                        .await
                },
                |_, response| response.placeholders,
            )
            .await
    }

    /// Ask the backend to fill a template's placeholders
    pub async fn substitute(&self, id: &str, parameters: &HashMap<String, String>) -> Result<String> {
        tracing::debug!("Substituting template {} ({} parameters)", id, parameters.len());

        let api = &self.api;
        self.store
            .run(
                "substitute_template",
                async move {
                    api.post::<_, SubstituteResponse>(
                        &["templates", id, "substitute"],
                        &SubstituteRequest { parameters },
                    )
                    .await
                },
                |_, response| response.content,
            )
            .await
    }

    async fn fetch_templates(&self, filter: &TemplateFilter) -> Result<Vec<MessageTemplate>> {
        self.api.get_with_query(&["templates"], filter).await
    }
}
