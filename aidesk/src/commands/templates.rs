//! Template insertion
//!
//! Inserting a template is a two-step flow. `begin_insertion` asks the
//! backend for the template's placeholders; with none, the content is
//! ready immediately. Otherwise the caller collects a value for every
//! placeholder and submits them to get the substituted content.

use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::models::{ActivityAction, TargetKind};
use std::collections::HashMap;

/// Outcome of starting a template insertion
#[derive(Debug, Clone, PartialEq)]
pub enum Insertion {
    /// Content ready to be inserted into the composer
    Ready(String),
    /// Parameters must be collected first
    NeedsParameters(PendingInsertion),
}

/// A template waiting for its placeholder values
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInsertion {
    template_id: String,
    placeholders: Vec<String>,
}

impl PendingInsertion {
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Placeholders without a value in `parameters`; empty values count as given
    pub fn missing(&self, parameters: &HashMap<String, String>) -> Vec<String> {
        self.placeholders
            .iter()
            .filter(|name| !parameters.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    /// Substitute the collected values. Fails without a request when any
    /// placeholder has no value.
    pub async fn submit(
        &self,
        state: &AppState,
        parameters: &HashMap<String, String>,
    ) -> Result<String> {
        let missing = self.missing(parameters);
        if !missing.is_empty() {
            return Err(AppError::MissingParameters(missing));
        }

        let content = state
            .templates
            .substitute(&self.template_id, parameters)
            .await?;
        record_use(state, &self.template_id);
        Ok(content)
    }
}

/// Start inserting a template
pub async fn begin_insertion(state: &AppState, template_id: &str) -> Result<Insertion> {
    let placeholders = state.templates.get_placeholders(template_id).await?;

    if placeholders.is_empty() {
        let content = state
            .templates
            .substitute(template_id, &HashMap::new())
            .await?;
        record_use(state, template_id);
        return Ok(Insertion::Ready(content));
    }

    tracing::debug!(
        "Template {} needs {} parameters",
        template_id,
        placeholders.len()
    );
    Ok(Insertion::NeedsParameters(PendingInsertion {
        template_id: template_id.to_string(),
        placeholders,
    }))
}

fn record_use(state: &AppState, template_id: &str) {
    let title = state
        .templates
        .get_template(template_id)
        .map(|t| t.name)
        .unwrap_or_else(|| template_id.to_string());
    state
        .user_state
        .record_activity(ActivityAction::Used, TargetKind::Template, template_id, &title);
}

/// Message draft being composed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Composer {
    draft: String,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_empty(&self) -> bool {
        self.draft.trim().is_empty()
    }

    /// Append text to the draft on a new line
    pub fn insert(&mut self, text: &str) {
        if !self.draft.is_empty() && !self.draft.ends_with('\n') {
            self.draft.push('\n');
        }
        self.draft.push_str(text);
    }

    /// Take the draft for sending, leaving the composer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }
}
