use crate::secret::ApiKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An external AI model vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIProvider {
    pub id: String,
    /// Machine key, e.g. "openai"
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub models: Vec<AIModel>,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AIProvider {
    pub fn default_model(&self) -> Option<&AIModel> {
        self.models
            .iter()
            .find(|m| m.is_default)
            .or_else(|| self.models.first())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AIModel {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub is_default: bool,
}

impl AIModel {
    fn new(id: &str, display_name: &str, max_tokens: u32, is_default: bool) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            display_name: display_name.to_string(),
            max_tokens: Some(max_tokens),
            is_default,
        }
    }
}

/// Fixed provider catalog used until the backend serves one
pub fn seed_providers() -> Vec<AIProvider> {
    let now = Utc::now();
    vec![
        AIProvider {
            id: "openai-1".to_string(),
            name: "openai".to_string(),
            display_name: "OpenAI".to_string(),
            description: "GPT models from OpenAI".to_string(),
            base_url: Some("https://api.openai.com/v1".to_string()),
            models: vec![
                AIModel::new("gpt-4o", "GPT-4o", 128_000, true),
                AIModel::new("gpt-4o-mini", "GPT-4o mini", 128_000, false),
                AIModel::new("gpt-4-turbo", "GPT-4 Turbo", 128_000, false),
            ],
            is_active: true,
            created_at: now,
            updated_at: now,
        },
        AIProvider {
            id: "anthropic-1".to_string(),
            name: "anthropic".to_string(),
            display_name: "Anthropic".to_string(),
            description: "Claude models from Anthropic".to_string(),
            base_url: Some("https://api.anthropic.com".to_string()),
            models: vec![
                AIModel::new("claude-3-5-sonnet-latest", "Claude 3.5 Sonnet", 200_000, true),
                AIModel::new("claude-3-5-haiku-latest", "Claude 3.5 Haiku", 200_000, false),
                AIModel::new("claude-3-opus-latest", "Claude 3 Opus", 200_000, false),
            ],
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    ]
}

/// Credentials and connection options for one provider.
///
/// Not `Serialize`: it holds an `ApiKey`. The backend payload is built
/// explicitly with `to_payload`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub provider_id: String,
    pub api_key: ApiKey,
    pub base_url: Option<String>,
    pub organization_id: Option<String>,
    pub project_id: Option<String>,
    pub timeout: Option<u64>,
    pub retry_attempts: Option<u32>,
}

impl ProviderConfig {
    pub fn new(provider_id: impl Into<String>, api_key: impl Into<ApiKey>) -> Self {
        Self {
            provider_id: provider_id.into(),
            api_key: api_key.into(),
            base_url: None,
            organization_id: None,
            project_id: None,
            timeout: None,
            retry_attempts: None,
        }
    }

    pub fn to_payload(&self) -> ProviderConfigPayload<'_> {
        ProviderConfigPayload {
            provider_id: &self.provider_id,
            api_key: self.api_key.expose(),
            base_url: self.base_url.as_deref(),
            organization_id: self.organization_id.as_deref(),
            project_id: self.project_id.as_deref(),
            timeout: self.timeout,
            retry_attempts: self.retry_attempts,
        }
    }
}

/// Request body for `PUT /settings/api-providers/{providerId}`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigPayload<'a> {
    pub provider_id: &'a str,
    pub api_key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<u32>,
}

/// What the backend reports back about a stored config. Never carries the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigStatus {
    #[serde(default)]
    pub provider_id: String,
    #[serde(default)]
    pub configured: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub retry_attempts: Option<u32>,
}
