//! HTTP client for the REST backend
//!
//! Wraps one `reqwest::Client` with JSON headers and a fixed base URL.
//! Paths are built from segments so ids are percent-encoded.

use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Empty query string for `get_with_query`/`delete`
pub const NO_QUERY: &[(&str, &str)] = &[];

/// Shared backend client
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| AppError::InvalidUrl(format!("{}: {}", config.api_base_url, e)))?;

        if base_url.cannot_be_a_base() {
            return Err(AppError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.api_base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let http = builder.build()?;

        tracing::info!("API client configured for {}", base_url);

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Underlying HTTP client, for callers that handle responses themselves
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Build an absolute URL from path segments under the base URL
    pub fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `new` rejects cannot-be-a-base URLs, so this always succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.get_with_query(segments, NO_QUERY).await
    }

    pub async fn get_with_query<T, Q>(&self, segments: &[&str], query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments);
        tracing::debug!("GET {}", url);

        let response = self.http.get(url).query(query).send().await?;
        Self::parse(response).await
    }

    pub async fn post<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        tracing::debug!("POST {}", url);

        let response = self.http.post(url).json(body).send().await?;
        Self::parse(response).await
    }

    pub async fn put<B, T>(&self, segments: &[&str], body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        tracing::debug!("PUT {}", url);

        let response = self.http.put(url).json(body).send().await?;
        Self::parse(response).await
    }

    /// DELETE a resource; any response body is ignored
    pub async fn delete<Q>(&self, segments: &[&str], query: &Q) -> Result<()>
    where
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments);
        tracing::debug!("DELETE {}", url);

        let response = self.http.delete(url).query(query).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Turn a non-2xx response into `AppError::Api`
    pub async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);

        tracing::debug!("Backend rejected request ({}): {}", status, message);

        Err(AppError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// Pull a readable message out of an error body
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        trimmed.to_string()
    }
}
