//! Credential holder
//!
//! `ApiKey` deliberately implements neither `Serialize` nor `Display`.
//! Anything that must be written to local storage has to be `Serialize`
//! (see `storage::Persist`), so a struct carrying an `ApiKey` cannot be
//! persisted. The key leaves the process only through `expose()`, which
//! the provider config payload calls when talking to the backend.

use crate::error::{AppError, Result};
use std::fmt;
use std::io::BufRead;

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for the backend request body only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Read a key from the first line of `reader`, such as piped stdin
    pub fn read_from(mut reader: impl BufRead) -> Result<Self> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        Self::non_empty(line.trim().to_string())
    }

    /// Read a key from an environment variable
    pub fn from_env(var: &str) -> Result<Self> {
        let value = std::env::var(var)
            .map_err(|_| AppError::Validation(format!("{} is not set", var)))?;
        Self::non_empty(value.trim().to_string())
    }

    fn non_empty(key: String) -> Result<Self> {
        if key.is_empty() {
            return Err(AppError::Validation("API key cannot be empty".to_string()));
        }
        Ok(Self(key))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
