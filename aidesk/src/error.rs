//! Error types for aidesk
//!
//! All errors use thiserror for structured error handling.
//! Stores keep the display string of these errors in their `error` slice.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid document: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Project '{0}' is protected and cannot be deleted")]
    ProtectedProject(String),

    #[error("Missing template parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Local storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// HTTP status of a backend rejection, if this error is one
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Api { status, .. } => Some(*status),
            AppError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
