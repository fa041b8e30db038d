use std::path::PathBuf;

use thiserror::Error;

use crate::scope::Scope;

/// Boxed source for failures reported by a storage backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid route '{route}': {reason}")]
    InvalidRoute { route: String, reason: &'static str },

    #[error("Invalid scope binding: {scope} with id {id}")]
    InvalidScopeBinding { scope: Scope, id: i64 },

    #[error("Invalid path '{0}'")]
    InvalidPath(String),

    #[error("Value not found: {0}")]
    NotFound(String),

    #[error("Backend failure at {path}: {source}")]
    Backend { path: String, source: BackendError },

    #[error("Subscription limit of {limit} reached")]
    ResourceExhausted { limit: usize },

    #[error("Invalid value at {path}: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in schema file")]
    UnknownKeys(Vec<Error>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Change notification registry is closed")]
    Closed,
}

impl Error {
    /// Wrap a backend-specific failure for `path`.
    pub fn backend(path: impl ToString, source: impl Into<BackendError>) -> Self {
        Error::Backend {
            path: path.to_string(),
            source: source.into(),
        }
    }

    /// True when the error only signals absence at one exact path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}
