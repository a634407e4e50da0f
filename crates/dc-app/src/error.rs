//! Error types for the dc-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the lower crates and the
/// backend boundary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status} for {route}")]
    Status {
        status: reqwest::StatusCode,
        route: String,
    },

    #[error("Malformed response: {what}")]
    Malformed { what: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config YAML: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(#[from] dc_store::StoreError),

    #[error("Query error: {0}")]
    Query(#[from] dc_query::QueryError),

    #[error("Frame error: {0}")]
    Frame(#[from] dc_frames::FrameError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dc-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        AppError::Malformed { what: what.into() }
    }

    /// HTTP status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            AppError::Status { status, .. } => Some(*status),
            AppError::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<dc_core::CoreError> for AppError {
    fn from(err: dc_core::CoreError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
