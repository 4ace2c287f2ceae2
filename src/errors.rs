use thiserror::Error;

use crate::group::ReleaseFailure;

#[derive(Error, Debug)]
pub enum DockerCtlError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("container {container}: {path} failed to be {expected}, value: \"{last}\"")]
    Timeout {
        container: String,
        path: String,
        expected: String,
        last: String,
    },

    #[error("Attribute path '{0}' not found")]
    PathNotFound(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to release {} container step(s): {}", .0.len(), format_failures(.0))]
    ReleaseFailed(Vec<ReleaseFailure>),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_failures(failures: &[ReleaseFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl DockerCtlError {
    /// True for readiness timeouts
    pub fn is_timeout(&self) -> bool {
        matches!(self, DockerCtlError::Timeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, DockerCtlError>;
