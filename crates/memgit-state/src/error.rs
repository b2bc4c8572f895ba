//! Error types for memgit-state

use thiserror::Error;

/// Errors that can occur in the document persistence layer
#[derive(Error, Debug)]
pub enum StateError {
    /// Filesystem access failed
    #[error("I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Branch name is empty or would escape the branches directory
    #[error("Invalid branch name: {0:?}")]
    InvalidBranchName(String),

    /// Document path is absolute or contains parent components
    #[error("Invalid document path: {0}")]
    InvalidPath(String),
}

impl StateError {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StateError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for StateError {
    fn from(err: serde_json::Error) -> Self {
        StateError::Serialization(err.to_string())
    }
}
