//! Domain-level error taxonomy for memgit.

use memgit_state::StateError;

/// memgit domain errors.
///
/// `NotFound`, `AmbiguousMatch` and `InvalidArgument` are expected outcomes
/// that the tool boundary reports as text; the remaining variants wrap
/// unexpected storage or decoding failures.
#[derive(Debug, thiserror::Error)]
pub enum MemgitError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous match: {0}")]
    AmbiguousMatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    State(StateError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StateError> for MemgitError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::InvalidBranchName(name) => {
                MemgitError::InvalidArgument(format!("invalid branch name {name:?}"))
            }
            other => MemgitError::State(other),
        }
    }
}

/// Result type for memgit domain operations.
pub type Result<T> = std::result::Result<T, MemgitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = MemgitError::NotFound("branch 'exp'".to_string());
        assert_eq!(err.to_string(), "not found: branch 'exp'");
    }

    #[test]
    fn test_invalid_branch_name_maps_to_invalid_argument() {
        let err: MemgitError = StateError::InvalidBranchName("a/b".to_string()).into();
        assert!(matches!(err, MemgitError::InvalidArgument(_)));
        assert!(err.to_string().contains("a/b"));
    }

    #[test]
    fn test_storage_error_wraps() {
        let err: MemgitError = StateError::Serialization("bad".to_string()).into();
        assert!(matches!(err, MemgitError::State(_)));
        assert!(err.to_string().starts_with("storage error"));
    }
}
