//! Storage trait definitions for memgit
//!
//! Everything memgit persists is a whole text document addressed by a
//! relative, `/`-separated path under a store root:
//! - `DocumentStore`: read/replace/list documents
//! - `ContentDigest`: SHA-256 fingerprint of a document's bytes
//!
//! Implementations: `FsDocumentStore` (on disk) and the in-memory fake in
//! the `fakes` module.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::StateError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StateError>;

// ---------------------------------------------------------------------------
// ContentDigest
// ---------------------------------------------------------------------------

/// Content digest (SHA-256 hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    /// Compute the SHA-256 digest of the given bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        use sha2::Digest;
        let mut hasher = Sha256::new();
        hasher.update(data);
        ContentDigest(hex::encode(hasher.finalize()))
    }

    /// Return the full hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DocumentStore
// ---------------------------------------------------------------------------

/// Whole-document text store.
///
/// Guarantees:
/// - `read` of a missing document returns an empty string, never an error.
/// - `write` replaces the entire document and creates parent directories.
/// - `list` of a missing directory is empty.
pub trait DocumentStore: Send + Sync {
    /// Read a document. Missing documents read as `""`.
    fn read(&self, path: &str) -> StorageResult<String>;

    /// Replace a document's content.
    fn write(&self, path: &str, content: &str) -> StorageResult<()>;

    /// Whether a document (not a directory) exists at `path`.
    fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Idempotently create a directory.
    fn ensure_dir(&self, path: &str) -> StorageResult<()>;

    /// Sorted names of the immediate children of `dir` (`""` is the root).
    fn list(&self, dir: &str) -> StorageResult<Vec<String>>;

    /// Append `content` by read-concatenate-write.
    fn append(&self, path: &str, content: &str) -> StorageResult<()> {
        let mut doc = self.read(path)?;
        doc.push_str(content);
        self.write(path, &doc)
    }
}

/// Reject absolute paths and `..` components so documents stay under the root.
pub(crate) fn validate_path(path: &str) -> StorageResult<()> {
    if path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|c| c == ".." || c.is_empty())
    {
        return Err(StateError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Like [`validate_path`], but `""` names the store root.
pub(crate) fn validate_dir(dir: &str) -> StorageResult<()> {
    if dir.is_empty() {
        return Ok(());
    }
    validate_path(dir)
}

/// Join path segments with `/`.
pub fn doc_path(parts: &[&str]) -> String {
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_64_hex_chars() {
        let d = ContentDigest::from_bytes(b"history");
        assert_eq!(d.as_str().len(), 64);
        assert_eq!(d.short().len(), 12);
    }

    #[test]
    fn digest_is_deterministic() {
        assert_eq!(
            ContentDigest::from_bytes(b"same"),
            ContentDigest::from_bytes(b"same")
        );
        assert_ne!(
            ContentDigest::from_bytes(b"a"),
            ContentDigest::from_bytes(b"b")
        );
    }

    #[test]
    fn validate_path_rejects_escapes() {
        assert!(validate_path("branches/main/trace.log").is_ok());
        assert!(validate_path("/etc/passwd").is_err());
        assert!(validate_path("branches/../../x").is_err());
        assert!(validate_path("branches//x").is_err());
        assert!(validate_path("").is_err());
    }

    #[test]
    fn doc_path_joins_with_slash() {
        assert_eq!(doc_path(&["branches", "exp", "metadata.json"]), "branches/exp/metadata.json");
    }
}
