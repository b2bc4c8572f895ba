//! Branch documents and the active-branch pointer.
//!
//! Layout under the store root:
//!
//! ```text
//! ACTIVE_BRANCH
//! branches/<name>/history.jsonl
//! branches/<name>/trace.log
//! branches/<name>/metadata.json
//! ```
//!
//! A branch exists iff its history document exists.

use std::sync::Arc;

use tracing::debug;

use crate::error::StateError;
use crate::schema::{decode_history, encode_history_line, BranchMetadata, HistoryEntry};
use crate::storage_traits::{doc_path, ContentDigest, DocumentStore};
use crate::Result;

pub const BRANCHES_DIR: &str = "branches";
pub const HISTORY_DOC: &str = "history.jsonl";
pub const TRACE_DOC: &str = "trace.log";
pub const METADATA_DOC: &str = "metadata.json";
pub const ACTIVE_BRANCH_DOC: &str = "ACTIVE_BRANCH";
pub const DEFAULT_BRANCH: &str = "main";

/// Check that `name` can be used as a single directory component.
///
/// Leading dots are reserved for hidden entries such as in-flight temp files,
/// which listings skip.
pub fn validate_branch_name(name: &str) -> Result<()> {
    let invalid = name.trim().is_empty()
        || name != name.trim()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        return Err(StateError::InvalidBranchName(name.to_string()));
    }
    Ok(())
}

/// Per-branch document access over a [`DocumentStore`].
#[derive(Clone)]
pub struct BranchStore {
    docs: Arc<dyn DocumentStore>,
}

impl BranchStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    fn path(branch: &str, doc: &str) -> Result<String> {
        validate_branch_name(branch)?;
        Ok(doc_path(&[BRANCHES_DIR, branch, doc]))
    }

    /// Idempotently create the branch directory.
    pub fn ensure(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.docs.ensure_dir(&doc_path(&[BRANCHES_DIR, branch]))
    }

    /// A branch exists iff its history document is present.
    pub fn exists(&self, branch: &str) -> Result<bool> {
        self.docs.exists(&Self::path(branch, HISTORY_DOC)?)
    }

    /// Names of every branch directory that has a history document.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut branches = Vec::new();
        for name in self.docs.list(BRANCHES_DIR)? {
            if validate_branch_name(&name).is_ok() && self.exists(&name)? {
                branches.push(name);
            }
        }
        Ok(branches)
    }

    // -- history ------------------------------------------------------------

    /// Raw history document; empty when the branch does not exist.
    pub fn read_history_raw(&self, branch: &str) -> Result<String> {
        self.docs.read(&Self::path(branch, HISTORY_DOC)?)
    }

    pub fn read_history(&self, branch: &str) -> Result<Vec<HistoryEntry>> {
        Ok(decode_history(&self.read_history_raw(branch)?))
    }

    /// SHA-256 of the raw history document.
    pub fn history_digest(&self, branch: &str) -> Result<ContentDigest> {
        Ok(ContentDigest::from_bytes(
            self.read_history_raw(branch)?.as_bytes(),
        ))
    }

    /// Replace the history document with `entries`.
    pub fn write_history(&self, branch: &str, entries: &[HistoryEntry]) -> Result<()> {
        let mut doc = String::new();
        for entry in entries {
            doc.push_str(&encode_history_line(entry)?);
        }
        self.docs.write(&Self::path(branch, HISTORY_DOC)?, &doc)
    }

    pub fn append_history(&self, branch: &str, entry: &HistoryEntry) -> Result<()> {
        let line = encode_history_line(entry)?;
        let path = Self::path(branch, HISTORY_DOC)?;
        let mut doc = self.docs.read(&path)?;
        if !doc.is_empty() && !doc.ends_with('\n') {
            doc.push('\n');
        }
        doc.push_str(&line);
        self.docs.write(&path, &doc)
    }

    // -- trace log ----------------------------------------------------------

    pub fn read_trace(&self, branch: &str) -> Result<String> {
        self.docs.read(&Self::path(branch, TRACE_DOC)?)
    }

    pub fn write_trace(&self, branch: &str, content: &str) -> Result<()> {
        self.docs.write(&Self::path(branch, TRACE_DOC)?, content)
    }

    pub fn append_trace(&self, branch: &str, content: &str) -> Result<()> {
        self.docs.append(&Self::path(branch, TRACE_DOC)?, content)
    }

    pub fn clear_trace(&self, branch: &str) -> Result<()> {
        self.write_trace(branch, "")
    }

    // -- metadata -----------------------------------------------------------

    pub fn metadata_exists(&self, branch: &str) -> Result<bool> {
        self.docs.exists(&Self::path(branch, METADATA_DOC)?)
    }

    pub fn read_metadata_raw(&self, branch: &str) -> Result<String> {
        self.docs.read(&Self::path(branch, METADATA_DOC)?)
    }

    /// Parsed metadata; `None` when absent or unreadable.
    pub fn read_metadata(&self, branch: &str) -> Result<Option<BranchMetadata>> {
        let raw = self.read_metadata_raw(branch)?;
        if raw.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str(&raw) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) => {
                tracing::warn!(branch = %branch, error = %e, "unreadable branch metadata");
                Ok(None)
            }
        }
    }

    pub fn write_metadata(&self, branch: &str, meta: &BranchMetadata) -> Result<()> {
        let mut json = serde_json::to_string_pretty(meta)?;
        json.push('\n');
        self.docs.write(&Self::path(branch, METADATA_DOC)?, &json)
    }

    // -- active pointer -----------------------------------------------------

    /// Trimmed pointer content; a missing or blank pointer means `main`.
    pub fn read_active(&self) -> Result<String> {
        let raw = self.docs.read(ACTIVE_BRANCH_DOC)?;
        let name = raw.trim();
        if name.is_empty() {
            return Ok(DEFAULT_BRANCH.to_string());
        }
        Ok(name.to_string())
    }

    pub fn write_active(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        debug!(branch = %branch, "active branch pointer updated");
        self.docs.write(ACTIVE_BRANCH_DOC, &format!("{branch}\n"))
    }
}
